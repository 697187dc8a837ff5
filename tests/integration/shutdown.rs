use crate::common::*;
use std::time::Duration;

#[tokio::test]
async fn clean_on_exit_removes_the_tmp_directory() {
    let project = TestProject::new(
        r#"
root: "."
build:
  cmd: "./build.sh ./tmp/main.exe"
  bin: "./tmp/main.exe"
  include_ext: ["dart"]
  delay: 300
  kill_delay: 500
misc:
  clean_on_exit: true
"#,
    );
    project.write_script("app.sh", APP_SCRIPT);
    project.write_script("build.sh", BUILD_SCRIPT);

    let mut zeno = spawn_zeno(&project);
    assert!(
        wait_until(Duration::from_secs(10), || !project.recorded_pids().is_empty()).await,
        "zeno did not reach a running child"
    );
    assert!(project.root().join("tmp").exists());

    send_sigint(zeno.id().unwrap());
    let status = tokio::time::timeout(Duration::from_secs(10), zeno.wait())
        .await
        .expect("zeno did not exit")
        .unwrap();
    assert_eq!(status.code(), Some(0));

    assert!(
        !project.root().join("tmp").exists(),
        "tmp directory should be removed on exit"
    );
}

#[tokio::test]
async fn sigterm_also_shuts_down_cleanly() {
    let project = TestProject::new(
        r#"
root: "."
build:
  cmd: "./build.sh ./tmp/main.exe"
  bin: "./tmp/main.exe"
  include_ext: ["dart"]
  delay: 300
  kill_delay: 500
"#,
    );
    project.write_script("app.sh", APP_SCRIPT);
    project.write_script("build.sh", BUILD_SCRIPT);

    let mut zeno = spawn_zeno(&project);
    assert!(
        wait_until(Duration::from_secs(10), || !project.recorded_pids().is_empty()).await,
        "zeno did not reach a running child"
    );
    let pid = project.recorded_pids()[0];

    let _ = nix::sys::signal::kill(
        nix::unistd::Pid::from_raw(zeno.id().unwrap() as i32),
        nix::sys::signal::Signal::SIGTERM,
    );
    let status = tokio::time::timeout(Duration::from_secs(10), zeno.wait())
        .await
        .expect("zeno did not exit")
        .unwrap();
    assert_eq!(status.code(), Some(0));

    assert!(
        wait_until(Duration::from_secs(5), || !pid_alive(pid)).await,
        "child survived zeno shutdown"
    );
}
