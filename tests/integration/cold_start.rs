use crate::common::*;
use std::time::Duration;

#[tokio::test]
async fn cold_start_builds_and_supervises() {
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
    assert!(!project.root().join("tmp").exists());

    let mut zeno = spawn_zeno(&project);

    assert!(
        wait_until(Duration::from_secs(10), || {
            project.root().join("tmp/main.exe").exists() && !project.recorded_pids().is_empty()
        })
        .await,
        "initial build did not produce a running child"
    );

    let pid = project.recorded_pids()[0];
    assert!(pid_alive(pid), "supervised child is not running");
    assert_eq!(project.build_count(), 1);

    send_sigint(zeno.id().unwrap());
    let status = tokio::time::timeout(Duration::from_secs(10), zeno.wait())
        .await
        .expect("zeno did not exit after SIGINT")
        .unwrap();
    assert_eq!(status.code(), Some(0), "clean shutdown must exit 0");

    assert!(
        wait_until(Duration::from_secs(5), || !pid_alive(pid)).await,
        "child survived zeno shutdown"
    );
}

#[tokio::test]
async fn startup_fails_without_config() {
    let dir = tempfile::TempDir::new().unwrap();
    let output = tokio::process::Command::new(env!("CARGO_BIN_EXE_zeno"))
        .arg("run")
        .current_dir(dir.path())
        .output()
        .await
        .unwrap();

    assert_eq!(output.status.code(), Some(70));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("zeno init"),
        "error should point at the init command: {stderr}"
    );
}
