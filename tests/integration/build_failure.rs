use crate::common::*;
use std::time::Duration;

/// Build script that fails whenever a `break` marker file exists.
const CONDITIONAL_BUILD_SCRIPT: &str = "#!/bin/sh
echo build >> builds.txt
if [ -f break ]; then
  echo 'syntax error in main' >&2
  exit 1
fi
cp app.sh \"$1\"
";

#[tokio::test]
async fn failed_rebuild_leaves_child_untouched() {
    let project = TestProject::new(
        r#"
root: "."
build:
  cmd: "./build.sh ./tmp/main.exe"
  bin: "./tmp/main.exe"
  include_ext: ["dart"]
  delay: 300
  kill_delay: 500
  stop_on_error: true
"#,
    );
    project.write_script("app.sh", APP_SCRIPT);
    project.write_script("build.sh", CONDITIONAL_BUILD_SCRIPT);
    project.write("lib/a.dart", "void main() {}\n");

    let mut zeno = spawn_zeno(&project);
    assert!(
        wait_until(Duration::from_secs(10), || !project.recorded_pids().is_empty()).await,
        "zeno did not reach a running child"
    );
    tokio::time::sleep(Duration::from_millis(300)).await;
    let pid = project.recorded_pids()[0];

    // Break the build, then trigger a reload.
    project.write("break", "");
    project.write("lib/a.dart", "void main() { broken\n");

    assert!(
        wait_until(Duration::from_secs(10), || project.build_count() == 2).await,
        "rebuild never ran"
    );
    tokio::time::sleep(Duration::from_millis(500)).await;

    // The original child keeps running and no swap was attempted.
    assert!(pid_alive(pid), "child was disturbed by a failed build");
    assert_eq!(project.recorded_pids().len(), 1);
    assert!(!project.root().join("tmp/main_new.exe").exists());

    let log = project
        .read("tmp/build-errors.log")
        .expect("build log missing");
    assert!(log.contains("syntax error in main"), "log: {log}");
    assert!(log.starts_with('['), "log line not timestamped: {log}");

    send_sigint(zeno.id().unwrap());
    let _ = tokio::time::timeout(Duration::from_secs(10), zeno.wait()).await;
}

#[tokio::test]
async fn recovers_on_next_successful_build() {
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
    project.write_script("build.sh", CONDITIONAL_BUILD_SCRIPT);
    project.write("lib/a.dart", "void main() {}\n");

    let mut zeno = spawn_zeno(&project);
    assert!(
        wait_until(Duration::from_secs(10), || !project.recorded_pids().is_empty()).await,
        "zeno did not reach a running child"
    );
    tokio::time::sleep(Duration::from_millis(300)).await;

    project.write("break", "");
    project.write("lib/a.dart", "void main() { broken\n");
    assert!(
        wait_until(Duration::from_secs(10), || project.build_count() == 2).await,
        "failing rebuild never ran"
    );

    // Fix the build and save again.
    std::fs::remove_file(project.root().join("break")).unwrap();
    project.write("lib/a.dart", "void main() { print('fixed'); }\n");

    assert!(
        wait_until(Duration::from_secs(10), || project.recorded_pids().len() == 2).await,
        "fixed build did not produce a new child"
    );

    send_sigint(zeno.id().unwrap());
    let _ = tokio::time::timeout(Duration::from_secs(10), zeno.wait()).await;
}
