use crate::common::*;
use std::time::Duration;

fn reload_project() -> TestProject {
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
    project.write("lib/a.dart", "void main() {}\n");
    project.write("lib/b.dart", "void main() {}\n");
    project
}

async fn wait_for_startup(project: &TestProject) {
    assert!(
        wait_until(Duration::from_secs(10), || !project.recorded_pids().is_empty()).await,
        "zeno did not reach a running child"
    );
    // Let the watcher finish attaching before mutating the tree.
    tokio::time::sleep(Duration::from_millis(300)).await;
}

#[tokio::test]
async fn burst_of_changes_triggers_exactly_one_rebuild() {
    let project = reload_project();
    let mut zeno = spawn_zeno(&project);
    wait_for_startup(&project).await;

    project.write("lib/a.dart", "void main() { print('a'); }\n");
    tokio::time::sleep(Duration::from_millis(100)).await;
    project.write("lib/b.dart", "void main() { print('b'); }\n");

    assert!(
        wait_until(Duration::from_secs(10), || project.recorded_pids().len() == 2).await,
        "expected the swapped child to come up"
    );
    // Both edits fell inside one debounce window.
    assert_eq!(project.build_count(), 2, "initial build plus one rebuild");

    // The window is closed; no trailing rebuild may fire.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(project.build_count(), 2);

    let pids = project.recorded_pids();
    assert_ne!(pids[0], pids[1], "swap must spawn a fresh process");
    assert!(pid_alive(pids[1]));
    assert!(!pid_alive(pids[0]), "old child must be terminated");

    send_sigint(zeno.id().unwrap());
    let _ = tokio::time::timeout(Duration::from_secs(10), zeno.wait()).await;
}

#[tokio::test]
async fn swap_backs_up_live_binary_and_consumes_staging() {
    let project = reload_project();
    let mut zeno = spawn_zeno(&project);
    wait_for_startup(&project).await;

    project.write("lib/a.dart", "void main() { print('new'); }\n");

    assert!(
        wait_until(Duration::from_secs(10), || project.recorded_pids().len() == 2).await,
        "reload did not complete"
    );

    assert!(
        project.root().join("tmp/main.exe").exists(),
        "live binary missing after swap"
    );
    assert!(
        project.root().join("tmp/main.exe.backup").exists(),
        "backup of the previous binary missing"
    );
    assert!(
        !project.root().join("tmp/main_new.exe").exists(),
        "staging binary must be consumed by the swap"
    );

    send_sigint(zeno.id().unwrap());
    let _ = tokio::time::timeout(Duration::from_secs(10), zeno.wait()).await;
}

#[tokio::test]
async fn non_matching_files_do_not_trigger_rebuilds() {
    let project = reload_project();
    let mut zeno = spawn_zeno(&project);
    wait_for_startup(&project).await;

    project.write("readme.md", "# notes\n");
    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert_eq!(project.build_count(), 1, "filtered file triggered a rebuild");
    assert_eq!(project.recorded_pids().len(), 1);

    send_sigint(zeno.id().unwrap());
    let _ = tokio::time::timeout(Duration::from_secs(10), zeno.wait()).await;
}
