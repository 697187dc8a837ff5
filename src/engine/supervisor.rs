use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::ZenoConfig;
use crate::platform;

/// How long the previous live binary is kept at `<bin>.backup` after a swap.
const BACKUP_RETENTION: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Supervisor
// ---------------------------------------------------------------------------

/// Owns the single supervised child process. The engine serialises all
/// mutating calls; there is never more than one child at a time.
pub struct Supervisor {
    config: Arc<ZenoConfig>,
    child: Option<ChildHandle>,
}

struct ChildHandle {
    pid: Option<u32>,
    alive: Arc<AtomicBool>,
    term: CancellationToken,
    monitor: JoinHandle<()>,
}

impl Supervisor {
    pub fn new(config: Arc<ZenoConfig>) -> Self {
        Self {
            config,
            child: None,
        }
    }

    /// Whether the most recent child is still running.
    pub fn is_running(&self) -> bool {
        self.child
            .as_ref()
            .map(|c| c.alive.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    /// PID of the current child, when one was spawned successfully.
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(|c| c.pid)
    }

    /// Spawn the application binary. Any existing child is stopped first.
    /// The child inherits the host's stdout/stderr and runs with the project
    /// root as working directory.
    pub async fn start_initial(&mut self) -> Result<()> {
        if self.child.is_some() {
            self.stop().await;
        }

        let bin = self.config.bin_path();
        if !bin.is_file() {
            bail!("application binary {} does not exist", bin.display());
        }

        let mut child = Command::new(&bin)
            .args(&self.config.build.args)
            .current_dir(self.config.root_path())
            .spawn()
            .with_context(|| format!("spawning {}", bin.display()))?;

        let pid = child.id();
        info!(pid, "started {}", bin.display());

        let alive = Arc::new(AtomicBool::new(true));
        let term = CancellationToken::new();
        let kill_delay = Duration::from_millis(self.config.build.kill_delay);

        let monitor = {
            let alive = alive.clone();
            let term = term.clone();
            tokio::spawn(async move {
                tokio::select! {
                    result = child.wait() => {
                        alive.store(false, Ordering::SeqCst);
                        match result {
                            Ok(status) => log_exit(pid, status),
                            Err(e) => warn!(pid, error = %e, "waiting on child failed"),
                        }
                    }
                    _ = term.cancelled() => {
                        platform::terminate_child(&mut child, pid, kill_delay).await;
                        alive.store(false, Ordering::SeqCst);
                        debug!(pid, "child terminated");
                    }
                }
            })
        };

        self.child = Some(ChildHandle {
            pid,
            alive,
            term,
            monitor,
        });
        Ok(())
    }

    /// Terminate the current child, if any, and wait for its exit to be
    /// observed. The child slot is cleared even when the monitor task failed.
    pub async fn stop(&mut self) {
        let Some(handle) = self.child.take() else {
            return;
        };
        handle.term.cancel();
        if let Err(e) = handle.monitor.await {
            warn!(error = %e, "child monitor task failed");
        }
    }

    /// Two-phase binary swap: terminate the child, back up the live binary,
    /// promote the staging binary, and respawn. Returns `true` on success.
    /// On any failure the previous live binary is respawned best-effort so
    /// the operator is never left without a process when recovery is possible.
    pub async fn swap_and_restart(&mut self) -> bool {
        if self.child.is_none() {
            warn!("no supervised process to restart");
            return false;
        }

        let staging = self.config.staging_path();
        if !staging.is_file() {
            warn!(
                "staging binary {} not found after build",
                staging.display()
            );
            log_directory_contents(staging.parent());
            return false;
        }

        match self.swap(&staging).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "swap failed, restarting previous binary");
                if let Err(e) = self.start_initial().await {
                    error!(error = %format!("{e:#}"), "recovery failed, no process is running");
                }
                false
            }
        }
    }

    async fn swap(&mut self, staging: &Path) -> Result<()> {
        self.stop().await;

        let live = self.config.bin_path();
        let backup = backup_path(&live);
        if live.exists() {
            tokio::fs::copy(&live, &backup)
                .await
                .context("backing up live binary")?;
        }
        tokio::fs::copy(staging, &live)
            .await
            .context("promoting staging binary")?;
        tokio::fs::remove_file(staging)
            .await
            .context("removing staging binary")?;

        // The backup only matters while a bad swap could still need it.
        tokio::spawn(async move {
            tokio::time::sleep(BACKUP_RETENTION).await;
            let _ = tokio::fs::remove_file(&backup).await;
        });

        self.start_initial().await
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn backup_path(live: &Path) -> PathBuf {
    let mut name = live.as_os_str().to_os_string();
    name.push(".backup");
    PathBuf::from(name)
}

/// Exit via code 0, SIGTERM, or SIGKILL is the expected fate of a supervised
/// child; anything else deserves attention.
#[cfg(unix)]
fn is_expected_exit(status: &ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;
    status.code() == Some(0) || matches!(status.signal(), Some(15) | Some(9))
}

#[cfg(not(unix))]
fn is_expected_exit(status: &ExitStatus) -> bool {
    status.code() == Some(0)
}

fn log_exit(pid: Option<u32>, status: ExitStatus) {
    if is_expected_exit(&status) {
        debug!(pid, %status, "process exited");
    } else {
        warn!(pid, %status, "process exited unexpectedly");
    }
}

fn log_directory_contents(dir: Option<&Path>) {
    let Some(dir) = dir else { return };
    match std::fs::read_dir(dir) {
        Ok(entries) => {
            let names: Vec<String> = entries
                .flatten()
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect();
            warn!(dir = %dir.display(), contents = ?names, "directory listing");
        }
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "could not list directory");
        }
    }
}
