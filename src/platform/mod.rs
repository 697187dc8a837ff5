use std::time::Duration;

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
use unix as imp;
#[cfg(windows)]
use windows as imp;

/// Gracefully terminate a child process.
/// Sends the platform's termination signal (SIGTERM on Unix, a console ctrl
/// event on Windows), waits up to `kill_delay`, then force-kills.
pub async fn terminate_child(
    child: &mut tokio::process::Child,
    child_pid: Option<u32>,
    kill_delay: Duration,
) {
    imp::terminate_child(child, child_pid, kill_delay).await
}

/// Check if a process with the given PID is still alive.
pub fn is_process_alive(pid: u32) -> bool {
    imp::is_process_alive(pid)
}
