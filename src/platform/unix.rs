use std::time::Duration;
use tracing::{debug, warn};

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

pub async fn terminate_child(
    child: &mut tokio::process::Child,
    child_pid: Option<u32>,
    kill_delay: Duration,
) {
    if let Some(pid) = child_pid {
        match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            Ok(()) => {
                debug!(pid, "sent SIGTERM");
            }
            Err(nix::errno::Errno::ESRCH) => {
                debug!(pid, "process already exited");
                let _ = child.wait().await;
                return;
            }
            Err(e) => {
                warn!(pid, error = %e, "kill(SIGTERM) failed, falling back to SIGKILL");
                let _ = child.kill().await;
                let _ = child.wait().await;
                return;
            }
        }

        let grace = tokio::time::timeout(kill_delay, child.wait()).await;
        match grace {
            Ok(Ok(_status)) => {
                debug!(pid, "child exited after SIGTERM");
            }
            _ => {
                warn!(
                    pid,
                    timeout_ms = kill_delay.as_millis() as u64,
                    "child did not exit in time, sending SIGKILL",
                );
                let _ = child.kill().await;
                let _ = child.wait().await;
            }
        }
    } else {
        let _ = child.kill().await;
        let _ = child.wait().await;
    }
}

pub fn is_process_alive(pid: u32) -> bool {
    kill(Pid::from_raw(pid as i32), None).is_ok()
}
