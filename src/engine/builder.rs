use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::ZenoConfig;

/// Outcome of one build invocation.
#[derive(Debug)]
pub struct BuildResult {
    pub success: bool,
    pub stderr: String,
}

impl BuildResult {
    fn ok() -> Self {
        Self {
            success: true,
            stderr: String::new(),
        }
    }

    fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stderr: stderr.into(),
        }
    }
}

/// Runs the user's build command, rewriting it to target the staging binary
/// on rebuilds. Failures are appended to the build log.
pub struct Builder {
    config: Arc<ZenoConfig>,
}

impl Builder {
    pub fn new(config: Arc<ZenoConfig>) -> Self {
        Self { config }
    }

    /// Run the configured build command as-is, producing the live binary.
    pub async fn build_initial(&self) -> BuildResult {
        self.run_build(&self.config.build.cmd).await
    }

    /// Run the build command rewritten to emit the staging binary.
    pub async fn rebuild(&self) -> BuildResult {
        self.run_build(&self.staged_command()).await
    }

    /// The build command with every occurrence of the live binary path
    /// replaced by the staging path.
    fn staged_command(&self) -> String {
        self.config
            .build
            .cmd
            .replace(&self.config.build.bin, &self.config.staging_bin())
    }

    async fn run_build(&self, command_line: &str) -> BuildResult {
        let Some((program, args)) = split_command(command_line) else {
            let message = "build command is empty".to_string();
            self.record_failure(&message).await;
            return BuildResult::failed(message);
        };

        debug!(command = %command_line, "running build");
        let output = Command::new(&program)
            .args(&args)
            .current_dir(self.config.root_path())
            .stdin(std::process::Stdio::null())
            .output()
            .await;

        match output {
            Ok(out) if out.status.success() => BuildResult::ok(),
            Ok(out) => {
                let stderr = String::from_utf8_lossy(&out.stderr).into_owned();
                self.record_failure(&stderr).await;
                BuildResult::failed(stderr)
            }
            Err(e) => {
                let message = format!("failed to run `{program}`: {e}");
                self.record_failure(&message).await;
                BuildResult::failed(message)
            }
        }
    }

    /// Append a timestamped failure entry to `<tmp>/<build.log>`. A log that
    /// cannot be written is only worth a warning.
    async fn record_failure(&self, text: &str) {
        let path = self.config.build_log_path();
        if let Err(e) = append_log_line(&path, text).await {
            warn!(path = %path.display(), error = %e, "could not write build log");
        }
    }
}

/// Split a command line on whitespace into program + arguments.
/// Arguments containing spaces are not supported.
pub fn split_command(line: &str) -> Option<(String, Vec<String>)> {
    let mut parts = line.split_whitespace().map(str::to_string);
    let program = parts.next()?;
    Some((program, parts.collect()))
}

async fn append_log_line(path: &Path, text: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    let line = format!("[{}] {}\n", Utc::now().to_rfc3339(), text.trim_end());
    file.write_all(line.as_bytes()).await?;
    file.flush().await
}
