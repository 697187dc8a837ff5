pub mod builder;
pub mod supervisor;

use std::collections::BTreeSet;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::process::Command;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::ZenoConfig;
use crate::watch::filter::PathFilter;
use crate::watch::{ChangeEvent, Watcher};

use builder::{split_command, Builder};
use supervisor::Supervisor;

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Top-level coordinator: drives watcher events through the debounce window
/// into build-and-swap cycles. All state lives on this struct and is mutated
/// only from the single select loop in [`Engine::run`].
pub struct Engine {
    config: Arc<ZenoConfig>,
    root: PathBuf,
    filter: Arc<PathFilter>,
    builder: Builder,
    supervisor: Supervisor,
    shutdown: CancellationToken,
    running: bool,
    reloading: bool,
    pending: BTreeSet<String>,
}

impl Engine {
    pub fn new(config: ZenoConfig) -> Result<Self> {
        let root = std::fs::canonicalize(config.root_path())
            .with_context(|| format!("project root {} not found", config.root))?;
        let filter = Arc::new(PathFilter::new(&config, &root)?);
        let config = Arc::new(config);

        Ok(Self {
            root,
            filter,
            builder: Builder::new(config.clone()),
            supervisor: Supervisor::new(config.clone()),
            config,
            shutdown: CancellationToken::new(),
            running: false,
            reloading: false,
            pending: BTreeSet::new(),
        })
    }

    /// Token that stops the engine when cancelled (wired to SIGINT/SIGTERM).
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Build, spawn, and supervise until the shutdown token fires.
    pub async fn run(mut self) -> Result<()> {
        self.start_up().await?;

        let (mut watcher, mut events) = Watcher::spawn(&self.root, self.filter.clone(), &self.config)?;
        info!(root = %self.root.display(), "watching for changes");

        let shutdown = self.shutdown.clone();
        let mut deadline: Option<Instant> = None;

        loop {
            let mut reloaded = false;
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.on_file_changed(event, &mut deadline),
                    None => break,
                },
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)),
                        if deadline.is_some() => {
                    deadline = None;
                    self.reload_cycle().await;
                    reloaded = true;
                }
                _ = shutdown.cancelled() => break,
            }
            if reloaded {
                // Changes that raced the reload are dropped, not queued;
                // saving again after the reload picks them up.
                while events.try_recv().is_ok() {}
            }
        }

        watcher.stop();
        self.shut_down().await;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Start / stop
    // -----------------------------------------------------------------------

    async fn start_up(&mut self) -> Result<()> {
        if self.running {
            bail!("engine is already running");
        }
        self.running = true;

        tokio::fs::create_dir_all(self.config.tmp_path())
            .await
            .with_context(|| format!("creating {}", self.config.tmp_path().display()))?;

        self.run_hooks(&self.config.build.pre_cmd, "pre_cmd").await;

        let build = self.builder.build_initial().await;
        if !build.success {
            // The engine stays up without a child; the operator fixes the
            // source and saves again to retry.
            error!("Initial build failed:\n{}", build.stderr.trim_end());
            return Ok(());
        }
        info!("Initial build successful");

        self.run_hooks(&self.config.build.post_cmd, "post_cmd").await;

        self.supervisor
            .start_initial()
            .await
            .context("starting application")
    }

    async fn shut_down(&mut self) {
        if !self.running {
            return;
        }
        self.supervisor.stop().await;
        if self.config.misc.clean_on_exit {
            let tmp = self.config.tmp_path();
            match tokio::fs::remove_dir_all(&tmp).await {
                Ok(()) => debug!(path = %tmp.display(), "removed tmp directory"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %tmp.display(), error = %e, "could not remove tmp directory"),
            }
        }
        self.running = false;
        info!("stopped");
    }

    // -----------------------------------------------------------------------
    // Reload state machine
    // -----------------------------------------------------------------------

    /// Record the change and (re)arm the debounce timer. Events arriving
    /// while a reload is in flight are dropped.
    fn on_file_changed(&mut self, event: ChangeEvent, deadline: &mut Option<Instant>) {
        if !self.running || self.reloading {
            return;
        }
        let relative = event
            .path
            .strip_prefix(&self.root)
            .unwrap_or(&event.path)
            .display()
            .to_string();
        debug!(change = %event.kind, path = %relative, "file changed");
        self.pending.insert(relative);
        *deadline = Some(Instant::now() + Duration::from_millis(self.config.build.delay));
    }

    /// One debounce firing: drain the pending set, rebuild, and swap.
    async fn reload_cycle(&mut self) {
        if self.pending.is_empty() || self.reloading {
            return;
        }
        let changes: Vec<String> = std::mem::take(&mut self.pending).into_iter().collect();

        if self.config.screen.clear_on_rebuild {
            clear_screen(self.config.screen.keep_scroll);
        }

        self.reloading = true;
        let started = Instant::now();
        let swapped = self.rebuild_and_swap(&changes).await;
        self.reloading = false;

        if swapped {
            info!(
                "Hot reload completed in {} ms",
                started.elapsed().as_millis()
            );
        }
    }

    async fn rebuild_and_swap(&mut self, changes: &[String]) -> bool {
        info!("Hot reloading due to changes in {}", changes.join(", "));

        self.run_hooks(&self.config.build.pre_cmd, "pre_cmd").await;

        let build = self.builder.rebuild().await;
        if !build.success {
            if self.config.build.stop_on_error {
                error!(
                    "Build failed, waiting for next change:\n{}",
                    build.stderr.trim_end()
                );
            } else {
                error!("Build failed:\n{}", build.stderr.trim_end());
            }
            return false;
        }

        self.run_hooks(&self.config.build.post_cmd, "post_cmd").await;

        self.supervisor.swap_and_restart().await
    }

    // -----------------------------------------------------------------------
    // Hooks
    // -----------------------------------------------------------------------

    /// Run a pre/post command list sequentially with inherited stdio.
    /// Hook failures are logged and never abort the cycle.
    async fn run_hooks(&self, commands: &[String], stage: &str) {
        for line in commands {
            let Some((program, args)) = split_command(line) else {
                continue;
            };
            debug!(stage, command = %line, "running hook");
            match Command::new(&program)
                .args(&args)
                .current_dir(self.config.root_path())
                .status()
                .await
            {
                Ok(status) if status.success() => {}
                Ok(status) => warn!(stage, command = %line, %status, "hook failed"),
                Err(e) => warn!(stage, command = %line, error = %e, "could not run hook"),
            }
        }
    }
}

/// `ESC[2J` alone preserves scrollback; `ESC[H` additionally homes the cursor.
fn clear_screen(keep_scroll: bool) {
    if keep_scroll {
        print!("\x1b[2J");
    } else {
        print!("\x1b[2J\x1b[H");
    }
    let _ = std::io::stdout().flush();
}
