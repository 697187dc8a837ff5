pub mod filter;

use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use notify::{PollWatcher, RecommendedWatcher, RecursiveMode, Watcher as _};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::ZenoConfig;
use filter::PathFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Created => write!(f, "created"),
            ChangeKind::Modified => write!(f, "modified"),
            ChangeKind::Removed => write!(f, "removed"),
        }
    }
}

/// A filtered file-system change under the project root.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

/// Owns the notify backend. Dropping (or calling [`Watcher::stop`]) releases
/// all per-directory subscriptions.
pub struct Watcher {
    backend: Option<Box<dyn notify::Watcher + Send>>,
}

impl Watcher {
    /// Walk the tree under `root` once, subscribe to every non-excluded
    /// directory, and stream filtered change events.
    ///
    /// Directories created after startup are not picked up; the operator
    /// restarts zeno after adding a new source directory.
    pub fn spawn(
        root: &Path,
        filter: Arc<PathFilter>,
        config: &ZenoConfig,
    ) -> Result<(Self, mpsc::Receiver<ChangeEvent>)> {
        if !root.is_dir() {
            bail!("watch root {} is not a directory", root.display());
        }

        let (tx, rx) = mpsc::channel(256);

        let event_filter = filter.clone();
        let handler = move |result: notify::Result<notify::Event>| match result {
            Ok(event) => {
                let kind = match event.kind {
                    notify::EventKind::Create(_) => ChangeKind::Created,
                    notify::EventKind::Modify(_) => ChangeKind::Modified,
                    notify::EventKind::Remove(_) => ChangeKind::Removed,
                    _ => return,
                };
                for path in event.paths {
                    if event_filter.should_watch(&path) {
                        // The engine applies backpressure through the channel;
                        // the notify callback thread blocks until there is room.
                        let _ = tx.blocking_send(ChangeEvent { path, kind });
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "file watcher error");
            }
        };

        let mut backend: Box<dyn notify::Watcher + Send> = if config.build.poll {
            let poll_config = notify::Config::default()
                .with_poll_interval(Duration::from_millis(config.build.poll_interval));
            Box::new(
                PollWatcher::new(handler, poll_config).context("creating polling watcher")?,
            )
        } else {
            Box::new(
                RecommendedWatcher::new(handler, notify::Config::default())
                    .context("creating native watcher")?,
            )
        };

        let mut attached = 0usize;
        for dir in collect_watch_dirs(root, &filter) {
            match backend.watch(&dir, RecursiveMode::NonRecursive) {
                Ok(()) => attached += 1,
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "skipping unwatchable directory");
                }
            }
        }
        debug!(directories = attached, "watching project tree");

        Ok((
            Self {
                backend: Some(backend),
            },
            rx,
        ))
    }

    /// Release all subscriptions. Idempotent.
    pub fn stop(&mut self) {
        self.backend.take();
    }
}

/// Breadth-first walk collecting `root` and every non-excluded subdirectory.
fn collect_watch_dirs(root: &Path, filter: &PathFilter) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    let mut queue = VecDeque::from([root.to_path_buf()]);

    while let Some(dir) = queue.pop_front() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "skipping unreadable directory");
                continue;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() && !filter.is_excluded_dir(&path) {
                queue.push_back(path);
            }
        }
        dirs.push(dir);
    }

    dirs
}
