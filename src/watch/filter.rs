use std::path::{Path, PathBuf};

use regex::Regex;

use crate::config::{ConfigError, ZenoConfig};

/// Pure predicate deciding which paths are reload-triggering and which
/// directories the watcher recurses into. Built once from the config.
#[derive(Debug)]
pub struct PathFilter {
    root: PathBuf,
    tmp_dir: String,
    include_ext: Vec<String>,
    exclude_dir: Vec<String>,
    include_dir: Vec<String>,
    exclude_file: Vec<String>,
    include_file: Vec<String>,
    exclude_regex: Vec<Regex>,
}

impl PathFilter {
    /// `root` must be the resolved project root; event paths are relativised
    /// against it before the rules run.
    pub fn new(config: &ZenoConfig, root: &Path) -> Result<Self, ConfigError> {
        let mut exclude_regex = Vec::with_capacity(config.build.exclude_regex.len());
        for pattern in &config.build.exclude_regex {
            let compiled = Regex::new(pattern).map_err(|e| ConfigError::BadRegex {
                pattern: pattern.clone(),
                source: Box::new(e),
            })?;
            exclude_regex.push(compiled);
        }

        Ok(Self {
            root: root.to_path_buf(),
            tmp_dir: config.tmp_dir.clone(),
            include_ext: config.build.include_ext.clone(),
            exclude_dir: config.build.exclude_dir.clone(),
            include_dir: config.build.include_dir.clone(),
            exclude_file: config.build.exclude_file.clone(),
            include_file: config.build.include_file.clone(),
            exclude_regex,
        })
    }

    fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }

    /// Whether a change to `path` should trigger a reload.
    /// Rules run in order; the first negative decides.
    pub fn should_watch(&self, path: &Path) -> bool {
        let basename = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => return false,
        };
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();

        if !self.include_ext.is_empty() && !self.include_ext.contains(&extension) {
            return false;
        }
        if self.exclude_file.contains(&basename) {
            return false;
        }
        if !self.include_file.is_empty() && !self.include_file.contains(&basename) {
            return false;
        }
        let relative = self.relative(path).to_string_lossy().into_owned();
        if self.exclude_regex.iter().any(|re| re.is_match(&relative)) {
            return false;
        }
        true
    }

    /// Whether the watcher should skip `dir_path` (and everything below it).
    pub fn is_excluded_dir(&self, dir_path: &Path) -> bool {
        let relative = self.relative(dir_path);
        if relative == Path::new(&self.tmp_dir) {
            return true;
        }
        if self
            .exclude_dir
            .iter()
            .any(|entry| relative.starts_with(entry))
        {
            return true;
        }
        if !self.include_dir.is_empty()
            && !self
                .include_dir
                .iter()
                .any(|entry| relative.starts_with(entry))
        {
            return true;
        }
        false
    }
}
