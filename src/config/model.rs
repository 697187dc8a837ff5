use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Suffix inserted into the binary name to form the staging path.
pub const STAGING_SUFFIX: &str = "_new";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZenoConfig {
    pub root: String,
    pub tmp_dir: String,
    pub build: BuildConfig,
    pub log: LogConfig,
    pub proxy: ProxyConfig,
    pub screen: ScreenConfig,
    pub misc: MiscConfig,
}

impl Default for ZenoConfig {
    fn default() -> Self {
        Self {
            root: ".".to_string(),
            tmp_dir: "tmp".to_string(),
            build: BuildConfig::default(),
            log: LogConfig::default(),
            proxy: ProxyConfig::default(),
            screen: ScreenConfig::default(),
            misc: MiscConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub cmd: String,
    pub bin: String,
    pub log: String,
    pub include_ext: Vec<String>,
    pub exclude_dir: Vec<String>,
    pub include_dir: Vec<String>,
    pub exclude_file: Vec<String>,
    pub include_file: Vec<String>,
    pub exclude_regex: Vec<String>,
    pub pre_cmd: Vec<String>,
    pub post_cmd: Vec<String>,
    pub args: Vec<String>,
    /// Debounce window in milliseconds.
    pub delay: u64,
    /// Grace period before SIGTERM escalates to SIGKILL, in milliseconds.
    pub kill_delay: u64,
    pub stop_on_error: bool,
    pub exclude_unchanged: bool,
    pub follow_symlink: bool,
    pub poll: bool,
    pub poll_interval: u64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            cmd: "dart compile exe lib/main.dart -o ./tmp/main_new.exe".to_string(),
            bin: "./tmp/main.exe".to_string(),
            log: "build-errors.log".to_string(),
            include_ext: vec!["dart".to_string()],
            exclude_dir: Vec::new(),
            include_dir: Vec::new(),
            exclude_file: Vec::new(),
            include_file: Vec::new(),
            exclude_regex: Vec::new(),
            pre_cmd: Vec::new(),
            post_cmd: Vec::new(),
            args: Vec::new(),
            delay: 1500,
            kill_delay: 1500,
            stop_on_error: false,
            exclude_unchanged: true,
            follow_symlink: false,
            poll: false,
            poll_interval: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub add_time: bool,
    pub main_only: bool,
    pub silent: bool,
}

/// Reserved for the HTTP dev-proxy layer. Parsed but never wired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub enabled: bool,
    pub proxy_port: u16,
    pub app_port: u16,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            proxy_port: 8090,
            app_port: 8080,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub clear_on_rebuild: bool,
    pub keep_scroll: bool,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            clear_on_rebuild: false,
            keep_scroll: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MiscConfig {
    pub clean_on_exit: bool,
}

impl ZenoConfig {
    pub fn root_path(&self) -> PathBuf {
        PathBuf::from(&self.root)
    }

    /// Absolute or root-relative location of the live binary.
    pub fn bin_path(&self) -> PathBuf {
        resolve_against_root(&self.root, &self.build.bin)
    }

    pub fn tmp_path(&self) -> PathBuf {
        self.root_path().join(&self.tmp_dir)
    }

    pub fn build_log_path(&self) -> PathBuf {
        self.tmp_path().join(&self.build.log)
    }

    /// The staging binary string as it appears in the rewritten build command.
    pub fn staging_bin(&self) -> String {
        add_suffix_before_ext(&self.build.bin, STAGING_SUFFIX)
    }

    /// Filesystem location of the staging binary.
    pub fn staging_path(&self) -> PathBuf {
        resolve_against_root(&self.root, &self.staging_bin())
    }
}

fn resolve_against_root(root: &str, bin: &str) -> PathBuf {
    let bin = Path::new(bin);
    if bin.is_absolute() {
        bin.to_path_buf()
    } else {
        Path::new(root).join(bin)
    }
}

/// Insert `suffix` before the file extension, or append it when there is none:
/// `foo.exe` becomes `foo_new.exe`, `./tmp/main` becomes `./tmp/main_new`.
pub fn add_suffix_before_ext(path: &str, suffix: &str) -> String {
    let p = Path::new(path);
    match (p.file_stem(), p.extension()) {
        (Some(stem), Some(ext)) => p
            .with_file_name(format!(
                "{}{}.{}",
                stem.to_string_lossy(),
                suffix,
                ext.to_string_lossy()
            ))
            .to_string_lossy()
            .into_owned(),
        _ => format!("{path}{suffix}"),
    }
}
