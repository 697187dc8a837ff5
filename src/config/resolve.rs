use std::path::{Path, PathBuf};

use super::ConfigError;

/// Config file names checked in the working directory, in precedence order.
const CONFIG_NAMES: [&str; 2] = ["zeno.yml", ".zeno.yml"];

/// Check `dir` for a config file, returning the first name that exists.
pub fn find_config(dir: &Path) -> Option<PathBuf> {
    CONFIG_NAMES.iter().map(|name| dir.join(name)).find(|candidate| candidate.is_file())
}

/// Resolve the config file path. If `cli_file` is provided, verify it exists
/// and return it. Otherwise look for `zeno.yml`, then `.zeno.yml`, in the
/// current working directory.
pub fn resolve_config(cli_file: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = cli_file {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(ConfigError::NotFound {
            path: path.display().to_string(),
        });
    }

    let cwd = std::env::current_dir().map_err(|e| ConfigError::Unreadable {
        path: ".".to_string(),
        source: e,
    })?;
    find_config(&cwd).ok_or(ConfigError::Missing)
}
