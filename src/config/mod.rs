//! Where the active command log lives and how it is encoded.

use std::path::{Path, PathBuf};

use crate::store::StoreFormat;

/// Env var overriding the log location (highest priority).
pub const LOG_PATH_ENV: &str = "CMDHIST_LOG_PATH";

/// Resolved history settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    pub log_path: PathBuf,
    pub format: StoreFormat,
    /// Commands matching this regex are run in the shell instead of the tool
    /// launcher.
    pub ignored_pattern: Option<String>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        let log_path = default_log_path();
        Self {
            format: StoreFormat::infer(&log_path),
            log_path,
            ignored_pattern: None,
        }
    }
}

/// Private: parsed representation of a cmdhist config file.
#[derive(serde::Deserialize, Default)]
struct ConfigFile {
    history: Option<HistorySection>,
}

#[derive(serde::Deserialize, Default)]
struct HistorySection {
    path: Option<PathBuf>,
    format: Option<StoreFormat>,
    ignored_pattern: Option<String>,
}

/// Read the `[history]` section of a TOML config file. Returns `None` if the
/// file is absent or unreadable.
fn read_section(path: &Path) -> Option<HistorySection> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<ConfigFile>(&content) {
        Ok(cfg) => cfg.history,
        Err(e) => {
            tracing::warn!("ignoring {}: {e}", path.display());
            None
        }
    }
}

/// Relative `path` values in a project config resolve against the project root.
fn anchor(section: HistorySection, base: &Path) -> HistorySection {
    HistorySection {
        path: section.path.map(|p| if p.is_relative() { base.join(p) } else { p }),
        ..section
    }
}

impl HistoryConfig {
    /// Load config using auto-detected paths. Priority, per field:
    /// 1. `CMDHIST_LOG_PATH` (log path only)
    /// 2. `{project_root}/.cmdhist/config.toml` `[history]`
    /// 3. `{config_dir}/cmdhist/config.toml` `[history]`
    /// 4. Defaults
    pub fn load(project_root: Option<&Path>) -> Self {
        let global = dirs::config_dir().map(|d| d.join("cmdhist").join("config.toml"));
        Self::load_from(project_root, global.as_deref())
    }

    /// Load config from explicit paths. Useful for testing.
    pub fn load_from(project_root: Option<&Path>, global_config: Option<&Path>) -> Self {
        let from_project = project_root.and_then(|root| {
            read_section(&root.join(".cmdhist").join("config.toml")).map(|s| anchor(s, root))
        });
        let from_global = global_config.and_then(read_section);
        let (project, global) = (
            from_project.unwrap_or_default(),
            from_global.unwrap_or_default(),
        );

        let from_env = std::env::var_os(LOG_PATH_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let log_path = from_env
            .or(project.path)
            .or(global.path)
            .unwrap_or_else(default_log_path);
        let format = project
            .format
            .or(global.format)
            .unwrap_or_else(|| StoreFormat::infer(&log_path));
        Self {
            log_path,
            format,
            ignored_pattern: project.ignored_pattern.or(global.ignored_pattern),
        }
    }
}

/// `{data_local_dir}/cmdhist/history.json`, or a file in the working
/// directory on platforms without one.
pub fn default_log_path() -> PathBuf {
    dirs::data_local_dir().map_or_else(
        || PathBuf::from(".cmdhist_history.json"),
        |d| d.join("cmdhist").join("history.json"),
    )
}

/// Walk up from `dir` to find the nearest ancestor containing `.git` or `.cmdhist/`.
/// Falls back to `dir` itself if neither is found.
pub fn project_root_for(dir: &Path) -> PathBuf {
    let mut current = dir.to_path_buf();
    loop {
        if current.join(".git").exists() || current.join(".cmdhist").is_dir() {
            return current;
        }
        if !current.pop() {
            break;
        }
    }
    dir.to_path_buf()
}
