use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use super::{LogStore, out_of_range};
use crate::entry::LogEntry;

/// Command log kept as a JSON array in a single file:
///
/// ```json
/// [{"command": "r.info map=a", "command_info": {"timestamp": "...", "status": "finished"}}]
/// ```
///
/// Older logs are plain text with one command per line and no info; those are
/// read and written back in the same layout.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Json,
    PlainText,
}

#[derive(Serialize, Deserialize)]
struct RawEntry {
    command: String,
    #[serde(default)]
    command_info: Option<RawInfo>,
}

#[derive(Serialize, Deserialize, Default)]
struct RawInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<String>,
    #[serde(flatten)]
    extra: BTreeMap<String, serde_json::Value>,
}

impl From<RawEntry> for LogEntry {
    fn from(raw: RawEntry) -> Self {
        let info = raw.command_info.unwrap_or_default();
        Self {
            command: raw.command,
            timestamp: info.timestamp,
            status: info.status,
            extra_info: (!info.extra.is_empty()).then_some(info.extra),
        }
    }
}

impl From<&LogEntry> for RawEntry {
    fn from(entry: &LogEntry) -> Self {
        let extra = entry.extra_info.clone().unwrap_or_default();
        let command_info = (entry.timestamp.is_some() || entry.status.is_some() || !extra.is_empty())
            .then(|| RawInfo {
                timestamp: entry.timestamp.clone(),
                status: entry.status.clone(),
                extra,
            });
        Self {
            command: entry.command.clone(),
            command_info,
        }
    }
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> anyhow::Result<(Layout, Vec<LogEntry>)> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok((Layout::Json, Vec::new()));
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("read history log {}", self.path.display())));
            }
        };
        let trimmed = content.trim_start();
        if trimmed.is_empty() {
            return Ok((Layout::Json, Vec::new()));
        }
        if !trimmed.starts_with('[') {
            let entries = content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(LogEntry::new)
                .collect();
            return Ok((Layout::PlainText, entries));
        }
        let raw: Vec<RawEntry> = serde_json::from_str(&content)
            .with_context(|| format!("parse history log {}", self.path.display()))?;
        Ok((Layout::Json, raw.into_iter().map(LogEntry::from).collect()))
    }

    fn save(&self, layout: Layout, entries: &[LogEntry]) -> anyhow::Result<()> {
        let body = match layout {
            Layout::Json => {
                let raw: Vec<RawEntry> = entries.iter().map(RawEntry::from).collect();
                let mut s = serde_json::to_string_pretty(&raw).context("encode history log")?;
                s.push('\n');
                s
            }
            Layout::PlainText => entries
                .iter()
                .map(|e| format!("{}\n", e.display_command()))
                .collect(),
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create log dir {}", parent.display()))?;
        }
        // Write a sibling file and rename so readers never observe a torn log.
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, body).with_context(|| format!("write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("replace history log {}", self.path.display()))?;
        Ok(())
    }

    fn edit(&self, f: impl FnOnce(&mut Vec<LogEntry>) -> anyhow::Result<()>) -> anyhow::Result<()> {
        let (layout, mut entries) = self.load()?;
        f(&mut entries)?;
        self.save(layout, &entries)
    }
}

impl LogStore for JsonFileStore {
    fn read_all(&self) -> anyhow::Result<Vec<LogEntry>> {
        self.load().map(|(_, entries)| entries)
    }

    fn append(&mut self, entry: &LogEntry) -> anyhow::Result<()> {
        self.edit(|entries| {
            entries.push(entry.clone());
            Ok(())
        })
    }

    fn remove_at(&mut self, index: usize) -> anyhow::Result<()> {
        self.edit(|entries| {
            if index >= entries.len() {
                return Err(out_of_range(index, entries.len()));
            }
            entries.remove(index);
            Ok(())
        })
    }

    fn replace_at(&mut self, index: usize, entry: &LogEntry) -> anyhow::Result<()> {
        self.edit(|entries| {
            let len = entries.len();
            let slot = entries.get_mut(index).ok_or_else(|| out_of_range(index, len))?;
            *slot = entry.clone();
            Ok(())
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
