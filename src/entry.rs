use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Status written when a command has been launched but not yet finished.
pub const STATUS_IN_PROCESS: &str = "in process";
pub const STATUS_FINISHED: &str = "finished";
pub const STATUS_FAILED: &str = "failed";

/// One record of the command log, as stored by a [`crate::store::LogStore`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LogEntry {
    pub command: String,
    /// ISO-8601 launch time. Legacy plain-text logs carry none.
    pub timestamp: Option<String>,
    pub status: Option<String>,
    /// Everything else the launcher recorded (runtime, region, ...).
    pub extra_info: Option<BTreeMap<String, serde_json::Value>>,
}

impl LogEntry {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra_info
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value);
        self
    }

    /// A freshly launched command stamped with the current local time.
    pub fn launched_now(command: impl Into<String>) -> Self {
        let now = chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string();
        Self::new(command)
            .with_timestamp(now)
            .with_status(STATUS_IN_PROCESS)
    }

    /// Command text as shown in the tree: surrounding whitespace stripped.
    pub fn display_command(&self) -> &str {
        self.command.trim()
    }

    /// Whether this record is the stored form of a node with the given
    /// command text and timestamp.
    pub fn matches(&self, command: &str, timestamp: Option<&str>) -> bool {
        self.display_command() == command && self.timestamp.as_deref() == timestamp
    }
}
