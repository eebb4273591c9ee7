use super::{LogStore, out_of_range};
use crate::entry::LogEntry;

/// Log held in memory, for embedding and tests. Reads and writes can be made
/// to fail on demand.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Vec<LogEntry>,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new(entries: Vec<LogEntry>) -> Self {
        Self {
            entries,
            ..Self::default()
        }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Mutate the log behind the index's back, as another writer would.
    pub fn entries_mut(&mut self) -> &mut Vec<LogEntry> {
        &mut self.entries
    }

    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    fn check_write(&self) -> anyhow::Result<()> {
        if self.fail_writes {
            anyhow::bail!("memory store is read-only");
        }
        Ok(())
    }
}

impl LogStore for MemoryStore {
    fn read_all(&self) -> anyhow::Result<Vec<LogEntry>> {
        if self.fail_reads {
            anyhow::bail!("memory store is unreadable");
        }
        Ok(self.entries.clone())
    }

    fn append(&mut self, entry: &LogEntry) -> anyhow::Result<()> {
        self.check_write()?;
        self.entries.push(entry.clone());
        Ok(())
    }

    fn remove_at(&mut self, index: usize) -> anyhow::Result<()> {
        self.check_write()?;
        if index >= self.entries.len() {
            return Err(out_of_range(index, self.entries.len()));
        }
        self.entries.remove(index);
        Ok(())
    }

    fn replace_at(&mut self, index: usize, entry: &LogEntry) -> anyhow::Result<()> {
        self.check_write()?;
        let len = self.entries.len();
        let slot = self
            .entries
            .get_mut(index)
            .ok_or_else(|| out_of_range(index, len))?;
        *slot = entry.clone();
        Ok(())
    }

    fn describe(&self) -> String {
        format!("in-memory log ({} entries)", self.entries.len())
    }
}
