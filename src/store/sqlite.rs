use std::path::Path;

use anyhow::Context as _;
use rusqlite::{Connection, OptionalExtension as _};

use super::{LogStore, out_of_range};
use crate::entry::LogEntry;

/// Command log in a `SQLite` `history` table. Log order is row-id order.
pub struct SqliteStore {
    conn: Connection,
    location: String,
}

impl SqliteStore {
    /// Open or create the database at `path`.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created, the DB cannot be
    /// opened, or the schema cannot be created.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create db dir {}", parent.display()))?;
        }
        let conn =
            Connection::open(path).with_context(|| format!("open db at {}", path.display()))?;
        Self::with_connection(conn, path.display().to_string())
    }

    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory db")?;
        Self::with_connection(conn, String::from(":memory:"))
    }

    fn with_connection(conn: Connection, location: String) -> anyhow::Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS history (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                command     TEXT    NOT NULL,
                timestamp   TEXT,
                status      TEXT,
                extra_info  TEXT
            );",
        )
        .context("create history table")?;
        Ok(Self { conn, location })
    }

    /// Row id of the entry at log position `index`.
    fn id_at(&self, index: usize) -> anyhow::Result<i64> {
        #[allow(clippy::cast_possible_wrap)]
        let offset = index as i64;
        let id: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM history ORDER BY id LIMIT 1 OFFSET ?1",
                [offset],
                |r| r.get(0),
            )
            .optional()
            .context("look up history row")?;
        match id {
            Some(id) => Ok(id),
            None => {
                let len: i64 = self
                    .conn
                    .query_row("SELECT COUNT(*) FROM history", [], |r| r.get(0))
                    .context("count history rows")?;
                Err(out_of_range(index, usize::try_from(len).unwrap_or_default()))
            }
        }
    }
}

fn encode_extra(entry: &LogEntry) -> anyhow::Result<Option<String>> {
    entry
        .extra_info
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .context("encode extra info")
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(LogEntry, Option<String>)> {
    Ok((
        LogEntry {
            command: row.get(0)?,
            timestamp: row.get(1)?,
            status: row.get(2)?,
            extra_info: None,
        },
        row.get(3)?,
    ))
}

impl LogStore for SqliteStore {
    fn read_all(&self) -> anyhow::Result<Vec<LogEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT command, timestamp, status, extra_info FROM history ORDER BY id")?;
        let rows = stmt.query_map([], map_row)?;
        let mut result = Vec::new();
        for row in rows {
            let (mut entry, extra) = row.context("read history row")?;
            if let Some(extra) = extra {
                entry.extra_info =
                    Some(serde_json::from_str(&extra).context("decode extra info")?);
            }
            result.push(entry);
        }
        Ok(result)
    }

    fn append(&mut self, entry: &LogEntry) -> anyhow::Result<()> {
        self.conn
            .execute(
                "INSERT INTO history (command, timestamp, status, extra_info)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    entry.command,
                    entry.timestamp,
                    entry.status,
                    encode_extra(entry)?
                ],
            )
            .context("insert history entry")?;
        Ok(())
    }

    fn remove_at(&mut self, index: usize) -> anyhow::Result<()> {
        let id = self.id_at(index)?;
        self.conn
            .execute("DELETE FROM history WHERE id = ?1", [id])
            .context("delete history entry")?;
        Ok(())
    }

    fn replace_at(&mut self, index: usize, entry: &LogEntry) -> anyhow::Result<()> {
        let id = self.id_at(index)?;
        self.conn
            .execute(
                "UPDATE history SET command = ?1, timestamp = ?2, status = ?3, extra_info = ?4
                 WHERE id = ?5",
                rusqlite::params![
                    entry.command,
                    entry.timestamp,
                    entry.status,
                    encode_extra(entry)?,
                    id
                ],
            )
            .context("update history entry")?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.location.clone()
    }
}
