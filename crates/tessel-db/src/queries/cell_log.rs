//! Cell log: append-only record of cell changes.

use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

use tessel_types::CellRowId;

use crate::Result;

/// One logged cell change. `timestamp` is Unix millis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub id: i64,
    pub cell_row_id: CellRowId,
    pub timestamp: i64,
}

/// Record that the device moved onto a cell.
pub fn append(conn: &Connection, cell_row_id: CellRowId, timestamp: i64) -> Result<i64> {
    conn.execute(
        "INSERT INTO cell_log (cell_id, timestamp) VALUES (?1, ?2)",
        rusqlite::params![cell_row_id, timestamp],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Most recent entry, by timestamp then insertion order.
pub fn latest(conn: &Connection) -> Result<Option<LogEntry>> {
    let entry = conn
        .query_row(
            "SELECT id, cell_id, timestamp FROM cell_log
             ORDER BY timestamp DESC, id DESC LIMIT 1",
            [],
            |row| {
                Ok(LogEntry {
                    id: row.get(0)?,
                    cell_row_id: row.get(1)?,
                    timestamp: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(entry)
}

/// Entries strictly after `timestamp`, oldest first.
pub fn since(conn: &Connection, timestamp: i64) -> Result<Vec<LogEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, cell_id, timestamp FROM cell_log
         WHERE timestamp > ?1 ORDER BY timestamp ASC, id ASC",
    )?;
    let rows = stmt
        .query_map([timestamp], |row| {
            Ok(LogEntry {
                id: row.get(0)?,
                cell_row_id: row.get(1)?,
                timestamp: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Total number of entries.
pub fn count(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM cell_log", [], |row| row.get(0))?;
    Ok(count)
}
