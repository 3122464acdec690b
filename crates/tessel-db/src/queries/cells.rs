//! Cell query functions: the durable cell -> area mapping.

use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

use tessel_types::cell::{CellKey, NetworkType};
use tessel_types::profile::Profile;
use tessel_types::{AreaId, CellRowId, DEFAULT_AREA_ID};

use crate::queries::profiles;
use crate::{not_found, Result};

/// A stored cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellRow {
    pub id: CellRowId,
    pub area_id: AreaId,
    pub key: CellKey,
}

/// Outcome of [`resolve_or_create`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub cell_row_id: CellRowId,
    pub area_id: AreaId,
    pub created: bool,
}

/// Area of a cell joined with the area's profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaBinding {
    pub area_id: AreaId,
    pub area_name: String,
    pub profile: Option<Profile>,
}

/// Look up a cell by its radio identity.
pub fn find(conn: &Connection, key: CellKey) -> Result<Option<CellRow>> {
    let row = conn
        .query_row(
            "SELECT id, area_id FROM cell
             WHERE cell_id = ?1 AND cell_type = ?2
             ORDER BY id ASC LIMIT 1",
            rusqlite::params![key.cell_id, key.network_type.code()],
            |row| Ok((row.get::<_, CellRowId>(0)?, row.get::<_, AreaId>(1)?)),
        )
        .optional()?;
    Ok(row.map(|(id, area_id)| CellRow { id, area_id, key }))
}

/// Get a cell by row id.
pub fn get(conn: &Connection, id: CellRowId) -> Result<CellRow> {
    let (area_id, cell_id, cell_type) = conn
        .query_row(
            "SELECT area_id, cell_id, cell_type FROM cell WHERE id = ?1",
            [id],
            |row| {
                Ok((
                    row.get::<_, AreaId>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            },
        )
        .map_err(not_found(format!("cell {id}")))?;
    Ok(CellRow {
        id,
        area_id,
        key: CellKey::new(cell_id, NetworkType::from_code(cell_type)?),
    })
}

/// Resolve a sighted cell to its area, creating the cell on first sight.
///
/// With `learn_target` set, an existing cell is overwritten with the target
/// (even if it already has it) and a new cell is created in the target.
/// Without it, an existing cell keeps its area and a new one lands in the
/// default area. Runs in one transaction.
pub fn resolve_or_create(
    conn: &Connection,
    key: CellKey,
    learn_target: Option<AreaId>,
) -> Result<Resolved> {
    let tx = conn.unchecked_transaction()?;

    let resolved = match find(&tx, key)? {
        Some(cell) => {
            let area_id = match learn_target {
                Some(target) => {
                    tx.execute(
                        "UPDATE cell SET area_id = ?1 WHERE id = ?2",
                        rusqlite::params![target, cell.id],
                    )?;
                    target
                }
                None => cell.area_id,
            };
            Resolved {
                cell_row_id: cell.id,
                area_id,
                created: false,
            }
        }
        None => {
            let area_id = learn_target.unwrap_or(DEFAULT_AREA_ID);
            tx.execute(
                "INSERT INTO cell (area_id, cell_id, cell_type) VALUES (?1, ?2, ?3)",
                rusqlite::params![area_id, key.cell_id, key.network_type.code()],
            )?;
            Resolved {
                cell_row_id: tx.last_insert_rowid(),
                area_id,
                created: true,
            }
        }
    };

    tx.commit()?;
    Ok(resolved)
}

/// Join a cell with its area and the area's profile.
///
/// Returns `None` if the cell does not exist. A missing or deleted profile
/// yields `profile: None`.
pub fn area_binding(conn: &Connection, id: CellRowId) -> Result<Option<AreaBinding>> {
    let raw = conn
        .query_row(
            "SELECT a.id, a.name,
                    p.id, p.name, p.ringtone_volume, p.notification_volume,
                    p.media_volume, p.alarm_volume, p.wifi_enabled, p.ringer_mode
             FROM cell AS c
             JOIN area AS a ON a.id = c.area_id
             LEFT JOIN profile AS p ON p.id = a.profile_id
             WHERE c.id = ?1",
            [id],
            |row| {
                Ok((
                    row.get::<_, AreaId>(0)?,
                    row.get::<_, String>(1)?,
                    profiles::decode_joined(row, 2)?,
                ))
            },
        )
        .optional()?;

    let Some((area_id, area_name, profile)) = raw else {
        return Ok(None);
    };
    Ok(Some(AreaBinding {
        area_id,
        area_name,
        profile: profile.map(|p| p.decode()).transpose()?,
    }))
}

/// Cells currently assigned to an area.
pub fn list_by_area(conn: &Connection, area_id: AreaId) -> Result<Vec<CellRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, cell_id, cell_type FROM cell WHERE area_id = ?1 ORDER BY id ASC",
    )?;
    let raws = stmt
        .query_map([area_id], |row| {
            Ok((
                row.get::<_, CellRowId>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    raws.into_iter()
        .map(|(id, cell_id, cell_type)| -> Result<CellRow> {
            Ok(CellRow {
                id,
                area_id,
                key: CellKey::new(cell_id, NetworkType::from_code(cell_type)?),
            })
        })
        .collect()
}

/// Number of rows stored for a radio identity.
pub fn count_for_key(conn: &Connection, key: CellKey) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM cell WHERE cell_id = ?1 AND cell_type = ?2",
        rusqlite::params![key.cell_id, key.network_type.code()],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Assign to `target` the most recently logged cell and every cell logged
/// strictly after `since` (Unix millis). Returns the number of cells updated.
pub fn reassign_since(conn: &Connection, target: AreaId, since: i64) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let changed = tx.execute(
        "UPDATE cell SET area_id = ?1
         WHERE id = (SELECT cell_id FROM cell_log ORDER BY timestamp DESC, id DESC LIMIT 1)
            OR id IN (SELECT cell_id FROM cell_log WHERE timestamp > ?2)",
        rusqlite::params![target, since],
    )?;
    tx.commit()?;
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::cell_log;
    use crate::DbError;

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    fn gsm(cell_id: i64) -> CellKey {
        CellKey::new(cell_id, NetworkType::Gsm)
    }

    #[test]
    fn test_unseen_cell_lands_in_default_area() {
        let conn = test_db();
        let resolved = resolve_or_create(&conn, gsm(42), None).expect("resolve");
        assert!(resolved.created);
        assert_eq!(resolved.area_id, DEFAULT_AREA_ID);
        assert_eq!(count_for_key(&conn, gsm(42)).expect("count"), 1);
    }

    #[test]
    fn test_seen_cell_keeps_area_without_learning() {
        let conn = test_db();
        let first = resolve_or_create(&conn, gsm(42), Some(1)).expect("first");
        let second = resolve_or_create(&conn, gsm(42), None).expect("second");
        assert!(!second.created);
        assert_eq!(second.cell_row_id, first.cell_row_id);
        assert_eq!(second.area_id, 1);
        assert_eq!(count_for_key(&conn, gsm(42)).expect("count"), 1);
    }

    #[test]
    fn test_learning_overwrites_existing_cell() {
        let conn = test_db();
        resolve_or_create(&conn, gsm(42), None).expect("create");
        let learned = resolve_or_create(&conn, gsm(42), Some(2)).expect("learn");
        assert_eq!(learned.area_id, 2);
        assert_eq!(get(&conn, learned.cell_row_id).expect("get").area_id, 2);
    }

    #[test]
    fn test_network_type_scopes_identity() {
        let conn = test_db();
        let gsm_cell = resolve_or_create(&conn, gsm(5), None).expect("gsm");
        let cdma_cell =
            resolve_or_create(&conn, CellKey::new(5, NetworkType::Cdma), None).expect("cdma");
        assert_ne!(gsm_cell.cell_row_id, cdma_cell.cell_row_id);
    }

    #[test]
    fn test_area_binding_with_profile() {
        let conn = test_db();
        let resolved = resolve_or_create(&conn, gsm(1), Some(2)).expect("resolve");
        let binding = area_binding(&conn, resolved.cell_row_id)
            .expect("binding")
            .expect("cell exists");
        assert_eq!(binding.area_name, "Work");
        assert_eq!(binding.profile.expect("profile").name, "Silent");
    }

    #[test]
    fn test_area_binding_without_profile() {
        let conn = test_db();
        crate::queries::areas::set_profile(&conn, 1, None).expect("unbind");
        let resolved = resolve_or_create(&conn, gsm(1), Some(1)).expect("resolve");
        let binding = area_binding(&conn, resolved.cell_row_id)
            .expect("binding")
            .expect("cell exists");
        assert_eq!(binding.area_name, "Home");
        assert!(binding.profile.is_none());
    }

    #[test]
    fn test_area_binding_unknown_cell() {
        let conn = test_db();
        assert!(area_binding(&conn, 12345).expect("binding").is_none());
        assert!(matches!(get(&conn, 12345), Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_reassign_zero_window_hits_latest_cell() {
        let conn = test_db();
        let a = resolve_or_create(&conn, gsm(1), None).expect("a");
        let b = resolve_or_create(&conn, gsm(2), None).expect("b");
        cell_log::append(&conn, a.cell_row_id, 1_000).expect("log a");
        cell_log::append(&conn, b.cell_row_id, 2_000).expect("log b");

        let changed = reassign_since(&conn, 1, 2_000).expect("reassign");
        assert_eq!(changed, 1);
        assert_eq!(get(&conn, b.cell_row_id).expect("b").area_id, 1);
        assert_eq!(get(&conn, a.cell_row_id).expect("a").area_id, DEFAULT_AREA_ID);
    }

    #[test]
    fn test_reassign_window_is_strict() {
        let conn = test_db();
        let a = resolve_or_create(&conn, gsm(1), None).expect("a");
        let b = resolve_or_create(&conn, gsm(2), None).expect("b");
        let c = resolve_or_create(&conn, gsm(3), None).expect("c");
        cell_log::append(&conn, a.cell_row_id, 1_000).expect("log");
        cell_log::append(&conn, b.cell_row_id, 2_000).expect("log");
        cell_log::append(&conn, c.cell_row_id, 3_000).expect("log");
        cell_log::append(&conn, b.cell_row_id, 4_000).expect("log");

        let changed = reassign_since(&conn, 2, 2_000).expect("reassign");
        assert_eq!(changed, 2);
        assert_eq!(get(&conn, a.cell_row_id).expect("a").area_id, DEFAULT_AREA_ID);
        assert_eq!(get(&conn, b.cell_row_id).expect("b").area_id, 2);
        assert_eq!(get(&conn, c.cell_row_id).expect("c").area_id, 2);
    }

    #[test]
    fn test_reassign_with_empty_log() {
        let conn = test_db();
        resolve_or_create(&conn, gsm(1), None).expect("a");
        assert_eq!(reassign_since(&conn, 1, 0).expect("reassign"), 0);
    }

    #[test]
    fn test_list_by_area() {
        let conn = test_db();
        resolve_or_create(&conn, gsm(1), Some(1)).expect("a");
        resolve_or_create(&conn, gsm(2), None).expect("b");
        resolve_or_create(&conn, gsm(3), Some(1)).expect("c");
        let ids: Vec<i64> = list_by_area(&conn, 1)
            .expect("list")
            .into_iter()
            .map(|c| c.key.cell_id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
