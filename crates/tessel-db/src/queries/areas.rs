//! Area query functions.

use rusqlite::{Connection, OptionalExtension, Row};

use tessel_types::area::{Area, AreaSummary};
use tessel_types::{AreaId, ProfileId, DEFAULT_AREA_ID};

use crate::{not_found, DbError, Result};

fn area_from_row(row: &Row<'_>) -> rusqlite::Result<Area> {
    Ok(Area {
        id: row.get(0)?,
        name: row.get(1)?,
        profile_id: row.get(2)?,
        wifi_enabled: row.get(3)?,
        bluetooth_enabled: row.get(4)?,
    })
}

/// Insert a new area without a profile and return its id.
pub fn insert(conn: &Connection, name: &str) -> Result<AreaId> {
    conn.execute(
        "INSERT INTO area (name, profile_id, wifi_enabled, bluetooth_enabled)
         VALUES (?1, NULL, 0, 0)",
        [name],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Get an area by id.
pub fn get(conn: &Connection, id: AreaId) -> Result<Area> {
    conn.query_row(
        "SELECT id, name, profile_id, wifi_enabled, bluetooth_enabled
         FROM area WHERE id = ?1",
        [id],
        area_from_row,
    )
    .map_err(not_found(format!("area {id}")))
}

/// Whether an area with this id exists.
pub fn exists(conn: &Connection, id: AreaId) -> Result<bool> {
    let found = conn
        .query_row("SELECT 1 FROM area WHERE id = ?1", [id], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

/// List all areas ordered by id.
pub fn list(conn: &Connection) -> Result<Vec<Area>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, profile_id, wifi_enabled, bluetooth_enabled
         FROM area ORDER BY id ASC",
    )?;
    let rows = stmt
        .query_map([], area_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// List areas with the name of their profile, or `no_profile` if unbound.
pub fn list_summaries(conn: &Connection, no_profile: &str) -> Result<Vec<AreaSummary>> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.name, ifnull(p.name, ?1)
         FROM area AS a
         LEFT JOIN profile AS p ON a.profile_id = p.id
         ORDER BY a.id ASC",
    )?;
    let rows = stmt
        .query_map([no_profile], |row| {
            Ok(AreaSummary {
                id: row.get(0)?,
                name: row.get(1)?,
                profile_name: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Rename an area. The default area keeps its name.
pub fn rename(conn: &Connection, id: AreaId, name: &str) -> Result<()> {
    if id == DEFAULT_AREA_ID {
        return Err(DbError::Constraint("the default area cannot be renamed".into()));
    }
    let changed = conn.execute(
        "UPDATE area SET name = ?1 WHERE id = ?2",
        rusqlite::params![name, id],
    )?;
    expect_one(changed, id)
}

/// Bind a profile to an area, or unbind with `None`.
pub fn set_profile(conn: &Connection, id: AreaId, profile_id: Option<ProfileId>) -> Result<()> {
    let changed = conn
        .execute(
            "UPDATE area SET profile_id = ?1 WHERE id = ?2",
            rusqlite::params![profile_id, id],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                DbError::NotFound(format!("profile {}", profile_id.unwrap_or_default()))
            }
            other => DbError::Sqlite(other),
        })?;
    expect_one(changed, id)
}

/// Store the radio preferences of an area.
pub fn set_radios(conn: &Connection, id: AreaId, wifi: bool, bluetooth: bool) -> Result<()> {
    let changed = conn.execute(
        "UPDATE area SET wifi_enabled = ?1, bluetooth_enabled = ?2 WHERE id = ?3",
        rusqlite::params![wifi, bluetooth, id],
    )?;
    expect_one(changed, id)
}

/// Delete an area, moving its cells to the default area.
///
/// Deleting the default area is a no-op. Returns the number of cells moved.
pub fn delete(conn: &Connection, id: AreaId) -> Result<usize> {
    if id == DEFAULT_AREA_ID {
        return Ok(0);
    }
    let tx = conn.unchecked_transaction()?;
    let moved = tx.execute(
        "UPDATE cell SET area_id = ?1 WHERE area_id = ?2",
        rusqlite::params![DEFAULT_AREA_ID, id],
    )?;
    let changed = tx.execute("DELETE FROM area WHERE id = ?1", [id])?;
    expect_one(changed, id)?;
    tx.commit()?;
    Ok(moved)
}

fn expect_one(changed: usize, id: AreaId) -> Result<()> {
    if changed == 0 {
        return Err(DbError::NotFound(format!("area {id}")));
    }
    Ok(())
}
