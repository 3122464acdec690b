//! Database migration system.
//!
//! Schema version stored in `PRAGMA user_version`. Migrations are forward-only
//! and additive; each one runs inside its own transaction.

use rusqlite::Connection;

use tessel_types::profile::{ProfileSettings, RingerMode, Volume, WifiSetting};
use tessel_types::DEFAULT_AREA_ID;

use crate::queries::profiles;
use crate::{schema, DbError, Result, SCHEMA_VERSION};

/// Seed names. The default area is the one new cells fall into.
pub const DEFAULT_AREA_NAME: &str = "Unknown";
pub const HOME_AREA_NAME: &str = "Home";
pub const WORK_AREA_NAME: &str = "Work";
pub const NORMAL_PROFILE_NAME: &str = "Normal";
pub const SILENT_PROFILE_NAME: &str = "Silent";

/// Run all pending migrations.
pub fn run(conn: &Connection) -> Result<()> {
    let current_version: u32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(DbError::Sqlite)?;

    if current_version == 0 {
        // Fresh database: apply the current schema directly
        tracing::info!("Initializing database schema v{SCHEMA_VERSION}");
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(schema::SCHEMA_V2)?;
        insert_seed_data(&tx)?;
        tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        tx.commit()?;
    } else if current_version < SCHEMA_VERSION {
        for version in (current_version + 1)..=SCHEMA_VERSION {
            tracing::info!("Running migration to v{version}");
            let tx = conn.unchecked_transaction()?;
            run_migration(&tx, version)?;
            tx.pragma_update(None, "user_version", version)?;
            tx.commit()?;
        }
    } else if current_version > SCHEMA_VERSION {
        return Err(DbError::Migration(format!(
            "Database version {current_version} is newer than supported {SCHEMA_VERSION}"
        )));
    }

    Ok(())
}

/// Insert the default profiles and areas.
fn insert_seed_data(conn: &Connection) -> Result<()> {
    // Normal: remembers typical levels but changes nothing.
    let normal = profiles::insert(
        conn,
        NORMAL_PROFILE_NAME,
        &ProfileSettings {
            ringtone_volume: Volume::Suppressed(5),
            notification_volume: Volume::Suppressed(5),
            media_volume: Volume::Suppressed(9),
            alarm_volume: Volume::Suppressed(5),
            wifi: WifiSetting::Keep,
            ringer_mode: RingerMode::Keep,
        },
    )?;

    // Silent: mutes ringtone and notifications and vibrates.
    let silent = profiles::insert(
        conn,
        SILENT_PROFILE_NAME,
        &ProfileSettings {
            ringtone_volume: Volume::Applied(0),
            notification_volume: Volume::Applied(0),
            media_volume: Volume::Suppressed(0),
            alarm_volume: Volume::Suppressed(0),
            wifi: WifiSetting::Keep,
            ringer_mode: RingerMode::Vibrate,
        },
    )?;

    let mut stmt = conn.prepare(
        "INSERT INTO area (id, name, profile_id, wifi_enabled, bluetooth_enabled)
         VALUES (?1, ?2, ?3, ?4, 0)",
    )?;
    stmt.execute(rusqlite::params![DEFAULT_AREA_ID, DEFAULT_AREA_NAME, normal, false])?;

    let mut stmt = conn.prepare(
        "INSERT INTO area (name, profile_id, wifi_enabled, bluetooth_enabled)
         VALUES (?1, ?2, ?3, 0)",
    )?;
    stmt.execute(rusqlite::params![HOME_AREA_NAME, normal, true])?;
    stmt.execute(rusqlite::params![WORK_AREA_NAME, silent, true])?;

    Ok(())
}

/// Run a specific migration.
fn run_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        2 => {
            conn.execute_batch(schema::MIGRATION_V2)?;
            Ok(())
        }
        _ => Err(DbError::Migration(format!(
            "Unknown migration version: {version}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Connection {
        let conn = Connection::open_in_memory().expect("open");
        conn.execute_batch("PRAGMA foreign_keys = ON;").expect("pragma");
        conn
    }

    fn user_version(conn: &Connection) -> u32 {
        conn.pragma_query_value(None, "user_version", |row| row.get(0))
            .expect("version")
    }

    #[test]
    fn test_fresh_migration() {
        let conn = fresh();
        run(&conn).expect("migrate");
        assert_eq!(user_version(&conn), SCHEMA_VERSION);
    }

    #[test]
    fn test_idempotent_migration() {
        let conn = fresh();
        run(&conn).expect("first run");
        run(&conn).expect("second run should be no-op");

        let profiles: i64 = conn
            .query_row("SELECT COUNT(*) FROM profile", [], |row| row.get(0))
            .expect("count");
        assert_eq!(profiles, 2);
    }

    #[test]
    fn test_seed_areas() {
        let conn = fresh();
        run(&conn).expect("migrate");

        let rows: Vec<(i64, String, bool)> = conn
            .prepare("SELECT id, name, wifi_enabled FROM area ORDER BY id")
            .expect("prepare")
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .expect("query")
            .collect::<std::result::Result<_, _>>()
            .expect("collect");

        assert_eq!(
            rows,
            vec![
                (DEFAULT_AREA_ID, DEFAULT_AREA_NAME.to_string(), false),
                (1, HOME_AREA_NAME.to_string(), true),
                (2, WORK_AREA_NAME.to_string(), true),
            ]
        );
    }

    #[test]
    fn test_seed_profiles() {
        let conn = fresh();
        run(&conn).expect("migrate");

        let normal = profiles::get(&conn, 1).expect("normal");
        assert_eq!(normal.name, NORMAL_PROFILE_NAME);
        assert_eq!(normal.settings.media_volume, Volume::Suppressed(9));
        assert_eq!(normal.settings.ringer_mode, RingerMode::Keep);

        let silent = profiles::get(&conn, 2).expect("silent");
        assert_eq!(silent.settings.ringtone_volume, Volume::Applied(0));
        assert_eq!(silent.settings.ringer_mode, RingerMode::Vibrate);
    }

    #[test]
    fn test_v1_database_gains_radio_columns() {
        let conn = fresh();
        conn.execute_batch(schema::SCHEMA_V1).expect("v1 schema");
        conn.execute(
            "INSERT INTO area (id, name, profile_id) VALUES (0, 'Unknown', NULL)",
            [],
        )
        .expect("area");
        conn.execute(
            "INSERT INTO area (name, profile_id) VALUES ('Gym', NULL)",
            [],
        )
        .expect("area");
        conn.pragma_update(None, "user_version", 1u32)
            .expect("set version");

        run(&conn).expect("migrate");
        assert_eq!(user_version(&conn), 2);

        let rows: Vec<(bool, bool)> = conn
            .prepare("SELECT wifi_enabled, bluetooth_enabled FROM area ORDER BY id")
            .expect("prepare")
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .expect("query")
            .collect::<std::result::Result<_, _>>()
            .expect("collect");
        assert_eq!(rows, vec![(true, false), (true, false)]);
    }

    #[test]
    fn test_newer_database_is_refused() {
        let conn = fresh();
        conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1)
            .expect("set version");
        let result = run(&conn);
        assert!(matches!(result, Err(DbError::Migration(_))));
    }

    #[test]
    fn test_tables_created() {
        let conn = fresh();
        run(&conn).expect("migrate");

        for table in ["area", "profile", "cell", "cell_log"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [table],
                    |row| row.get(0),
                )
                .expect("query");
            assert_eq!(count, 1, "table {table} should exist");
        }
    }
}
