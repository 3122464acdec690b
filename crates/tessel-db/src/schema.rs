//! SQL schema definitions.

/// Version 1 shape: areas carry no radio preferences yet.
///
/// Only used to build v1 databases in migration tests; fresh databases are
/// created directly at [`SCHEMA_V2`].
pub const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS profile (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    ringtone_volume INTEGER NOT NULL,
    notification_volume INTEGER NOT NULL,
    media_volume INTEGER NOT NULL,
    alarm_volume INTEGER NOT NULL,
    wifi_enabled INTEGER,
    ringer_mode INTEGER NOT NULL DEFAULT -1
);

CREATE TABLE IF NOT EXISTS area (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    profile_id INTEGER REFERENCES profile(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS cell (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    area_id INTEGER NOT NULL REFERENCES area(id),
    cell_id INTEGER NOT NULL,
    cell_type INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS cell_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    cell_id INTEGER NOT NULL REFERENCES cell(id),
    timestamp INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_cell_key ON cell(cell_id, cell_type);
CREATE INDEX IF NOT EXISTS idx_cell_area ON cell(area_id);
CREATE INDEX IF NOT EXISTS idx_cell_log_timestamp ON cell_log(timestamp);
"#;

/// Current schema.
pub const SCHEMA_V2: &str = r#"
CREATE TABLE IF NOT EXISTS profile (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    ringtone_volume INTEGER NOT NULL,
    notification_volume INTEGER NOT NULL,
    media_volume INTEGER NOT NULL,
    alarm_volume INTEGER NOT NULL,
    wifi_enabled INTEGER,
    ringer_mode INTEGER NOT NULL DEFAULT -1
);

CREATE TABLE IF NOT EXISTS area (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    profile_id INTEGER REFERENCES profile(id) ON DELETE SET NULL,
    wifi_enabled INTEGER NOT NULL DEFAULT 0,
    bluetooth_enabled INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS cell (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    area_id INTEGER NOT NULL REFERENCES area(id),
    cell_id INTEGER NOT NULL,
    cell_type INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS cell_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    cell_id INTEGER NOT NULL REFERENCES cell(id),
    timestamp INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_cell_key ON cell(cell_id, cell_type);
CREATE INDEX IF NOT EXISTS idx_cell_area ON cell(area_id);
CREATE INDEX IF NOT EXISTS idx_cell_log_timestamp ON cell_log(timestamp);
"#;

/// v1 -> v2: radio preferences on areas. Existing areas keep wifi on.
pub const MIGRATION_V2: &str = r#"
ALTER TABLE area ADD COLUMN wifi_enabled INTEGER NOT NULL DEFAULT 0;
UPDATE area SET wifi_enabled = 1;
ALTER TABLE area ADD COLUMN bluetooth_enabled INTEGER NOT NULL DEFAULT 0;
UPDATE area SET bluetooth_enabled = 0;
"#;
