//! Profile query functions.

use rusqlite::{Connection, Row};

use tessel_types::profile::{Profile, ProfileSettings, RingerMode, Volume, WifiSetting};
use tessel_types::ProfileId;

use crate::{not_found, DbError, Result};

const COLUMNS: &str = "id, name, ringtone_volume, notification_volume, media_volume,
                       alarm_volume, wifi_enabled, ringer_mode";

/// Insert a profile and return its id.
pub fn insert(conn: &Connection, name: &str, settings: &ProfileSettings) -> Result<ProfileId> {
    conn.execute(
        "INSERT INTO profile (name, ringtone_volume, notification_volume, media_volume,
                              alarm_volume, wifi_enabled, ringer_mode)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            name,
            settings.ringtone_volume.to_stored(),
            settings.notification_volume.to_stored(),
            settings.media_volume.to_stored(),
            settings.alarm_volume.to_stored(),
            settings.wifi.to_stored(),
            settings.ringer_mode.code(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Get a profile by id.
pub fn get(conn: &Connection, id: ProfileId) -> Result<Profile> {
    let raw = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM profile WHERE id = ?1"),
            [id],
            RawProfile::from_row,
        )
        .map_err(not_found(format!("profile {id}")))?;
    raw.decode()
}

/// Get a profile by id, or `None` if it does not exist.
pub fn find(conn: &Connection, id: ProfileId) -> Result<Option<Profile>> {
    match get(conn, id) {
        Ok(profile) => Ok(Some(profile)),
        Err(DbError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// List all profiles ordered by id.
pub fn list(conn: &Connection) -> Result<Vec<Profile>> {
    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM profile ORDER BY id ASC"))?;
    let raws = stmt
        .query_map([], RawProfile::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    raws.into_iter().map(RawProfile::decode).collect()
}

/// Rename a profile.
pub fn rename(conn: &Connection, id: ProfileId, name: &str) -> Result<()> {
    let changed = conn.execute(
        "UPDATE profile SET name = ?1 WHERE id = ?2",
        rusqlite::params![name, id],
    )?;
    expect_one(changed, id)
}

/// Replace the settings of a profile.
pub fn update_settings(conn: &Connection, id: ProfileId, settings: &ProfileSettings) -> Result<()> {
    let changed = conn.execute(
        "UPDATE profile SET ringtone_volume = ?1, notification_volume = ?2,
                            media_volume = ?3, alarm_volume = ?4,
                            wifi_enabled = ?5, ringer_mode = ?6
         WHERE id = ?7",
        rusqlite::params![
            settings.ringtone_volume.to_stored(),
            settings.notification_volume.to_stored(),
            settings.media_volume.to_stored(),
            settings.alarm_volume.to_stored(),
            settings.wifi.to_stored(),
            settings.ringer_mode.code(),
            id,
        ],
    )?;
    expect_one(changed, id)
}

/// Delete a profile. Areas bound to it fall back to "no profile".
pub fn delete(conn: &Connection, id: ProfileId) -> Result<()> {
    let changed = conn.execute("DELETE FROM profile WHERE id = ?1", [id])?;
    expect_one(changed, id)
}

fn expect_one(changed: usize, id: ProfileId) -> Result<()> {
    if changed == 0 {
        return Err(DbError::NotFound(format!("profile {id}")));
    }
    Ok(())
}

/// Profile row as stored, before decoding the sentinel encodings.
struct RawProfile {
    id: ProfileId,
    name: String,
    ringtone_volume: i64,
    notification_volume: i64,
    media_volume: i64,
    alarm_volume: i64,
    wifi_enabled: Option<i64>,
    ringer_mode: i64,
}

impl RawProfile {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            ringtone_volume: row.get(2)?,
            notification_volume: row.get(3)?,
            media_volume: row.get(4)?,
            alarm_volume: row.get(5)?,
            wifi_enabled: row.get(6)?,
            ringer_mode: row.get(7)?,
        })
    }

    fn decode(self) -> Result<Profile> {
        Ok(Profile {
            id: self.id,
            name: self.name,
            settings: ProfileSettings {
                ringtone_volume: Volume::from_stored(self.ringtone_volume)?,
                notification_volume: Volume::from_stored(self.notification_volume)?,
                media_volume: Volume::from_stored(self.media_volume)?,
                alarm_volume: Volume::from_stored(self.alarm_volume)?,
                wifi: WifiSetting::from_stored(self.wifi_enabled)?,
                ringer_mode: RingerMode::from_code(self.ringer_mode)?,
            },
        })
    }
}

/// Decode a profile from columns starting at `offset`, in [`COLUMNS`] order.
///
/// Returns `None` when the profile id column is NULL (outer join miss).
pub(crate) fn decode_joined(row: &Row<'_>, offset: usize) -> rusqlite::Result<Option<RawJoined>> {
    let id: Option<ProfileId> = row.get(offset)?;
    let Some(id) = id else {
        return Ok(None);
    };
    Ok(Some(RawJoined(RawProfile {
        id,
        name: row.get(offset + 1)?,
        ringtone_volume: row.get(offset + 2)?,
        notification_volume: row.get(offset + 3)?,
        media_volume: row.get(offset + 4)?,
        alarm_volume: row.get(offset + 5)?,
        wifi_enabled: row.get(offset + 6)?,
        ringer_mode: row.get(offset + 7)?,
    })))
}

/// Undecoded profile read as part of a join.
pub(crate) struct RawJoined(RawProfile);

impl RawJoined {
    pub(crate) fn decode(self) -> Result<Profile> {
        self.0.decode()
    }
}
