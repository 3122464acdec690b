//! Profile application.
//!
//! Device writes and the status display are external collaborators reached
//! through [`ConfigurationSink`] and [`StatusIndicator`].

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use tessel_types::profile::{ProfileSettings, RingerMode, VolumeChannel};

use crate::resolver::Resolution;

/// Receives device configuration writes. Fire-and-forget.
pub trait ConfigurationSink: Send + Sync {
    fn set_volume(&self, channel: VolumeChannel, level: u32);
    fn set_wifi_enabled(&self, enabled: bool);
    fn set_ringer_mode(&self, mode: RingerMode);
}

/// Displays the current status until replaced.
pub trait StatusIndicator: Send + Sync {
    fn show(&self, title: &str, subtitle: &str);
}

/// Applies resolutions in start order.
///
/// Each sighting carries the ticket taken when its resolution started. A
/// sighting older than the last one admitted is dropped, so a slow resolution
/// can never overwrite the outcome of a newer one. Re-applications of the
/// current cell take no ticket and never supersede a pending sighting.
pub struct ProfileApplier {
    sink: Arc<dyn ConfigurationSink>,
    indicator: Arc<dyn StatusIndicator>,
    last_ticket: Mutex<u64>,
}

impl ProfileApplier {
    pub fn new(sink: Arc<dyn ConfigurationSink>, indicator: Arc<dyn StatusIndicator>) -> Self {
        Self {
            sink,
            indicator,
            last_ticket: Mutex::new(0),
        }
    }

    /// Claim the right to apply for `ticket`.
    ///
    /// Returns `None` if a newer ticket has already been admitted. While the
    /// permit is held no other application can start.
    pub async fn admit(&self, ticket: u64) -> Option<ApplyPermit<'_>> {
        let mut last = self.last_ticket.lock().await;
        if ticket <= *last {
            tracing::debug!(ticket, last = *last, "stale application dropped");
            return None;
        }
        *last = ticket;
        Some(ApplyPermit {
            applier: self,
            _last: last,
        })
    }

    /// Claim the right to re-apply without advancing the ticket order.
    pub async fn reapply(&self) -> ApplyPermit<'_> {
        ApplyPermit {
            applier: self,
            _last: self.last_ticket.lock().await,
        }
    }

    fn write_settings(&self, settings: &ProfileSettings) {
        for (channel, volume) in settings.volumes() {
            if let Some(level) = volume.applied_level() {
                self.sink.set_volume(channel, level);
            }
        }
        if let Some(enabled) = settings.wifi.as_bool() {
            self.sink.set_wifi_enabled(enabled);
        }
        if settings.ringer_mode != RingerMode::Keep {
            self.sink.set_ringer_mode(settings.ringer_mode);
        }
    }
}

/// Exclusive, in-order right to apply one resolution.
pub struct ApplyPermit<'a> {
    applier: &'a ProfileApplier,
    _last: MutexGuard<'a, u64>,
}

impl ApplyPermit<'_> {
    /// Write the profile (if any) and update the status indicator.
    pub fn apply(&self, resolution: &Resolution) {
        if let Some(profile) = &resolution.profile {
            self.applier.write_settings(&profile.settings);
        }
        self.applier
            .indicator
            .show(&resolution.area_name, &resolution.profile_label);
    }
}
