//! Collaborator adapters for the engine.
//!
//! The daemon does not drive hardware itself: configuration writes are
//! logged and broadcast as events for whatever client owns the device, and
//! the status display is kept in memory and broadcast on change.

use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use serde_json::json;

use tessel_engine::applier::{ConfigurationSink, StatusIndicator};
use tessel_types::profile::{RingerMode, VolumeChannel};

use crate::events::{Event, EventBus, CONFIGURATION_APPLIED, STATUS_CHANGED};

/// Configuration sink that publishes each write.
pub struct EventSink {
    bus: EventBus,
}

impl EventSink {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }
}

impl ConfigurationSink for EventSink {
    fn set_volume(&self, channel: VolumeChannel, level: u32) {
        tracing::info!(?channel, level, "volume set");
        self.bus.emit(Event::now(
            CONFIGURATION_APPLIED,
            json!({"setting": "volume", "channel": channel, "level": level}),
        ));
    }

    fn set_wifi_enabled(&self, enabled: bool) {
        tracing::info!(enabled, "wifi set");
        self.bus.emit(Event::now(
            CONFIGURATION_APPLIED,
            json!({"setting": "wifi", "enabled": enabled}),
        ));
    }

    fn set_ringer_mode(&self, mode: RingerMode) {
        tracing::info!(?mode, "ringer mode set");
        self.bus.emit(Event::now(
            CONFIGURATION_APPLIED,
            json!({"setting": "ringer_mode", "mode": mode}),
        ));
    }
}

/// What the status display shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    pub title: String,
    pub subtitle: String,
}

/// Status indicator that remembers the last line and publishes changes.
pub struct EventIndicator {
    bus: EventBus,
    current: Mutex<Option<StatusLine>>,
}

impl EventIndicator {
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            current: Mutex::new(None),
        }
    }

    /// The line currently displayed, if any.
    pub fn current(&self) -> Option<StatusLine> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl StatusIndicator for EventIndicator {
    fn show(&self, title: &str, subtitle: &str) {
        let line = StatusLine {
            title: title.to_string(),
            subtitle: subtitle.to_string(),
        };
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(line.clone());
        tracing::info!(title, subtitle, "status");
        self.bus
            .emit(Event::now(STATUS_CHANGED, json!({"status": line})));
    }
}
