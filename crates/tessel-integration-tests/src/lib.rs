//! Integration test crate for Tessel.
//!
//! The flows under `tests/` drive the engine end to end over a real SQLite
//! database. This library only holds the collaborator doubles they share.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p tessel-integration-tests
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use tessel_engine::applier::{ConfigurationSink, ProfileApplier, StatusIndicator};
use tessel_engine::clock::ManualClock;
use tessel_engine::resolver::Labels;
use tessel_engine::Engine;
use tessel_types::profile::{RingerMode, VolumeChannel};

/// Unix time the simulated clock starts at.
pub const TEST_EPOCH_MS: i64 = 1_700_000_000_000;

/// A device write seen by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceWrite {
    Volume(VolumeChannel, u32),
    Wifi(bool),
    Ringer(RingerMode),
}

/// Configuration sink that records every write.
#[derive(Default)]
pub struct RecordingSink {
    writes: Mutex<Vec<DeviceWrite>>,
}

impl RecordingSink {
    /// Drain the writes recorded so far.
    pub fn take(&self) -> Vec<DeviceWrite> {
        std::mem::take(&mut *self.writes.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn push(&self, write: DeviceWrite) {
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(write);
    }
}

impl ConfigurationSink for RecordingSink {
    fn set_volume(&self, channel: VolumeChannel, level: u32) {
        self.push(DeviceWrite::Volume(channel, level));
    }

    fn set_wifi_enabled(&self, enabled: bool) {
        self.push(DeviceWrite::Wifi(enabled));
    }

    fn set_ringer_mode(&self, mode: RingerMode) {
        self.push(DeviceWrite::Ringer(mode));
    }
}

/// Status indicator that records every line shown.
#[derive(Default)]
pub struct RecordingIndicator {
    shown: Mutex<Vec<(String, String)>>,
}

impl RecordingIndicator {
    pub fn last(&self) -> Option<(String, String)> {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn count(&self) -> usize {
        self.shown.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl StatusIndicator for RecordingIndicator {
    fn show(&self, title: &str, subtitle: &str) {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((title.to_string(), subtitle.to_string()));
    }
}

/// An engine wired to recording doubles and a manual clock.
pub struct TestRig {
    pub engine: Arc<Engine>,
    pub clock: Arc<ManualClock>,
    pub sink: Arc<RecordingSink>,
    pub indicator: Arc<RecordingIndicator>,
}

impl TestRig {
    /// Build a rig over an already opened database.
    pub fn new(conn: rusqlite::Connection) -> Self {
        let clock = Arc::new(ManualClock::new(TEST_EPOCH_MS));
        let sink = Arc::new(RecordingSink::default());
        let indicator = Arc::new(RecordingIndicator::default());
        let engine = Arc::new(Engine::new(
            Arc::new(tokio::sync::Mutex::new(conn)),
            clock.clone(),
            ProfileApplier::new(sink.clone(), indicator.clone()),
            Labels::default(),
        ));
        Self {
            engine,
            clock,
            sink,
            indicator,
        }
    }
}
