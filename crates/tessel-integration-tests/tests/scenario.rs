//! Integration test: sighting resolution, learning and reassignment.
//!
//! Exercises the engine through the keyed dispatcher, the way the daemon
//! drives it:
//! 1. Unseen cell lands in the default area and its profile is shown
//! 2. A learning session overwrites the cell's area and applies the profile
//! 3. After the session expires the mapping sticks
//! 4. Backward learning claims recently seen cells
//! 5. Deleting an area hands its cells back to the default area
//!
//! Time is simulated with `ManualClock`; nothing sleeps.

use std::time::Duration;

use tessel_db::queries::{areas, cell_log, cells};
use tessel_engine::dispatcher::SightingDispatcher;
use tessel_engine::normalizer::SightingNormalizer;
use tessel_integration_tests::{DeviceWrite, TestRig};
use tessel_types::cell::{CellKey, NetworkType, RawCellLocation};
use tessel_types::command::{Command, LearnWindow};
use tessel_types::profile::{RingerMode, VolumeChannel};
use tessel_types::DEFAULT_AREA_ID;

const HOME: i64 = 1;
const WORK: i64 = 2;
const SILENT_PROFILE: i64 = 2;

fn rig_with_silent_home() -> TestRig {
    let conn = tessel_db::open_memory().expect("open db");
    areas::set_profile(&conn, HOME, Some(SILENT_PROFILE)).expect("bind home");
    TestRig::new(conn)
}

fn dispatcher(rig: &TestRig) -> SightingDispatcher {
    SightingDispatcher::new(
        rig.engine.clone(),
        SightingNormalizer::new(NetworkType::Gsm),
        2,
        16,
    )
}

#[tokio::test]
async fn test_learning_scenario() {
    let rig = rig_with_silent_home();
    let dispatcher = dispatcher(&rig);
    let cell = RawCellLocation::gsm(42);

    // =========================================================
    // Step 1: First sighting of an unseen cell
    // =========================================================
    let first = dispatcher
        .dispatch_and_wait(&cell)
        .await
        .expect("dispatch")
        .expect("signal");
    assert!(first.created);
    assert_eq!(first.area_id, DEFAULT_AREA_ID);
    assert_eq!(
        rig.indicator.last(),
        Some(("Unknown".to_string(), "Normal".to_string()))
    );
    // Normal stores levels without applying them.
    assert!(rig.sink.take().is_empty());

    // =========================================================
    // Step 2: Learn Home for 60 seconds, see the cell again
    // =========================================================
    let command: Command = serde_json::from_value(serde_json::json!({
        "command": "start_learning",
        "target_area_id": HOME,
        "duration_secs": 60,
    }))
    .expect("parse command");
    rig.engine.handle_command(command).await.expect("start learning");

    rig.clock.advance(Duration::from_secs(30));
    let learned = dispatcher
        .dispatch_and_wait(&cell)
        .await
        .expect("dispatch")
        .expect("signal");
    assert_eq!(learned.cell_row_id, first.cell_row_id);
    assert_eq!(learned.area_id, HOME);
    assert!(learned.applied);
    assert_eq!(
        rig.indicator.last(),
        Some(("Home".to_string(), "Silent".to_string()))
    );
    assert_eq!(
        rig.sink.take(),
        vec![
            DeviceWrite::Volume(VolumeChannel::Ring, 0),
            DeviceWrite::Volume(VolumeChannel::Notification, 0),
            DeviceWrite::Ringer(RingerMode::Vibrate),
        ]
    );

    // =========================================================
    // Step 3: 61 seconds in, the session has expired
    // =========================================================
    rig.clock.advance(Duration::from_secs(31));
    let after = dispatcher
        .dispatch_and_wait(&cell)
        .await
        .expect("dispatch")
        .expect("signal");
    assert!(!after.learned);
    assert_eq!(after.area_id, HOME);
    assert!(!after.applied);

    dispatcher.shutdown().await;

    let conn = rig.engine.db().lock().await;
    let key = CellKey::new(42, NetworkType::Gsm);
    assert_eq!(cells::count_for_key(&conn, key).expect("count"), 1);
    assert_eq!(
        cells::find(&conn, key).expect("find").map(|c| c.area_id),
        Some(HOME)
    );
    assert_eq!(cell_log::count(&conn).expect("log"), 3);
}

#[tokio::test]
async fn test_backward_learning_and_area_deletion() {
    let rig = rig_with_silent_home();
    let dispatcher = dispatcher(&rig);

    // A commute: three cells, a minute apart, after an old one.
    dispatcher
        .dispatch_and_wait(&RawCellLocation::gsm(1))
        .await
        .expect("dispatch");
    rig.clock.advance(Duration::from_secs(3600));
    for cell_id in [2, 3, 4] {
        dispatcher
            .dispatch_and_wait(&RawCellLocation::gsm(cell_id))
            .await
            .expect("dispatch");
        rig.clock.advance(Duration::from_secs(60));
    }

    // =========================================================
    // Claim everything seen in the last five minutes for Work
    // =========================================================
    let outcome = rig
        .engine
        .learn_area(WORK, LearnWindow::from_signed_secs(-300))
        .await
        .expect("learn");
    assert_eq!(outcome.cells_reassigned, 3);
    assert_eq!(
        rig.indicator.last(),
        Some(("Work".to_string(), "Silent".to_string()))
    );

    {
        let conn = rig.engine.db().lock().await;
        let work_cells: Vec<i64> = cells::list_by_area(&conn, WORK)
            .expect("list")
            .into_iter()
            .map(|c| c.key.cell_id)
            .collect();
        assert_eq!(work_cells, vec![2, 3, 4]);
    }

    // =========================================================
    // Delete Work: its cells fall back to the default area
    // =========================================================
    {
        let conn = rig.engine.db().lock().await;
        assert_eq!(areas::delete(&conn, WORK).expect("delete"), 3);
        assert_eq!(areas::delete(&conn, DEFAULT_AREA_ID).expect("noop"), 0);
    }
    rig.engine.refresh().await.expect("refresh");
    assert_eq!(
        rig.indicator.last(),
        Some(("Unknown".to_string(), "Normal".to_string()))
    );

    let resolved = dispatcher
        .dispatch_and_wait(&RawCellLocation::gsm(3))
        .await
        .expect("dispatch")
        .expect("signal");
    assert_eq!(resolved.area_id, DEFAULT_AREA_ID);
    dispatcher.shutdown().await;
}

#[tokio::test]
async fn test_lost_signal_is_ignored() {
    let rig = rig_with_silent_home();
    let dispatcher = dispatcher(&rig);

    for raw in [RawCellLocation::no_signal(), RawCellLocation::cdma(77)] {
        let outcome = dispatcher.dispatch_and_wait(&raw).await.expect("dispatch");
        assert!(outcome.is_none());
    }
    dispatcher.shutdown().await;

    let conn = rig.engine.db().lock().await;
    assert_eq!(cell_log::count(&conn).expect("log"), 0);
    assert_eq!(rig.indicator.count(), 0);
    assert_eq!(rig.engine.state().current_area(), None);
}
