//! Integration test: concurrent sightings.
//!
//! 1. Many producers reporting the same unseen cell create exactly one row
//! 2. Interleaved sightings of two areas leave the status on the area of
//!    the last sighting started, never on a stale one
//! 3. Learning commands racing with sightings never corrupt the mapping
//! 4. Refreshes racing with a pending sighting never swallow its area change
//! 5. Deleting the learning target mid-session keeps sightings flowing

use std::sync::Arc;
use std::time::Duration;

use tessel_db::queries::{areas, cell_log, cells};
use tessel_engine::dispatcher::SightingDispatcher;
use tessel_engine::normalizer::SightingNormalizer;
use tessel_integration_tests::TestRig;
use tessel_types::cell::{CellKey, NetworkType, RawCellLocation};
use tessel_types::DEFAULT_AREA_ID;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_cell_from_many_producers() {
    let rig = TestRig::new(tessel_db::open_memory().expect("open db"));
    let dispatcher = Arc::new(SightingDispatcher::new(
        rig.engine.clone(),
        SightingNormalizer::new(NetworkType::Gsm),
        4,
        8,
    ));

    let mut producers = Vec::new();
    for _ in 0..8 {
        let dispatcher = dispatcher.clone();
        producers.push(tokio::spawn(async move {
            for _ in 0..25 {
                dispatcher
                    .dispatch(&RawCellLocation::gsm(7))
                    .await
                    .expect("dispatch");
            }
        }));
    }
    for producer in producers {
        producer.await.expect("producer");
    }
    dispatcher.shutdown().await;

    let conn = rig.engine.db().lock().await;
    let key = CellKey::new(7, NetworkType::Gsm);
    assert_eq!(cells::count_for_key(&conn, key).expect("count"), 1);
    assert_eq!(cell_log::count(&conn).expect("log"), 200);
    // One area change only: none -> default.
    assert_eq!(rig.indicator.count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_status_follows_last_started_sighting() {
    let conn = tessel_db::open_memory().expect("open db");
    cells::resolve_or_create(&conn, CellKey::new(100, NetworkType::Gsm), Some(1))
        .expect("home cell");
    cells::resolve_or_create(&conn, CellKey::new(200, NetworkType::Gsm), Some(2))
        .expect("work cell");
    let rig = TestRig::new(conn);
    let dispatcher = SightingDispatcher::new(
        rig.engine.clone(),
        SightingNormalizer::new(NetworkType::Gsm),
        4,
        64,
    );

    for _ in 0..50 {
        dispatcher
            .dispatch(&RawCellLocation::gsm(100))
            .await
            .expect("dispatch");
        dispatcher
            .dispatch(&RawCellLocation::gsm(200))
            .await
            .expect("dispatch");
    }
    dispatcher.shutdown().await;

    assert_eq!(rig.engine.state().current_area(), Some(2));
    assert_eq!(
        rig.indicator.last(),
        Some(("Work".to_string(), "Silent".to_string()))
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_learning_races_with_sightings() {
    let rig = TestRig::new(tessel_db::open_memory().expect("open db"));
    let dispatcher = SightingDispatcher::new(
        rig.engine.clone(),
        SightingNormalizer::new(NetworkType::Gsm),
        4,
        16,
    );

    let engine = rig.engine.clone();
    let learner = tokio::spawn(async move {
        for target in [1, 2, 1, 2] {
            engine
                .start_learning(target, Duration::from_secs(60))
                .await
                .expect("learn");
            tokio::task::yield_now().await;
        }
    });
    for cell_id in 0..40 {
        dispatcher
            .dispatch(&RawCellLocation::gsm(cell_id % 5))
            .await
            .expect("dispatch");
    }
    learner.await.expect("learner");
    dispatcher.shutdown().await;

    let conn = rig.engine.db().lock().await;
    for cell_id in 0..5 {
        let key = CellKey::new(cell_id, NetworkType::Gsm);
        assert_eq!(cells::count_for_key(&conn, key).expect("count"), 1);
        let area = cells::find(&conn, key).expect("find").map(|c| c.area_id);
        assert!(matches!(area, Some(0..=2)), "cell {cell_id} in {area:?}");
    }
    assert_eq!(cell_log::count(&conn).expect("log"), 40);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_refresh_races_pending_sighting() {
    let conn = tessel_db::open_memory().expect("open db");
    cells::resolve_or_create(&conn, CellKey::new(100, NetworkType::Gsm), Some(1))
        .expect("home cell");
    cells::resolve_or_create(&conn, CellKey::new(200, NetworkType::Gsm), Some(2))
        .expect("work cell");
    let rig = TestRig::new(conn);
    let dispatcher = SightingDispatcher::new(
        rig.engine.clone(),
        SightingNormalizer::new(NetworkType::Gsm),
        4,
        16,
    );
    dispatcher
        .dispatch_and_wait(&RawCellLocation::gsm(100))
        .await
        .expect("dispatch");

    let engine = rig.engine.clone();
    let refresher = tokio::spawn(async move {
        for _ in 0..50 {
            engine.refresh().await.expect("refresh");
            tokio::task::yield_now().await;
        }
    });
    dispatcher
        .dispatch(&RawCellLocation::gsm(200))
        .await
        .expect("dispatch");
    refresher.await.expect("refresher");
    dispatcher.shutdown().await;

    assert_eq!(rig.engine.state().current_area(), Some(2));
    assert_eq!(
        rig.indicator.last(),
        Some(("Work".to_string(), "Silent".to_string()))
    );
    let resolution = rig.engine.refresh().await.expect("refresh");
    assert_eq!(resolution.area_id, Some(2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_learning_target_deleted_mid_session() {
    let conn = tessel_db::open_memory().expect("open db");
    let gym = areas::insert(&conn, "Gym").expect("gym");
    let rig = TestRig::new(conn);
    let dispatcher = SightingDispatcher::new(
        rig.engine.clone(),
        SightingNormalizer::new(NetworkType::Gsm),
        4,
        16,
    );
    rig.engine
        .start_learning(gym, Duration::from_secs(3600))
        .await
        .expect("learn");

    let engine = rig.engine.clone();
    let deleter = tokio::spawn(async move {
        tokio::task::yield_now().await;
        engine.delete_area(gym).await.expect("delete");
    });
    for cell_id in 0..20 {
        dispatcher
            .dispatch(&RawCellLocation::gsm(cell_id))
            .await
            .expect("dispatch");
    }
    deleter.await.expect("deleter");
    for cell_id in 20..25 {
        let outcome = dispatcher
            .dispatch_and_wait(&RawCellLocation::gsm(cell_id))
            .await
            .expect("dispatch")
            .expect("signal");
        assert_eq!(outcome.area_id, DEFAULT_AREA_ID);
    }
    dispatcher.shutdown().await;

    let conn = rig.engine.db().lock().await;
    assert_eq!(cell_log::count(&conn).expect("log"), 25);
    assert!(cells::list_by_area(&conn, gym).expect("list").is_empty());
    assert_eq!(rig.engine.state().learning_session(), None);
}
