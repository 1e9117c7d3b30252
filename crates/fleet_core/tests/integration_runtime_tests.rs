use std::sync::Arc;
use std::time::Duration;

use fleet_core::config::default_roster;
use fleet_core::engine::FleetEngine;
use fleet_core::fleet::{PatientId, UnitId, UnitStatus};
use fleet_core::runtime::FleetRuntime;
use fleet_core::test_helpers::{test_config, test_pickup};

fn wall_clock_engine() -> Arc<FleetEngine> {
    Arc::new(FleetEngine::with_wall_clock(test_config(), &default_roster()).expect("engine"))
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_stage_changes_as_they_happen() {
    let engine = wall_clock_engine();
    let runtime = FleetRuntime::spawn(Arc::clone(&engine)).expect("runtime");
    let mut updates = engine.subscribe();

    engine.dispatch_patient("P1", test_pickup()).expect("dispatch");

    let mut seen = Vec::new();
    while seen.last() != Some(&UnitStatus::Available) {
        updates.changed().await.expect("engine alive");
        let status = updates
            .borrow_and_update()
            .units
            .iter()
            .find(|u| u.id == UnitId(1))
            .map(|u| u.status)
            .expect("unit 1");
        if seen.last() != Some(&status) {
            seen.push(status);
        }
    }

    assert_eq!(
        seen,
        vec![
            UnitStatus::Dispatched,
            UnitStatus::ArrivedPickup,
            UnitStatus::Transporting,
            UnitStatus::ArrivedDestination,
            UnitStatus::Available,
        ]
    );
    assert_eq!(engine.now_ms(), 45_000);
    runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn dispatch_after_idle_time_is_timed_from_the_present() {
    let engine = wall_clock_engine();
    let runtime = FleetRuntime::spawn(Arc::clone(&engine)).expect("runtime");

    tokio::time::sleep(Duration::from_secs(100)).await;
    let unit = engine.dispatch_patient("P1", test_pickup()).expect("dispatch");
    assert_eq!(unit.eta_display.as_deref(), Some("00:11:40"));

    tokio::time::sleep(Duration::from_millis(9_500)).await;
    assert_eq!(
        engine.get(UnitId(1)).map(|u| u.status),
        Some(UnitStatus::Dispatched)
    );
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    assert_eq!(
        engine.get(UnitId(1)).map(|u| u.status),
        Some(UnitStatus::ArrivedPickup)
    );

    runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn live_stream_ticks_in_real_time() {
    let engine = wall_clock_engine();
    let runtime = FleetRuntime::spawn(Arc::clone(&engine)).expect("runtime");
    engine.dispatch_patient("P1", test_pickup()).expect("dispatch");
    let patient = PatientId::new("P1");
    engine.start_monitoring(&patient).expect("start");

    tokio::time::sleep(Duration::from_millis(9_500)).await;
    let readings = engine.monitor_readings(&patient).expect("readings");
    let times: Vec<_> = readings.iter().map(|r| r.at_ms).collect();
    assert_eq!(times, vec![0, 3_000, 6_000, 9_000]);

    runtime.shutdown().await;
    assert!(engine.monitored_patients().is_empty());
}
