mod support;

use std::sync::Arc;
use std::thread;

use fleet_core::config::{FleetConfig, UnitSeed};
use fleet_core::error::FleetError;
use fleet_core::fleet::{GeoPoint, UnitId, UnitStatus};
use fleet_core::test_helpers::test_pickup;

use support::world::TestFleetBuilder;

#[test]
fn fourth_dispatch_finds_no_capacity() {
    let engine = TestFleetBuilder::new().build_engine();
    for (patient, expected) in [("P1", 1), ("P2", 2), ("P3", 3)] {
        let unit = engine
            .dispatch_patient(patient, test_pickup())
            .expect("dispatch");
        assert_eq!(unit.id, UnitId(expected));
    }

    let before = engine.list();
    let timers = engine.pending_timers();
    assert_eq!(
        engine.dispatch_patient("P4", test_pickup()),
        Err(FleetError::NoCapacity)
    );
    assert_eq!(engine.list(), before);
    assert_eq!(engine.pending_timers(), timers);
}

#[test]
fn freed_unit_takes_the_next_call() {
    let engine = TestFleetBuilder::new().build_engine();
    for patient in ["P1", "P2", "P3"] {
        engine.dispatch_patient(patient, test_pickup()).expect("dispatch");
    }
    engine.advance_to(45_000);

    let unit = engine.dispatch_patient("P4", test_pickup()).expect("dispatch");
    assert_eq!(unit.id, UnitId(1));
    assert_eq!(unit.eta_display.as_deref(), Some("00:10:45"));
}

#[test]
fn empty_roster_never_dispatches() {
    let engine = TestFleetBuilder::new().with_roster(Vec::new()).build_engine();
    assert_eq!(
        engine.dispatch_patient("P1", test_pickup()),
        Err(FleetError::NoCapacity)
    );
}

#[test]
fn concurrent_dispatches_never_double_assign() {
    let roster: Vec<_> = (0..8)
        .map(|i| UnitSeed::new(format!("Operator {i}"), GeoPoint::new(40.7, -74.0)))
        .collect();
    let engine = Arc::new(TestFleetBuilder::new().with_roster(roster).build_engine());

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..12)
            .map(|i| {
                let engine = Arc::clone(&engine);
                scope.spawn(move || engine.dispatch_patient(format!("P{i}"), test_pickup()))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("dispatch thread"))
            .collect()
    });

    let claimed: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    let refused = results
        .iter()
        .filter(|r| matches!(r, Err(FleetError::NoCapacity)))
        .count();
    assert_eq!(claimed.len(), 8);
    assert_eq!(refused, 4);

    let mut ids: Vec<_> = claimed.iter().map(|u| u.id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 8);
    assert!(engine
        .list()
        .iter()
        .all(|u| u.status == UnitStatus::Dispatched && u.is_consistent()));
}

#[test]
fn custom_stage_delays_drive_the_lifecycle() {
    let engine = TestFleetBuilder::new()
        .configure(|config: &mut FleetConfig| {
            config.to_pickup_secs = 1;
            config.at_pickup_secs = 1;
            config.to_destination_secs = 1;
            config.at_destination_secs = 1;
        })
        .build_engine();
    engine.dispatch_patient("P1", test_pickup()).expect("dispatch");

    engine.advance_by(2_000);
    assert_eq!(
        engine.get(UnitId(1)).map(|u| u.status),
        Some(UnitStatus::Transporting)
    );
    engine.advance_by(2_000);
    assert_eq!(
        engine.get(UnitId(1)).map(|u| u.status),
        Some(UnitStatus::Available)
    );
}
