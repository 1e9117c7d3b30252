//! Live-monitoring streams: opt-in, per-patient vitals walks that tick faster than the
//! fleet motion tick and are started and stopped independently of it.
//!
//! Each stream is an entity carrying a [LiveMonitor]; stopping despawns it, which turns
//! its pending tick into a no-op.

use bevy_ecs::prelude::World;
use tracing::debug;

use crate::clock::{EventKind, EventSubject, SimulationClock};
use crate::config::FleetConfig;
use crate::ecs::{FleetRegistry, LiveMonitor, MonitorIndex, VitalsWalks};
use crate::error::{FleetError, FleetResult};
use crate::fleet::PatientId;
use crate::query::unit_for_patient;
use crate::vitals::VitalsSnapshot;
use crate::walk::LiveReading;

/// Starts a stream for `patient`, seeded from the vitals on their unit.
///
/// Starting an active stream leaves it running and returns its latest reading.
pub fn start_monitoring(world: &mut World, patient: &PatientId) -> FleetResult<LiveReading> {
    if let Some(latest) = active_monitor(world, patient).and_then(|m| m.latest().copied()) {
        return Ok(latest);
    }

    let registry = world.resource::<FleetRegistry>().0.clone();
    let unit = unit_for_patient(&registry, patient)
        .ok_or_else(|| FleetError::PatientNotFound(patient.clone()))?;
    let vitals = unit.vitals.unwrap_or_else(VitalsSnapshot::baseline);

    let now = world.resource::<SimulationClock>().now();
    let (period, capacity) = {
        let config = world.resource::<FleetConfig>();
        (config.live_monitor_tick_secs, config.live_history_len)
    };
    let first = world.resource::<VitalsWalks>().live.seed(&vitals, now);

    let entity = world
        .spawn(LiveMonitor::new(patient.clone(), unit.id, first, capacity))
        .id();
    world
        .resource_mut::<MonitorIndex>()
        .0
        .insert(patient.clone(), entity);
    world.resource_mut::<SimulationClock>().schedule_in_secs(
        period,
        EventKind::MonitorTick,
        Some(EventSubject::Monitor(entity)),
    );

    debug!(%patient, unit = %unit.id, "live monitoring started");
    Ok(first)
}

/// Stops the stream for `patient`. Returns `false` if none was running.
pub fn stop_monitoring(world: &mut World, patient: &PatientId) -> bool {
    let Some(entity) = world.resource_mut::<MonitorIndex>().0.remove(patient) else {
        return false;
    };
    let despawned = world.despawn(entity);
    debug!(%patient, "live monitoring stopped");
    despawned
}

/// Stops every stream.
pub fn stop_all_monitoring(world: &mut World) {
    let entities: Vec<_> = world
        .resource_mut::<MonitorIndex>()
        .0
        .drain()
        .map(|(_, entity)| entity)
        .collect();
    for entity in entities {
        world.despawn(entity);
    }
}

/// Recorded readings for `patient`, oldest first.
pub fn monitor_readings(world: &World, patient: &PatientId) -> Option<Vec<LiveReading>> {
    active_monitor(world, patient).map(|monitor| monitor.readings.iter().copied().collect())
}

pub fn monitored_patients(world: &World) -> Vec<PatientId> {
    let mut patients: Vec<_> = world.resource::<MonitorIndex>().0.keys().cloned().collect();
    patients.sort();
    patients
}

fn active_monitor<'w>(world: &'w World, patient: &PatientId) -> Option<&'w LiveMonitor> {
    let entity = *world.resource::<MonitorIndex>().0.get(patient)?;
    world.get::<LiveMonitor>(entity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_roster;
    use crate::dispatch::dispatch_unit;
    use crate::fleet::{DispatchRequest, GeoPoint};
    use crate::runner::{fleet_schedule, run_until};
    use crate::scenario::build_fleet;

    fn world_with_patient(patient: &str) -> World {
        let mut world = World::new();
        let config = FleetConfig {
            epoch_ms: Some(0),
            ..FleetConfig::default()
        };
        build_fleet(&mut world, &config, &default_roster());
        dispatch_unit(&mut world, DispatchRequest::new(patient, GeoPoint::default()))
            .expect("dispatch");
        world
    }

    #[test]
    fn start_seeds_from_unit_vitals() {
        let mut world = world_with_patient("P1");
        let first = start_monitoring(&mut world, &PatientId::new("P1")).expect("start");
        assert_eq!(first.heart_rate, 85);
        assert_eq!(first.oxygen_saturation, 98.0);
        assert_eq!(monitored_patients(&world), vec![PatientId::new("P1")]);
    }

    #[test]
    fn start_is_idempotent() {
        let mut world = world_with_patient("P1");
        let patient = PatientId::new("P1");
        start_monitoring(&mut world, &patient).expect("start");
        start_monitoring(&mut world, &patient).expect("start again");

        let clock = world.resource::<SimulationClock>();
        assert_eq!(clock.pending_for(EventKind::MonitorTick), 1);
    }

    #[test]
    fn unknown_patient_cannot_be_monitored() {
        let mut world = world_with_patient("P1");
        let err = start_monitoring(&mut world, &PatientId::new("nobody")).expect_err("unknown");
        assert_eq!(err, FleetError::PatientNotFound(PatientId::new("nobody")));
    }

    #[test]
    fn stream_accumulates_readings_until_stopped() {
        let mut world = world_with_patient("P1");
        let patient = PatientId::new("P1");
        start_monitoring(&mut world, &patient).expect("start");

        let mut schedule = fleet_schedule();
        run_until(&mut world, &mut schedule, 9_000);
        let readings = monitor_readings(&world, &patient).expect("readings");
        let times: Vec<_> = readings.iter().map(|r| r.at_ms).collect();
        assert_eq!(times, vec![0, 3_000, 6_000, 9_000]);

        assert!(stop_monitoring(&mut world, &patient));
        assert!(!stop_monitoring(&mut world, &patient));
        assert!(monitor_readings(&world, &patient).is_none());

        run_until(&mut world, &mut schedule, 20_000);
        assert_eq!(
            world
                .resource::<SimulationClock>()
                .pending_for(EventKind::MonitorTick),
            0
        );
    }

    #[test]
    fn stopping_one_stream_leaves_others_running() {
        let mut world = world_with_patient("P1");
        dispatch_unit(&mut world, DispatchRequest::new("P2", GeoPoint::default()))
            .expect("dispatch");
        start_monitoring(&mut world, &PatientId::new("P1")).expect("start P1");
        start_monitoring(&mut world, &PatientId::new("P2")).expect("start P2");

        assert!(stop_monitoring(&mut world, &PatientId::new("P1")));

        let mut schedule = fleet_schedule();
        run_until(&mut world, &mut schedule, 6_000);
        let readings = monitor_readings(&world, &PatientId::new("P2")).expect("P2 stream");
        assert_eq!(readings.len(), 3);
        assert_eq!(
            world
                .resource::<SimulationClock>()
                .pending_for(EventKind::MotionTick),
            1
        );
    }
}
