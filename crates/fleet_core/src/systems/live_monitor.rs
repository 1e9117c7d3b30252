use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::config::FleetConfig;
use crate::ecs::{FleetRng, LiveMonitor, VitalsWalks};

/// Advances one live-monitoring stream. A tick for a stopped stream does nothing.
pub fn live_monitor_system(
    mut clock: ResMut<SimulationClock>,
    event: Res<CurrentEvent>,
    config: Res<FleetConfig>,
    walks: Res<VitalsWalks>,
    mut rng: ResMut<FleetRng>,
    mut monitors: Query<&mut LiveMonitor>,
) {
    if event.0.kind != EventKind::MonitorTick {
        return;
    }
    let Some(EventSubject::Monitor(entity)) = event.0.subject else {
        return;
    };
    let Ok(mut monitor) = monitors.get_mut(entity) else {
        return;
    };
    let Some(previous) = monitor.latest().copied() else {
        return;
    };

    let reading = walks.live.next(&previous, clock.now(), &mut rng.0);
    monitor.record(reading);

    clock.schedule_in_secs(
        config.live_monitor_tick_secs,
        EventKind::MonitorTick,
        Some(EventSubject::Monitor(entity)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::{Schedule, World};

    use crate::fleet::{PatientId, UnitId};
    use crate::walk::LiveReading;

    fn world() -> World {
        let mut world = World::new();
        world.insert_resource(SimulationClock::default());
        world.insert_resource(FleetConfig::default());
        world.insert_resource(VitalsWalks::default());
        world.insert_resource(FleetRng::seeded(9));
        world
    }

    fn tick(world: &mut World, entity: bevy_ecs::prelude::Entity, at: u64) {
        world.resource_mut::<SimulationClock>().schedule_at(
            at,
            EventKind::MonitorTick,
            Some(EventSubject::Monitor(entity)),
        );
        let event = world
            .resource_mut::<SimulationClock>()
            .pop_next()
            .expect("monitor tick");
        world.insert_resource(CurrentEvent(event));
        let mut schedule = Schedule::default();
        schedule.add_systems(live_monitor_system);
        schedule.run(world);
    }

    #[test]
    fn tick_records_reading_and_reschedules() {
        let mut world = world();
        let first = LiveReading {
            at_ms: 0,
            heart_rate: 85,
            oxygen_saturation: 98.0,
        };
        let entity = world
            .spawn(LiveMonitor::new(PatientId::new("P1"), UnitId(1), first, 20))
            .id();

        tick(&mut world, entity, 3_000);

        let monitor = world.get::<LiveMonitor>(entity).expect("monitor");
        assert_eq!(monitor.readings.len(), 2);
        assert_eq!(monitor.latest().map(|r| r.at_ms), Some(3_000));
        let next = world
            .resource_mut::<SimulationClock>()
            .pop_next()
            .expect("next monitor tick");
        assert_eq!(next.timestamp, 6_000);
        assert_eq!(next.subject, Some(EventSubject::Monitor(entity)));
    }

    #[test]
    fn tick_for_despawned_stream_is_ignored() {
        let mut world = world();
        let first = LiveReading {
            at_ms: 0,
            heart_rate: 85,
            oxygen_saturation: 98.0,
        };
        let entity = world
            .spawn(LiveMonitor::new(PatientId::new("P1"), UnitId(1), first, 20))
            .id();
        world.despawn(entity);

        tick(&mut world, entity, 3_000);

        assert!(world.resource::<SimulationClock>().is_empty());
    }
}
