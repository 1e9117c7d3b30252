use std::sync::Arc;

use bevy_ecs::prelude::World;
use chrono::Utc;
use tracing::info;

use crate::clock::{EventKind, SimulationClock};
use crate::config::{FleetConfig, UnitSeed};
use crate::ecs::{FleetRegistry, FleetRng, MonitorIndex, VitalsWalks};
use crate::registry::UnitRegistry;
use crate::telemetry::FleetTelemetry;

/// Populates `world` with every resource the fleet schedule needs and starts the motion tick.
/// Returns the shared registry handle.
pub fn build_fleet(
    world: &mut World,
    config: &FleetConfig,
    roster: &[UnitSeed],
) -> Arc<UnitRegistry> {
    let registry = Arc::new(UnitRegistry::from_roster(roster));
    let epoch_ms = config
        .epoch_ms
        .unwrap_or_else(|| Utc::now().timestamp_millis());

    let mut clock = SimulationClock::with_epoch(epoch_ms);
    clock.schedule_in_secs(config.motion_tick_secs, EventKind::MotionTick, None);

    world.insert_resource(clock);
    world.insert_resource(FleetRegistry(Arc::clone(&registry)));
    world.insert_resource(config.clone());
    world.insert_resource(FleetTelemetry::with_journey_capacity(config.journey_history_len));
    world.insert_resource(VitalsWalks::default());
    world.insert_resource(FleetRng::seeded(config.seed));
    world.insert_resource(MonitorIndex::default());

    info!(units = registry.len(), seed = config.seed, "fleet built");
    registry
}
