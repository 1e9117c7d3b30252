//! Shared setup for unit and integration tests.

use bevy_ecs::prelude::World;

use crate::config::{default_roster, FleetConfig};
use crate::engine::FleetEngine;
use crate::fleet::GeoPoint;
use crate::scenario::build_fleet;

/// Seed used by every test fixture.
pub const TEST_SEED: u64 = 42;

/// Pickup location inside the default roster's neighbourhood.
pub fn test_pickup() -> GeoPoint {
    GeoPoint::new(40.7130, -74.0050)
}

/// Default timings with a fixed seed and an epoch of 0, so ETA strings are stable.
pub fn test_config() -> FleetConfig {
    FleetConfig {
        seed: TEST_SEED,
        epoch_ms: Some(0),
        ..FleetConfig::default()
    }
}

/// World holding the default three-unit roster and every resource the schedule needs.
pub fn create_test_world() -> World {
    let mut world = World::new();
    build_fleet(&mut world, &test_config(), &default_roster());
    world
}

/// Manually paced engine over the default roster.
///
/// # Panics
///
/// Panics if [test_config] fails validation (should never happen).
pub fn create_test_engine() -> FleetEngine {
    FleetEngine::new(test_config(), &default_roster()).expect("test config is valid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SimulationClock;

    #[test]
    fn test_config_is_valid() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_world_starts_at_zero() {
        let world = create_test_world();
        assert_eq!(world.resource::<SimulationClock>().now(), 0);
        assert_eq!(create_test_engine().list().len(), 3);
    }
}
