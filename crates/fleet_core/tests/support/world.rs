#![allow(dead_code)]

use std::sync::Arc;

use bevy_ecs::prelude::World;
use fleet_core::config::{default_roster, FleetConfig, UnitSeed};
use fleet_core::engine::FleetEngine;
use fleet_core::registry::UnitRegistry;
use fleet_core::scenario::build_fleet;
use fleet_core::test_helpers::test_config;

/// Builder for reproducible fleet worlds and engines.
#[derive(Debug, Clone)]
pub struct TestFleetBuilder {
    config: FleetConfig,
    roster: Vec<UnitSeed>,
}

impl Default for TestFleetBuilder {
    fn default() -> Self {
        Self {
            config: test_config(),
            roster: default_roster(),
        }
    }
}

impl TestFleetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn with_roster(mut self, roster: Vec<UnitSeed>) -> Self {
        self.roster = roster;
        self
    }

    /// Apply an arbitrary tweak to the fleet configuration.
    pub fn configure(mut self, tweak: impl FnOnce(&mut FleetConfig)) -> Self {
        tweak(&mut self.config);
        self
    }

    /// Build the ECS world; also returns the shared registry handle.
    pub fn build(self) -> (World, Arc<UnitRegistry>) {
        let mut world = World::new();
        let registry = build_fleet(&mut world, &self.config, &self.roster);
        (world, registry)
    }

    /// Build a manually paced engine.
    pub fn build_engine(self) -> FleetEngine {
        FleetEngine::new(self.config, &self.roster).expect("valid test config")
    }
}
