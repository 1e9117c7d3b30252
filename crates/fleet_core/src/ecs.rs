use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use bevy_ecs::prelude::{Component, Entity, Resource};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::fleet::{PatientId, UnitId};
use crate::registry::UnitRegistry;
use crate::walk::{FleetVitalsWalk, LiveReading, LiveVitalsWalk};

/// Shared handle to the unit table. Systems write through it; readers bypass the world.
#[derive(Debug, Clone, Resource)]
pub struct FleetRegistry(pub Arc<UnitRegistry>);

/// Single seeded source for every random draw in the simulation.
#[derive(Debug, Resource)]
pub struct FleetRng(pub StdRng);

impl FleetRng {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

#[derive(Debug, Clone, Copy, Default, Resource)]
pub struct VitalsWalks {
    pub fleet: FleetVitalsWalk,
    pub live: LiveVitalsWalk,
}

/// One live-monitoring stream. Despawning the entity stops the stream.
#[derive(Debug, Clone, Component)]
pub struct LiveMonitor {
    pub patient: PatientId,
    /// Unit carrying the patient when the stream started.
    pub unit: UnitId,
    /// Most recent readings, oldest first.
    pub readings: VecDeque<LiveReading>,
    pub capacity: usize,
}

impl LiveMonitor {
    pub fn new(patient: PatientId, unit: UnitId, first: LiveReading, capacity: usize) -> Self {
        let mut readings = VecDeque::with_capacity(capacity);
        readings.push_back(first);
        Self {
            patient,
            unit,
            readings,
            capacity: capacity.max(1),
        }
    }

    pub fn latest(&self) -> Option<&LiveReading> {
        self.readings.back()
    }

    pub fn record(&mut self, reading: LiveReading) {
        while self.readings.len() >= self.capacity {
            self.readings.pop_front();
        }
        self.readings.push_back(reading);
    }
}

/// Active live-monitoring streams keyed by patient.
#[derive(Debug, Default, Resource)]
pub struct MonitorIndex(pub HashMap<PatientId, Entity>);
