//! Telemetry: journey timings and fleet snapshots for subscribers.

use std::collections::{HashMap, VecDeque};

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::fleet::{PatientId, Unit, UnitId, UnitStatus};

/// One journey, recorded from dispatch until the patient is handed over.
/// Timestamps are simulation ms; use the helper methods for derived KPIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JourneyRecord {
    pub unit: UnitId,
    pub patient: PatientId,
    pub dispatched_at: u64,
    pub arrived_pickup_at: Option<u64>,
    pub transport_started_at: Option<u64>,
    pub arrived_destination_at: Option<u64>,
}

impl JourneyRecord {
    pub fn new(unit: UnitId, patient: PatientId, dispatched_at: u64) -> Self {
        Self {
            unit,
            patient,
            dispatched_at,
            arrived_pickup_at: None,
            transport_started_at: None,
            arrived_destination_at: None,
        }
    }

    /// Time from dispatch to arrival at the pickup location.
    pub fn time_to_pickup(&self) -> Option<u64> {
        self.arrived_pickup_at
            .map(|at| at.saturating_sub(self.dispatched_at))
    }

    /// Time the patient spent on board.
    pub fn transport_duration(&self) -> Option<u64> {
        Some(
            self.arrived_destination_at?
                .saturating_sub(self.transport_started_at?),
        )
    }

    pub fn total_duration(&self) -> Option<u64> {
        self.arrived_destination_at
            .map(|at| at.saturating_sub(self.dispatched_at))
    }
}

/// Completed journeys kept when no capacity is configured.
pub const DEFAULT_JOURNEY_CAPACITY: usize = 1_000;

/// Collects journey telemetry. Journeys move to `completed_journeys` on handover;
/// only the most recent `journey_capacity` are kept.
#[derive(Debug, Resource)]
pub struct FleetTelemetry {
    pub in_flight: HashMap<UnitId, JourneyRecord>,
    pub completed_journeys: VecDeque<JourneyRecord>,
    pub events_processed: u64,
    journey_capacity: usize,
}

impl Default for FleetTelemetry {
    fn default() -> Self {
        Self::with_journey_capacity(DEFAULT_JOURNEY_CAPACITY)
    }
}

impl FleetTelemetry {
    pub fn with_journey_capacity(journey_capacity: usize) -> Self {
        Self {
            in_flight: HashMap::new(),
            completed_journeys: VecDeque::new(),
            events_processed: 0,
            journey_capacity: journey_capacity.max(1),
        }
    }

    pub fn journey_capacity(&self) -> usize {
        self.journey_capacity
    }

    pub fn record_dispatch(&mut self, unit: UnitId, patient: PatientId, at: u64) {
        self.in_flight
            .insert(unit, JourneyRecord::new(unit, patient, at));
    }

    /// Stamps the journey of `unit` with the time it entered `status`.
    pub fn record_stage(&mut self, unit: UnitId, status: UnitStatus, at: u64) {
        match status {
            UnitStatus::ArrivedPickup => {
                if let Some(journey) = self.in_flight.get_mut(&unit) {
                    journey.arrived_pickup_at = Some(at);
                }
            }
            UnitStatus::Transporting => {
                if let Some(journey) = self.in_flight.get_mut(&unit) {
                    journey.transport_started_at = Some(at);
                }
            }
            UnitStatus::ArrivedDestination => {
                if let Some(mut journey) = self.in_flight.remove(&unit) {
                    journey.arrived_destination_at = Some(at);
                    if self.completed_journeys.len() == self.journey_capacity {
                        self.completed_journeys.pop_front();
                    }
                    self.completed_journeys.push_back(journey);
                }
            }
            UnitStatus::Available | UnitStatus::Dispatched => {}
        }
    }
}

/// Full fleet state at one simulation instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetSnapshot {
    pub at_ms: u64,
    pub units: Vec<Unit>,
}

impl FleetSnapshot {
    pub fn count_with_status(&self, status: UnitStatus) -> usize {
        self.units
            .iter()
            .filter(|unit| unit.status == status)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn journey_completes_on_arrival_at_destination() {
        let mut telemetry = FleetTelemetry::default();
        telemetry.record_dispatch(UnitId(1), PatientId::new("P1"), 1_000);
        telemetry.record_stage(UnitId(1), UnitStatus::ArrivedPickup, 11_000);
        telemetry.record_stage(UnitId(1), UnitStatus::Transporting, 21_000);
        assert!(telemetry.completed_journeys.is_empty());

        telemetry.record_stage(UnitId(1), UnitStatus::ArrivedDestination, 36_000);
        assert!(telemetry.in_flight.is_empty());
        let record = &telemetry.completed_journeys[0];
        assert_eq!(record.time_to_pickup(), Some(10_000));
        assert_eq!(record.transport_duration(), Some(15_000));
        assert_eq!(record.total_duration(), Some(35_000));
    }

    #[test]
    fn stages_for_unknown_journeys_are_ignored() {
        let mut telemetry = FleetTelemetry::default();
        telemetry.record_stage(UnitId(4), UnitStatus::ArrivedDestination, 5);
        assert!(telemetry.completed_journeys.is_empty());
    }

    #[test]
    fn oldest_completed_journeys_are_dropped_at_capacity() {
        let mut telemetry = FleetTelemetry::with_journey_capacity(2);
        for (n, patient) in ["P1", "P2", "P3"].into_iter().enumerate() {
            let at = n as u64 * 100;
            telemetry.record_dispatch(UnitId(1), PatientId::new(patient), at);
            telemetry.record_stage(UnitId(1), UnitStatus::ArrivedDestination, at + 50);
        }

        let kept: Vec<_> = telemetry
            .completed_journeys
            .iter()
            .map(|journey| journey.patient.clone())
            .collect();
        assert_eq!(kept, vec![PatientId::new("P2"), PatientId::new("P3")]);
    }

    #[test]
    fn zero_capacity_still_keeps_the_latest_journey() {
        let mut telemetry = FleetTelemetry::with_journey_capacity(0);
        assert_eq!(telemetry.journey_capacity(), 1);
        telemetry.record_dispatch(UnitId(2), PatientId::new("P9"), 0);
        telemetry.record_stage(UnitId(2), UnitStatus::ArrivedDestination, 10);
        assert_eq!(telemetry.completed_journeys.len(), 1);
    }
}
