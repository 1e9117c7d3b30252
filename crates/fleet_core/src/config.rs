//! Simulation constants and the fleet roster.
//!
//! Stage delays, ETA offsets and tick periods are simulation knobs rather than domain
//! truths. Resolve a [FleetConfig] once at startup and hand it to the engine.

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::clock::{ONE_MIN_MS, ONE_SEC_MS};
use crate::error::{FleetError, FleetResult};
use crate::fleet::{GeoPoint, UnitStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct FleetConfig {
    /// Delay from `dispatched` to `arrived_pickup`.
    pub to_pickup_secs: u64,
    /// Delay from `arrived_pickup` to `transporting`.
    pub at_pickup_secs: u64,
    /// Delay from `transporting` to `arrived_destination`.
    pub to_destination_secs: u64,
    /// Delay from `arrived_destination` back to `available`.
    pub at_destination_secs: u64,
    /// ETA shown after dispatch, as minutes from the dispatch instant.
    pub pickup_eta_mins: u64,
    /// ETA shown once transporting, as minutes from the transport start.
    pub destination_eta_mins: u64,
    pub motion_tick_secs: u64,
    /// Largest absolute latitude/longitude offset applied per motion tick (degrees).
    pub motion_jitter_deg: f64,
    pub live_monitor_tick_secs: u64,
    /// Readings retained per live-monitoring stream.
    pub live_history_len: usize,
    /// Completed journeys retained in telemetry; older ones are dropped.
    pub journey_history_len: usize,
    /// Seed for RNG (for reproducibility).
    pub seed: u64,
    /// Unix ms at simulation time 0. `None` uses the wall clock when the fleet is built.
    pub epoch_ms: Option<i64>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            to_pickup_secs: 10,
            at_pickup_secs: 10,
            to_destination_secs: 15,
            at_destination_secs: 10,
            pickup_eta_mins: 10,
            destination_eta_mins: 15,
            motion_tick_secs: 3,
            motion_jitter_deg: 0.0005,
            live_monitor_tick_secs: 3,
            live_history_len: 20,
            journey_history_len: 1_000,
            seed: 0,
            epoch_ms: None,
        }
    }
}

impl FleetConfig {
    pub fn validate(&self) -> FleetResult<()> {
        if self.motion_tick_secs == 0 {
            return Err(FleetError::InvalidConfig(
                "motion_tick_secs must be greater than zero".into(),
            ));
        }
        if self.live_monitor_tick_secs == 0 {
            return Err(FleetError::InvalidConfig(
                "live_monitor_tick_secs must be greater than zero".into(),
            ));
        }
        if self.live_history_len == 0 {
            return Err(FleetError::InvalidConfig(
                "live_history_len must be greater than zero".into(),
            ));
        }
        if self.journey_history_len == 0 {
            return Err(FleetError::InvalidConfig(
                "journey_history_len must be greater than zero".into(),
            ));
        }
        if !self.motion_jitter_deg.is_finite() || self.motion_jitter_deg < 0.0 {
            return Err(FleetError::InvalidConfig(format!(
                "motion_jitter_deg must be a non-negative number, got {}",
                self.motion_jitter_deg
            )));
        }
        Ok(())
    }

    /// Stage timer started on entry to `status`, or `None` if the status has no timer.
    pub fn stage_delay_ms(&self, status: UnitStatus) -> Option<u64> {
        let secs = match status {
            UnitStatus::Available => return None,
            UnitStatus::Dispatched => self.to_pickup_secs,
            UnitStatus::ArrivedPickup => self.at_pickup_secs,
            UnitStatus::Transporting => self.to_destination_secs,
            UnitStatus::ArrivedDestination => self.at_destination_secs,
        };
        Some(secs.saturating_mul(ONE_SEC_MS))
    }

    /// Total time from dispatch until the unit is available again.
    pub fn journey_ms(&self) -> u64 {
        [
            self.to_pickup_secs,
            self.at_pickup_secs,
            self.to_destination_secs,
            self.at_destination_secs,
        ]
        .iter()
        .sum::<u64>()
            * ONE_SEC_MS
    }

    pub fn pickup_eta_ms(&self) -> u64 {
        self.pickup_eta_mins.saturating_mul(ONE_MIN_MS)
    }

    pub fn destination_eta_ms(&self) -> u64 {
        self.destination_eta_mins.saturating_mul(ONE_MIN_MS)
    }
}

/// Identity and starting position for one unit of the roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSeed {
    pub operator_name: String,
    pub location: GeoPoint,
}

impl UnitSeed {
    pub fn new(operator_name: impl Into<String>, location: GeoPoint) -> Self {
        Self {
            operator_name: operator_name.into(),
            location,
        }
    }
}

/// The three reference units, all starting in lower Manhattan.
pub fn default_roster() -> Vec<UnitSeed> {
    vec![
        UnitSeed::new("Dave Driver", GeoPoint::new(40.7128, -74.006)),
        UnitSeed::new("Sarah Smith", GeoPoint::new(40.7148, -74.008)),
        UnitSeed::new("Mike Johnson", GeoPoint::new(40.7138, -74.002)),
    ]
}
