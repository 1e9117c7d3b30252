//! Fleet data model: units, their lifecycle status, and per-unit state transitions.
//!
//! Every transition is a pure function from the current [Unit] to the next one.
//! Callers never mutate a unit in place; the registry swaps whole values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FleetError, FleetResult};
use crate::vitals::VitalsSnapshot;

/// Stable unit identifier, rendered as `amb-N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "amb-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unit id must look like \"amb-N\", got {0:?}")]
pub struct ParseUnitIdError(String);

impl FromStr for UnitId {
    type Err = ParseUnitIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("amb-")
            .and_then(|n| n.parse().ok())
            .map(UnitId)
            .ok_or_else(|| ParseUnitIdError(s.to_string()))
    }
}

impl From<UnitId> for String {
    fn from(id: UnitId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for UnitId {
    type Error = ParseUnitIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Opaque patient key supplied by the session collaborator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(pub String);

impl PatientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PatientId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn offset(self, d_lat: f64, d_lng: f64) -> Self {
        Self {
            latitude: self.latitude + d_lat,
            longitude: self.longitude + d_lng,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    Available,
    Dispatched,
    ArrivedPickup,
    Transporting,
    ArrivedDestination,
}

impl UnitStatus {
    /// Successor reached by a stage timer. `Available` only leaves via dispatch.
    pub fn next(self) -> Option<UnitStatus> {
        match self {
            UnitStatus::Available => None,
            UnitStatus::Dispatched => Some(UnitStatus::ArrivedPickup),
            UnitStatus::ArrivedPickup => Some(UnitStatus::Transporting),
            UnitStatus::Transporting => Some(UnitStatus::ArrivedDestination),
            UnitStatus::ArrivedDestination => Some(UnitStatus::Available),
        }
    }

    /// Units that the motion tick moves.
    pub fn is_in_motion(self) -> bool {
        matches!(self, UnitStatus::Dispatched | UnitStatus::Transporting)
    }

    /// States in which a patient (and their vitals) is attached to the unit.
    pub fn carries_patient(self) -> bool {
        matches!(
            self,
            UnitStatus::Dispatched | UnitStatus::ArrivedPickup | UnitStatus::Transporting
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UnitStatus::Available => "available",
            UnitStatus::Dispatched => "dispatched",
            UnitStatus::ArrivedPickup => "arrived_pickup",
            UnitStatus::Transporting => "transporting",
            UnitStatus::ArrivedDestination => "arrived_destination",
        }
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One emergency vehicle. Values are snapshots; the registry owns the current one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub operator_name: String,
    pub location: GeoPoint,
    pub status: UnitStatus,
    pub eta_display: Option<String>,
    pub assigned_patient: Option<PatientId>,
    pub vitals: Option<VitalsSnapshot>,
}

impl Unit {
    pub fn new(id: UnitId, operator_name: impl Into<String>, location: GeoPoint) -> Self {
        Self {
            id,
            operator_name: operator_name.into(),
            location,
            status: UnitStatus::Available,
            eta_display: None,
            assigned_patient: None,
            vitals: None,
        }
    }

    /// `vitals` present iff a patient is assigned iff the status carries a patient.
    pub fn is_consistent(&self) -> bool {
        let carries = self.status.carries_patient();
        self.vitals.is_some() == carries && self.assigned_patient.is_some() == carries
    }

    fn invalid(&self, operation: &'static str) -> FleetError {
        FleetError::InvalidTransition {
            unit: self.id,
            status: self.status,
            operation,
        }
    }

    /// `available -> dispatched`, attaching the patient with a baseline snapshot.
    pub fn dispatched(
        &self,
        patient: PatientId,
        vitals: VitalsSnapshot,
        eta_display: String,
    ) -> FleetResult<Unit> {
        if self.status != UnitStatus::Available {
            return Err(self.invalid("be dispatched"));
        }
        Ok(Unit {
            status: UnitStatus::Dispatched,
            eta_display: Some(eta_display),
            assigned_patient: Some(patient),
            vitals: Some(vitals),
            ..self.clone()
        })
    }

    /// Applies the stage transition out of `from`, provided the unit is still there.
    ///
    /// `eta_display` is only consulted when entering `transporting`.
    pub fn advanced(&self, from: UnitStatus, eta_display: Option<String>) -> FleetResult<Unit> {
        let Some(to) = from.next() else {
            return Err(self.invalid("advance without a stage timer"));
        };
        if self.status != from {
            return Err(self.invalid("advance from a stale stage"));
        }

        let mut next = Unit {
            status: to,
            ..self.clone()
        };
        match to {
            UnitStatus::Transporting => next.eta_display = eta_display,
            UnitStatus::ArrivedDestination => {
                next.assigned_patient = None;
                next.vitals = None;
            }
            UnitStatus::Available => next.eta_display = None,
            UnitStatus::Dispatched | UnitStatus::ArrivedPickup => {}
        }
        Ok(next)
    }

    /// Motion-tick update. Units that are not in motion come back unchanged.
    pub fn nudged(&self, location: GeoPoint, vitals: Option<VitalsSnapshot>) -> Unit {
        if !self.status.is_in_motion() {
            return self.clone();
        }
        Unit {
            location,
            vitals: vitals.or_else(|| self.vitals.clone()),
            ..self.clone()
        }
    }

    /// Overwrites the vitals of a unit that currently carries a patient.
    pub fn with_vitals(&self, vitals: VitalsSnapshot) -> FleetResult<Unit> {
        if self.assigned_patient.is_none() {
            return Err(self.invalid("record vitals without an assigned patient"));
        }
        Ok(Unit {
            vitals: Some(vitals),
            ..self.clone()
        })
    }
}

/// Pickup request consumed by dispatch; never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub patient_id: PatientId,
    pub pickup: GeoPoint,
}

impl DispatchRequest {
    pub fn new(patient_id: impl Into<String>, pickup: GeoPoint) -> Self {
        Self {
            patient_id: PatientId::new(patient_id),
            pickup,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> Unit {
        Unit::new(UnitId(1), "Dave Driver", GeoPoint::new(40.7128, -74.006))
    }

    #[test]
    fn unit_id_renders_and_parses() {
        assert_eq!(UnitId(7).to_string(), "amb-7");
        assert_eq!("amb-12".parse::<UnitId>(), Ok(UnitId(12)));
        assert!("truck-1".parse::<UnitId>().is_err());
        assert!("amb-x".parse::<UnitId>().is_err());
    }

    #[test]
    fn status_successors_form_a_single_cycle() {
        let mut status = UnitStatus::Dispatched;
        let mut visited = vec![status];
        while let Some(next) = status.next() {
            visited.push(next);
            status = next;
        }
        assert_eq!(
            visited,
            vec![
                UnitStatus::Dispatched,
                UnitStatus::ArrivedPickup,
                UnitStatus::Transporting,
                UnitStatus::ArrivedDestination,
                UnitStatus::Available,
            ]
        );
    }

    #[test]
    fn full_journey_keeps_patient_invariant() {
        let start = unit();
        assert!(start.is_consistent());

        let dispatched = start
            .dispatched(PatientId::new("P1"), VitalsSnapshot::baseline(), "12:10:00".into())
            .expect("dispatch");
        assert!(dispatched.is_consistent());
        assert_eq!(dispatched.eta_display.as_deref(), Some("12:10:00"));

        let at_pickup = dispatched
            .advanced(UnitStatus::Dispatched, None)
            .expect("arrive pickup");
        assert_eq!(at_pickup.eta_display.as_deref(), Some("12:10:00"));

        let transporting = at_pickup
            .advanced(UnitStatus::ArrivedPickup, Some("12:25:00".into()))
            .expect("transport");
        assert_eq!(transporting.eta_display.as_deref(), Some("12:25:00"));
        assert!(transporting.is_consistent());

        let at_destination = transporting
            .advanced(UnitStatus::Transporting, None)
            .expect("arrive destination");
        assert_eq!(at_destination.assigned_patient, None);
        assert_eq!(at_destination.vitals, None);
        assert!(at_destination.is_consistent());

        let available = at_destination
            .advanced(UnitStatus::ArrivedDestination, None)
            .expect("available");
        assert_eq!(available.status, UnitStatus::Available);
        assert_eq!(available.eta_display, None);
        assert!(available.is_consistent());
    }

    #[test]
    fn stale_stage_is_rejected() {
        let dispatched = unit()
            .dispatched(PatientId::new("P1"), VitalsSnapshot::baseline(), "eta".into())
            .expect("dispatch");
        let err = dispatched
            .advanced(UnitStatus::Transporting, None)
            .expect_err("stale stage");
        assert!(matches!(
            err,
            FleetError::InvalidTransition {
                status: UnitStatus::Dispatched,
                ..
            }
        ));
    }

    #[test]
    fn only_available_units_can_be_dispatched() {
        let dispatched = unit()
            .dispatched(PatientId::new("P1"), VitalsSnapshot::baseline(), "eta".into())
            .expect("dispatch");
        assert!(dispatched
            .dispatched(PatientId::new("P2"), VitalsSnapshot::baseline(), "eta".into())
            .is_err());
    }

    #[test]
    fn nudge_ignores_stationary_units() {
        let idle = unit();
        let moved = idle.nudged(GeoPoint::new(0.0, 0.0), None);
        assert_eq!(moved, idle);
    }

    #[test]
    fn vitals_require_an_assigned_patient() {
        assert!(unit().with_vitals(VitalsSnapshot::baseline()).is_err());
    }

    #[test]
    fn in_motion_and_patient_carrying_states() {
        assert!(UnitStatus::Dispatched.is_in_motion());
        assert!(UnitStatus::Transporting.is_in_motion());
        assert!(!UnitStatus::ArrivedPickup.is_in_motion());
        assert!(UnitStatus::ArrivedPickup.carries_patient());
        assert!(!UnitStatus::ArrivedDestination.carries_patient());
        assert_eq!(UnitStatus::ArrivedPickup.to_string(), "arrived_pickup");
    }
}
