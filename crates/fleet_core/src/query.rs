//! Read projections over the registry, plus the manual vitals-entry operations.

use tracing::debug;

use crate::error::{FleetError, FleetResult};
use crate::fleet::{GeoPoint, PatientId, Unit, UnitId, UnitStatus};
use crate::registry::UnitRegistry;
use crate::vitals::{VitalsSnapshot, VitalsUpdate};

/// Unit currently carrying `patient`, if any.
pub fn unit_for_patient(registry: &UnitRegistry, patient: &PatientId) -> Option<Unit> {
    registry.find(|unit| unit.assigned_patient.as_ref() == Some(patient))
}

/// Unit driven by `operator_name` (exact match).
pub fn unit_for_operator(registry: &UnitRegistry, operator_name: &str) -> Option<Unit> {
    registry.find(|unit| unit.operator_name == operator_name)
}

/// Units offered to a caller at `location`.
///
/// Returns every available unit in registry order; no distance filtering is applied,
/// so callers must not treat the result as geospatially ranked.
pub fn units_near(registry: &UnitRegistry, _location: GeoPoint) -> Vec<Unit> {
    registry
        .list()
        .into_iter()
        .filter(|unit| unit.status == UnitStatus::Available)
        .collect()
}

/// Overwrites the vitals of `unit`. The unit must currently carry a patient.
pub fn update_vitals(
    registry: &UnitRegistry,
    unit: UnitId,
    vitals: VitalsSnapshot,
) -> FleetResult<Unit> {
    let updated = registry.update(unit, |current| current.with_vitals(vitals))?;
    debug!(%unit, "vitals overwritten");
    Ok(updated)
}

/// Merges a partial manual entry onto the current vitals of `unit`.
pub fn merge_vitals(
    registry: &UnitRegistry,
    unit: UnitId,
    update: &VitalsUpdate,
) -> FleetResult<Unit> {
    let updated = registry.update(unit, |current| {
        let Some(vitals) = current.vitals.as_ref() else {
            return Err(FleetError::InvalidTransition {
                unit: current.id,
                status: current.status,
                operation: "record vitals without an assigned patient",
            });
        };
        current.with_vitals(update.apply_to(vitals))
    })?;
    debug!(%unit, "vitals merged");
    Ok(updated)
}
