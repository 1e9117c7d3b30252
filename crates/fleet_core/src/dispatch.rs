//! Dispatch: assigns an available unit to a pickup request and starts its stage timers.
//!
//! Selection is the first available unit in registry order, not the nearest one.

use bevy_ecs::prelude::World;
use tracing::{info, warn};

use crate::clock::{EventKind, EventSubject, SimulationClock};
use crate::config::FleetConfig;
use crate::ecs::FleetRegistry;
use crate::error::{FleetError, FleetResult};
use crate::fleet::{DispatchRequest, Unit, UnitStatus};
use crate::telemetry::FleetTelemetry;
use crate::vitals::VitalsSnapshot;

/// Moves the first available unit to `dispatched` for `request`.
///
/// Fails with [FleetError::NoCapacity] without touching any unit or timer when no unit
/// is available.
pub fn dispatch_unit(world: &mut World, request: DispatchRequest) -> FleetResult<Unit> {
    let registry = world.resource::<FleetRegistry>().0.clone();
    let (now, eta, first_stage_ms) = {
        let config = world.resource::<FleetConfig>();
        let clock = world.resource::<SimulationClock>();
        (
            clock.now(),
            clock.eta_display(config.pickup_eta_ms()),
            config.stage_delay_ms(UnitStatus::Dispatched),
        )
    };

    let mut claimed = None;
    for &id in registry.ids() {
        // The availability check and the claim happen under the same unit lock.
        let attempt = registry.update(id, |unit| {
            unit.dispatched(
                request.patient_id.clone(),
                VitalsSnapshot::baseline(),
                eta.clone(),
            )
        });
        match attempt {
            Ok(unit) => {
                claimed = Some(unit);
                break;
            }
            Err(FleetError::InvalidTransition { .. }) => continue,
            Err(err) => return Err(err),
        }
    }

    let Some(unit) = claimed else {
        warn!(patient = %request.patient_id, "no unit available for dispatch");
        return Err(FleetError::NoCapacity);
    };

    world
        .resource_mut::<FleetTelemetry>()
        .record_dispatch(unit.id, request.patient_id.clone(), now);
    if let Some(delay) = first_stage_ms {
        world.resource_mut::<SimulationClock>().schedule_in(
            delay,
            EventKind::StageTransition,
            Some(EventSubject::Stage {
                unit: unit.id,
                from: UnitStatus::Dispatched,
            }),
        );
    }

    info!(
        unit = %unit.id,
        operator = %unit.operator_name,
        patient = %request.patient_id,
        pickup_lat = request.pickup.latitude,
        pickup_lng = request.pickup.longitude,
        at_ms = now,
        "unit dispatched"
    );
    Ok(unit)
}
