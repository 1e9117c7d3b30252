//! Stage timers: move a unit one step along its journey when its timer fires.
//!
//! Each timer names the status it expects the unit to leave. The transition is only
//! applied if the unit is still there; otherwise it is logged and dropped.

use bevy_ecs::prelude::{Res, ResMut};
use tracing::{debug, info, warn};

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::config::FleetConfig;
use crate::ecs::FleetRegistry;
use crate::fleet::UnitStatus;
use crate::telemetry::FleetTelemetry;

pub fn stage_transition_system(
    mut clock: ResMut<SimulationClock>,
    event: Res<CurrentEvent>,
    registry: Res<FleetRegistry>,
    config: Res<FleetConfig>,
    mut telemetry: ResMut<FleetTelemetry>,
) {
    if event.0.kind != EventKind::StageTransition {
        return;
    }
    let Some(EventSubject::Stage { unit, from }) = event.0.subject else {
        return;
    };

    let now = clock.now();
    let eta = (from == UnitStatus::ArrivedPickup)
        .then(|| clock.eta_display(config.destination_eta_ms()));

    let updated = match registry.0.update(unit, |current| current.advanced(from, eta)) {
        Ok(updated) => updated,
        Err(err) => {
            warn!(%unit, %from, error = %err, "dropping stage transition");
            return;
        }
    };

    debug!(%unit, from = %from, to = %updated.status, at_ms = now, "stage transition");
    if updated.status == UnitStatus::ArrivedDestination {
        info!(%unit, at_ms = now, "patient handed over at destination");
    }
    telemetry.record_stage(unit, updated.status, now);

    if let Some(delay) = config.stage_delay_ms(updated.status) {
        clock.schedule_in(
            delay,
            EventKind::StageTransition,
            Some(EventSubject::Stage {
                unit,
                from: updated.status,
            }),
        );
    }
}
