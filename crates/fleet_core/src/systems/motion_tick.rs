//! Motion tick: nudges every in-motion unit and drifts its patient's vitals.
//!
//! The tick reschedules itself, so exactly one is pending while the fleet runs.

use bevy_ecs::prelude::{Res, ResMut};
use rand::Rng;
use tracing::trace;

use crate::clock::{CurrentEvent, EventKind, SimulationClock};
use crate::config::FleetConfig;
use crate::ecs::{FleetRegistry, FleetRng, VitalsWalks};
use crate::fleet::GeoPoint;

pub fn motion_tick_system(
    mut clock: ResMut<SimulationClock>,
    event: Res<CurrentEvent>,
    registry: Res<FleetRegistry>,
    config: Res<FleetConfig>,
    walks: Res<VitalsWalks>,
    mut rng: ResMut<FleetRng>,
) {
    if event.0.kind != EventKind::MotionTick {
        return;
    }

    let jitter = config.motion_jitter_deg;
    let mut moved = 0usize;
    for &id in registry.0.ids() {
        if !registry.0.status(id).is_some_and(|status| status.is_in_motion()) {
            continue;
        }
        // Rechecked under the write lock; the unit may have stopped since the read.
        let result = registry.0.update(id, |unit| {
            if !unit.status.is_in_motion() {
                return Ok(unit.clone());
            }
            let location = jittered(unit.location, jitter, &mut rng.0);
            let vitals = unit
                .vitals
                .as_ref()
                .map(|vitals| walks.fleet.next(vitals, &mut rng.0));
            moved += 1;
            Ok(unit.nudged(location, vitals))
        });
        debug_assert!(result.is_ok(), "registry ids are always present");
    }
    trace!(at_ms = clock.now(), moved, "motion tick");

    clock.schedule_in_secs(config.motion_tick_secs, EventKind::MotionTick, None);
}

fn jittered<R: Rng + ?Sized>(location: GeoPoint, jitter: f64, rng: &mut R) -> GeoPoint {
    if jitter <= 0.0 {
        return location;
    }
    location.offset(
        rng.gen_range(-jitter..=jitter),
        rng.gen_range(-jitter..=jitter),
    )
}
