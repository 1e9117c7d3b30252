//! Simulation runner: advances the clock and routes events into the ECS.
//!
//! Clock progression and event routing happen here, outside systems. Each step
//! pops the next event from [SimulationClock], inserts it as [CurrentEvent],
//! then runs the schedule.

use bevy_ecs::prelude::{Res, Schedule, World};
use bevy_ecs::schedule::{ExecutorKind, IntoSystemConfigs};

use crate::clock::{CurrentEvent, Event, EventKind, SimulationClock};
use crate::systems::{
    live_monitor::live_monitor_system, motion_tick::motion_tick_system,
    stage_transition::stage_transition_system,
};
use crate::telemetry::FleetTelemetry;

fn is_stage_transition(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::StageTransition)
        .unwrap_or(false)
}

fn is_motion_tick(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::MotionTick)
        .unwrap_or(false)
}

fn is_monitor_tick(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::MonitorTick)
        .unwrap_or(false)
}

/// Builds the fleet schedule: one system per event kind, gated by run conditions.
///
/// Every system touches the registry and the RNG, so the schedule runs single-threaded.
pub fn fleet_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems((
        stage_transition_system.run_if(is_stage_transition),
        motion_tick_system.run_if(is_motion_tick),
        live_monitor_system.run_if(is_monitor_tick),
    ));
    schedule
}

/// Runs one simulation step: pops the next event, inserts it as [CurrentEvent], then runs
/// the schedule. Returns the processed event, or `None` if the clock was empty.
pub fn run_next_event(world: &mut World, schedule: &mut Schedule) -> Option<Event> {
    let event = world.resource_mut::<SimulationClock>().pop_next()?;
    world.insert_resource(CurrentEvent(event));

    if let Some(mut telemetry) = world.get_resource_mut::<FleetTelemetry>() {
        telemetry.events_processed += 1;
    }

    schedule.run(world);
    Some(event)
}

/// Processes every event due at or before `until_ms`, then parks the clock at `until_ms`.
/// Returns the number of events processed.
pub fn run_until(world: &mut World, schedule: &mut Schedule, until_ms: u64) -> usize {
    let mut steps = 0;
    loop {
        let due = world
            .resource::<SimulationClock>()
            .next_event_time()
            .is_some_and(|ts| ts <= until_ms);
        if !due {
            break;
        }
        if run_next_event(world, schedule).is_none() {
            break;
        }
        steps += 1;
    }
    world.resource_mut::<SimulationClock>().advance_to(until_ms);
    steps
}

/// Runs simulation steps until the event queue is empty or `max_steps` is reached.
/// Returns the number of steps executed.
pub fn run_until_empty(world: &mut World, schedule: &mut Schedule, max_steps: usize) -> usize {
    let mut steps = 0;
    while steps < max_steps && run_next_event(world, schedule).is_some() {
        steps += 1;
    }
    steps
}
