//! Service-shaped facade over the fleet simulation.
//!
//! [FleetEngine] owns the unit registry and the ECS world that holds the clock and
//! timers. Reads go straight to the registry and never wait on the simulation lock;
//! operations that schedule timers or fire them take the lock briefly.
//!
//! Time either advances only when asked ([FleetEngine::new], for fast-forwarding) or
//! follows the wall clock ([FleetEngine::with_wall_clock]), in which case every mutating
//! call first catches the simulation up to the present and a [crate::runtime::FleetRuntime]
//! fires timers as they fall due.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bevy_ecs::prelude::{Schedule, World};
use tokio::sync::{watch, Notify};
use tokio::time::Instant;
use tracing::info;

use crate::clock::SimulationClock;
use crate::config::{FleetConfig, UnitSeed};
use crate::dispatch::dispatch_unit;
use crate::error::{FleetError, FleetResult};
use crate::fleet::{DispatchRequest, GeoPoint, PatientId, Unit, UnitId};
use crate::monitoring;
use crate::query;
use crate::registry::UnitRegistry;
use crate::runner::{fleet_schedule, run_until};
use crate::scenario::build_fleet;
use crate::telemetry::{FleetSnapshot, FleetTelemetry, JourneyRecord};
use crate::vitals::{VitalsSnapshot, VitalsUpdate};
use crate::walk::LiveReading;

#[derive(Debug, Clone, Copy)]
enum Pacing {
    Manual,
    WallClock { started: Instant },
}

struct Simulation {
    world: World,
    schedule: Schedule,
}

pub struct FleetEngine {
    registry: Arc<UnitRegistry>,
    sim: Mutex<Simulation>,
    pacing: Pacing,
    snapshots: watch::Sender<FleetSnapshot>,
    wake: Notify,
    shut_down: AtomicBool,
}

impl std::fmt::Debug for FleetEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FleetEngine")
            .field("units", &self.registry.len())
            .field("pacing", &self.pacing)
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

impl FleetEngine {
    /// Engine whose time only moves via [FleetEngine::advance_by] / [FleetEngine::advance_to].
    pub fn new(config: FleetConfig, roster: &[UnitSeed]) -> FleetResult<Self> {
        Self::build(config, roster, Pacing::Manual)
    }

    /// Engine whose simulation time tracks elapsed wall-clock time from now.
    pub fn with_wall_clock(config: FleetConfig, roster: &[UnitSeed]) -> FleetResult<Self> {
        Self::build(
            config,
            roster,
            Pacing::WallClock {
                started: Instant::now(),
            },
        )
    }

    fn build(config: FleetConfig, roster: &[UnitSeed], pacing: Pacing) -> FleetResult<Self> {
        config.validate()?;
        let mut world = World::new();
        let registry = build_fleet(&mut world, &config, roster);
        let (snapshots, _) = watch::channel(FleetSnapshot {
            at_ms: 0,
            units: registry.list(),
        });
        Ok(Self {
            registry,
            sim: Mutex::new(Simulation {
                world,
                schedule: fleet_schedule(),
            }),
            pacing,
            snapshots,
            wake: Notify::new(),
            shut_down: AtomicBool::new(false),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Simulation> {
        self.sim.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Simulation lock for operations that create timers.
    ///
    /// The flag is read under the lock; [FleetEngine::shutdown] sets it under the same lock.
    fn lock_accepting_work(&self) -> FleetResult<MutexGuard<'_, Simulation>> {
        let sim = self.lock();
        if self.is_shut_down() {
            return Err(FleetError::ShutDown);
        }
        Ok(sim)
    }

    pub fn is_wall_clock(&self) -> bool {
        matches!(self.pacing, Pacing::WallClock { .. })
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    pub fn list(&self) -> Vec<Unit> {
        self.registry.list()
    }

    pub fn get(&self, id: UnitId) -> Option<Unit> {
        self.registry.get(id)
    }

    pub fn snapshot(&self) -> FleetSnapshot {
        FleetSnapshot {
            at_ms: self.now_ms(),
            units: self.registry.list(),
        }
    }

    /// Receives a fresh [FleetSnapshot] after every change to the fleet.
    pub fn subscribe(&self) -> watch::Receiver<FleetSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn dispatch(&self, request: DispatchRequest) -> FleetResult<Unit> {
        let unit = {
            let mut sim = self.lock_accepting_work()?;
            self.catch_up(&mut sim);
            dispatch_unit(&mut sim.world, request)?
        };
        self.publish();
        self.wake.notify_one();
        Ok(unit)
    }

    pub fn dispatch_patient(
        &self,
        patient_id: impl Into<String>,
        pickup: GeoPoint,
    ) -> FleetResult<Unit> {
        self.dispatch(DispatchRequest::new(patient_id, pickup))
    }

    pub fn unit_for_patient(&self, patient: &PatientId) -> Option<Unit> {
        query::unit_for_patient(&self.registry, patient)
    }

    pub fn unit_for_operator(&self, operator_name: &str) -> Option<Unit> {
        query::unit_for_operator(&self.registry, operator_name)
    }

    pub fn units_near(&self, location: GeoPoint) -> Vec<Unit> {
        query::units_near(&self.registry, location)
    }

    pub fn update_vitals(&self, unit: UnitId, vitals: VitalsSnapshot) -> FleetResult<Unit> {
        let updated = query::update_vitals(&self.registry, unit, vitals)?;
        self.publish();
        Ok(updated)
    }

    pub fn merge_vitals(&self, unit: UnitId, update: &VitalsUpdate) -> FleetResult<Unit> {
        let updated = query::merge_vitals(&self.registry, unit, update)?;
        self.publish();
        Ok(updated)
    }

    pub fn start_monitoring(&self, patient: &PatientId) -> FleetResult<LiveReading> {
        let reading = {
            let mut sim = self.lock_accepting_work()?;
            self.catch_up(&mut sim);
            monitoring::start_monitoring(&mut sim.world, patient)?
        };
        self.wake.notify_one();
        Ok(reading)
    }

    pub fn stop_monitoring(&self, patient: &PatientId) -> bool {
        let mut sim = self.lock();
        monitoring::stop_monitoring(&mut sim.world, patient)
    }

    pub fn monitor_readings(&self, patient: &PatientId) -> Option<Vec<LiveReading>> {
        monitoring::monitor_readings(&self.lock().world, patient)
    }

    pub fn monitored_patients(&self) -> Vec<PatientId> {
        monitoring::monitored_patients(&self.lock().world)
    }

    pub fn now_ms(&self) -> u64 {
        self.lock().world.resource::<SimulationClock>().now()
    }

    pub fn next_event_ms(&self) -> Option<u64> {
        self.lock()
            .world
            .resource::<SimulationClock>()
            .next_event_time()
    }

    pub fn pending_timers(&self) -> usize {
        self.lock().world.resource::<SimulationClock>().pending()
    }

    /// Fires every timer due within the next `ms` of simulation time.
    pub fn advance_by(&self, ms: u64) -> usize {
        let mut sim = self.lock();
        let target = sim
            .world
            .resource::<SimulationClock>()
            .now()
            .saturating_add(ms);
        self.run_to(&mut sim, target)
    }

    /// Fires every timer due at or before `target_ms`.
    pub fn advance_to(&self, target_ms: u64) -> usize {
        let mut sim = self.lock();
        self.run_to(&mut sim, target_ms)
    }

    /// Catches a wall-clock engine up to the present. Manual engines are left alone.
    pub fn sync(&self) -> usize {
        let mut sim = self.lock();
        self.catch_up(&mut sim)
    }

    /// Instant at which simulation time `at_ms` falls due, for wall-clock engines.
    pub fn instant_at(&self, at_ms: u64) -> Option<Instant> {
        match self.pacing {
            Pacing::Manual => None,
            Pacing::WallClock { started } => Some(started + Duration::from_millis(at_ms)),
        }
    }

    pub(crate) fn wake(&self) -> &Notify {
        &self.wake
    }

    fn catch_up(&self, sim: &mut Simulation) -> usize {
        match self.pacing {
            Pacing::Manual => 0,
            Pacing::WallClock { started } => {
                let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                self.run_to(sim, elapsed)
            }
        }
    }

    fn run_to(&self, sim: &mut Simulation, target_ms: u64) -> usize {
        let Simulation { world, schedule } = sim;
        let steps = run_until(world, schedule, target_ms);
        if steps > 0 {
            self.snapshots.send_replace(FleetSnapshot {
                at_ms: world.resource::<SimulationClock>().now(),
                units: self.registry.list(),
            });
        }
        steps
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.snapshot());
    }

    pub fn completed_journeys(&self) -> Vec<JourneyRecord> {
        self.lock()
            .world
            .resource::<FleetTelemetry>()
            .completed_journeys
            .iter()
            .cloned()
            .collect()
    }

    pub fn events_processed(&self) -> u64 {
        self.lock()
            .world
            .resource::<FleetTelemetry>()
            .events_processed
    }

    /// Cancels every outstanding timer and live stream. Idempotent.
    ///
    /// Units stay readable in whatever state they were in; no new timers are accepted.
    pub fn shutdown(&self) {
        let mut sim = self.lock();
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        let cancelled = cancel_all(&mut sim);
        drop(sim);
        self.wake.notify_one();
        info!(cancelled, "fleet engine shut down");
    }
}

/// Drops every pending timer and live stream, returning how many timers were pending.
fn cancel_all(sim: &mut Simulation) -> usize {
    let cancelled = sim.world.resource::<SimulationClock>().pending();
    sim.world.resource_mut::<SimulationClock>().clear();
    monitoring::stop_all_monitoring(&mut sim.world);
    cancelled
}
