//! Background driver for wall-clock engines.
//!
//! The task sleeps until the next timer falls due, fires it, and goes back to sleep. A
//! dispatch or monitor start wakes it early so newly scheduled timers are picked up.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::engine::FleetEngine;
use crate::error::{FleetError, FleetResult};

#[derive(Debug)]
pub struct FleetRuntime {
    engine: Arc<FleetEngine>,
    stop: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl FleetRuntime {
    /// Spawns the driver on the current tokio runtime.
    pub fn spawn(engine: Arc<FleetEngine>) -> FleetResult<Self> {
        if !engine.is_wall_clock() {
            return Err(FleetError::InvalidConfig(
                "background runtime requires a wall-clock engine".to_string(),
            ));
        }
        if engine.is_shut_down() {
            return Err(FleetError::ShutDown);
        }
        let (stop, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(drive(Arc::clone(&engine), stop_rx));
        info!("fleet runtime started");
        Ok(Self {
            engine,
            stop,
            handle: Some(handle),
        })
    }

    pub fn engine(&self) -> &Arc<FleetEngine> {
        &self.engine
    }

    /// Stops the driver, then cancels every outstanding timer on the engine.
    pub async fn shutdown(mut self) {
        let _ = self.stop.send(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        self.engine.shutdown();
        info!("fleet runtime stopped");
    }
}

impl Drop for FleetRuntime {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            self.engine.shutdown();
        }
    }
}

async fn drive(engine: Arc<FleetEngine>, mut stop: watch::Receiver<bool>) {
    loop {
        if *stop.borrow() || engine.is_shut_down() {
            break;
        }
        let fired = engine.sync();
        if fired > 0 {
            debug!(fired, now_ms = engine.now_ms(), "runtime fired timers");
        }
        let deadline = engine
            .next_event_ms()
            .and_then(|at_ms| engine.instant_at(at_ms));

        tokio::select! {
            changed = stop.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = engine.wake().notified() => {}
            _ = sleep_until(deadline) => {}
        }
    }
}

async fn sleep_until(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}
