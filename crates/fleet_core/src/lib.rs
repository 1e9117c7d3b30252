pub mod clock;
pub mod config;
pub mod dispatch;
pub mod ecs;
pub mod engine;
pub mod error;
pub mod fleet;
pub mod monitoring;
pub mod query;
pub mod registry;
pub mod runner;
pub mod runtime;
pub mod scenario;
pub mod systems;
pub mod telemetry;
pub mod vitals;
pub mod walk;

#[cfg(feature = "test-helpers")]
pub mod test_helpers;

pub use config::{default_roster, FleetConfig, UnitSeed};
pub use engine::FleetEngine;
pub use error::{FleetError, FleetResult};
pub use fleet::{DispatchRequest, GeoPoint, PatientId, Unit, UnitId, UnitStatus};
pub use runtime::FleetRuntime;
pub use telemetry::{FleetSnapshot, JourneyRecord};
pub use vitals::{BloodPressure, Consciousness, VitalsSnapshot, VitalsUpdate};
pub use walk::LiveReading;
