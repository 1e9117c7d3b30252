use crate::fleet::{PatientId, UnitId, UnitStatus};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FleetError {
    #[error("no units available for dispatch")]
    NoCapacity,
    #[error("unit not found: {0}")]
    NotFound(UnitId),
    #[error("no unit assigned to patient {0}")]
    PatientNotFound(PatientId),
    #[error("unit {unit} in status {status} cannot {operation}")]
    InvalidTransition {
        unit: UnitId,
        status: UnitStatus,
        operation: &'static str,
    },
    #[error("fleet engine has been shut down")]
    ShutDown,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type FleetResult<T> = Result<T, FleetError>;
