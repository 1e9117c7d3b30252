//! Patient vital-sign snapshots carried by units with an assigned patient.
//!
//! A [VitalsSnapshot] is always complete. Partial manual entry goes through
//! [VitalsUpdate::apply_to], which produces a new complete snapshot.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Arterial blood pressure in mmHg. Renders as `"120/80"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloodPressure {
    pub systolic: u32,
    pub diastolic: u32,
}

impl BloodPressure {
    pub const fn new(systolic: u32, diastolic: u32) -> Self {
        Self {
            systolic,
            diastolic,
        }
    }
}

impl fmt::Display for BloodPressure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.systolic, self.diastolic)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("blood pressure must look like \"120/80\", got {0:?}")]
pub struct ParseBloodPressureError(String);

impl FromStr for BloodPressure {
    type Err = ParseBloodPressureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseBloodPressureError(s.to_string());
        let (systolic, diastolic) = s.trim().split_once('/').ok_or_else(err)?;
        Ok(Self {
            systolic: systolic.trim().parse().map_err(|_| err())?,
            diastolic: diastolic.trim().parse().map_err(|_| err())?,
        })
    }
}

/// Level of consciousness on the AVPU scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Consciousness {
    Alert,
    Voice,
    Pain,
    Unresponsive,
}

impl fmt::Display for Consciousness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Consciousness::Alert => "Alert",
            Consciousness::Voice => "Voice",
            Consciousness::Pain => "Pain",
            Consciousness::Unresponsive => "Unresponsive",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown consciousness level {0:?} (expected one of alert, voice, pain, unresponsive)")]
pub struct ParseConsciousnessError(String);

impl FromStr for Consciousness {
    type Err = ParseConsciousnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" | "alert" => Ok(Consciousness::Alert),
            "v" | "voice" | "verbal" => Ok(Consciousness::Voice),
            "p" | "pain" => Ok(Consciousness::Pain),
            "u" | "unresponsive" => Ok(Consciousness::Unresponsive),
            _ => Err(ParseConsciousnessError(s.to_string())),
        }
    }
}

/// Named metric of a [VitalsSnapshot], used for labelling and display units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    HeartRate,
    BloodPressure,
    OxygenSaturation,
    Temperature,
    RespiratoryRate,
    Glucose,
    Consciousness,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::HeartRate,
        Metric::BloodPressure,
        Metric::OxygenSaturation,
        Metric::Temperature,
        Metric::RespiratoryRate,
        Metric::Glucose,
        Metric::Consciousness,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Metric::HeartRate => "Heart Rate",
            Metric::BloodPressure => "Blood Pressure",
            Metric::OxygenSaturation => "Oxygen Level",
            Metric::Temperature => "Temperature",
            Metric::RespiratoryRate => "Respiratory Rate",
            Metric::Glucose => "Glucose Level",
            Metric::Consciousness => "Consciousness",
        }
    }

    /// Display unit; empty for categorical metrics.
    pub fn unit(self) -> &'static str {
        match self {
            Metric::HeartRate => "bpm",
            Metric::BloodPressure => "mmHg",
            Metric::OxygenSaturation => "%",
            Metric::Temperature => "°C",
            Metric::RespiratoryRate => "breaths/min",
            Metric::Glucose => "mg/dL",
            Metric::Consciousness => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalsSnapshot {
    /// Beats per minute.
    pub heart_rate: u32,
    pub blood_pressure: BloodPressure,
    /// SpO2 percentage, one decimal.
    pub oxygen_saturation: f64,
    /// Degrees Celsius, one decimal.
    pub temperature: f64,
    /// Breaths per minute.
    pub respiratory_rate: u32,
    /// mg/dL.
    pub glucose: u32,
    pub consciousness: Consciousness,
}

impl VitalsSnapshot {
    /// Snapshot assigned to a patient at dispatch; seed for all later walks.
    pub const fn baseline() -> Self {
        Self {
            heart_rate: 85,
            blood_pressure: BloodPressure::new(120, 80),
            oxygen_saturation: 98.0,
            temperature: 37.2,
            respiratory_rate: 16,
            glucose: 90,
            consciousness: Consciousness::Alert,
        }
    }

    /// Human-readable value of one metric, without its unit.
    pub fn display_value(&self, metric: Metric) -> String {
        match metric {
            Metric::HeartRate => self.heart_rate.to_string(),
            Metric::BloodPressure => self.blood_pressure.to_string(),
            Metric::OxygenSaturation => format!("{:.1}", self.oxygen_saturation),
            Metric::Temperature => format!("{:.1}", self.temperature),
            Metric::RespiratoryRate => self.respiratory_rate.to_string(),
            Metric::Glucose => self.glucose.to_string(),
            Metric::Consciousness => self.consciousness.to_string(),
        }
    }
}

impl Default for VitalsSnapshot {
    fn default() -> Self {
        Self::baseline()
    }
}

/// Partial manual entry. Unset fields keep the current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalsUpdate {
    pub heart_rate: Option<u32>,
    pub blood_pressure: Option<BloodPressure>,
    pub oxygen_saturation: Option<f64>,
    pub temperature: Option<f64>,
    pub respiratory_rate: Option<u32>,
    pub glucose: Option<u32>,
    pub consciousness: Option<Consciousness>,
}

impl VitalsUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply_to(&self, current: &VitalsSnapshot) -> VitalsSnapshot {
        VitalsSnapshot {
            heart_rate: self.heart_rate.unwrap_or(current.heart_rate),
            blood_pressure: self.blood_pressure.unwrap_or(current.blood_pressure),
            oxygen_saturation: self.oxygen_saturation.unwrap_or(current.oxygen_saturation),
            temperature: self.temperature.unwrap_or(current.temperature),
            respiratory_rate: self.respiratory_rate.unwrap_or(current.respiratory_rate),
            glucose: self.glucose.unwrap_or(current.glucose),
            consciousness: self.consciousness.unwrap_or(current.consciousness),
        }
    }
}
