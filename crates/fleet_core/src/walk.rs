//! Bounded random walks for simulated physiological readings.
//!
//! Two independent generators:
//! - [FleetVitalsWalk]: the slow drift applied to every in-motion unit on the motion tick.
//! - [LiveVitalsWalk]: the faster, spikier per-patient stream used for focused observation.
//!
//! Both take the RNG from the caller so the engine can keep a single seeded source.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::vitals::{BloodPressure, VitalsSnapshot};

/// Uniform step of at most `delta` in either direction, clamped to `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricBand {
    pub delta: f64,
    pub min: f64,
    pub max: f64,
}

impl MetricBand {
    pub const fn new(delta: f64, min: f64, max: f64) -> Self {
        Self { delta, min, max }
    }

    /// Free drift with no clamp.
    pub const fn unbounded(delta: f64) -> Self {
        Self {
            delta,
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    pub fn step<R: Rng + ?Sized>(&self, value: f64, rng: &mut R) -> f64 {
        self.step_by(value, rng.gen_range(-self.delta..=self.delta))
    }

    pub fn step_by(&self, value: f64, delta: f64) -> f64 {
        (value + delta).clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

fn round_whole(value: f64) -> u32 {
    value.round().max(0.0) as u32
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Motion-tick walk. Glucose and consciousness are carried through unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FleetVitalsWalk {
    pub heart_rate: MetricBand,
    pub systolic: MetricBand,
    pub diastolic: MetricBand,
    pub oxygen_saturation: MetricBand,
    pub temperature: MetricBand,
    pub respiratory_rate: MetricBand,
}

impl Default for FleetVitalsWalk {
    fn default() -> Self {
        Self {
            heart_rate: MetricBand::new(3.0, 60.0, 100.0),
            systolic: MetricBand::new(3.0, 100.0, 140.0),
            diastolic: MetricBand::new(2.0, 60.0, 90.0),
            oxygen_saturation: MetricBand::new(0.5, 94.0, 100.0),
            temperature: MetricBand::unbounded(0.1),
            respiratory_rate: MetricBand::new(1.0, 12.0, 20.0),
        }
    }
}

impl FleetVitalsWalk {
    pub fn next<R: Rng + ?Sized>(&self, previous: &VitalsSnapshot, rng: &mut R) -> VitalsSnapshot {
        let heart_rate = self.heart_rate.step(f64::from(previous.heart_rate), rng);
        let systolic = self
            .systolic
            .step(f64::from(previous.blood_pressure.systolic), rng);
        let diastolic = self
            .diastolic
            .step(f64::from(previous.blood_pressure.diastolic), rng);
        let oxygen = self.oxygen_saturation.step(previous.oxygen_saturation, rng);
        let temperature = self.temperature.step(previous.temperature, rng);
        let respiratory = self
            .respiratory_rate
            .step(f64::from(previous.respiratory_rate), rng);

        VitalsSnapshot {
            heart_rate: round_whole(heart_rate),
            blood_pressure: BloodPressure::new(round_whole(systolic), round_whole(diastolic)),
            oxygen_saturation: round_tenth(oxygen),
            temperature: round_tenth(temperature),
            respiratory_rate: round_whole(respiratory),
            glucose: previous.glucose,
            consciousness: previous.consciousness,
        }
    }

    /// True when every clamped metric of `snapshot` lies inside its band.
    pub fn within_bands(&self, snapshot: &VitalsSnapshot) -> bool {
        self.heart_rate.contains(f64::from(snapshot.heart_rate))
            && self
                .systolic
                .contains(f64::from(snapshot.blood_pressure.systolic))
            && self
                .diastolic
                .contains(f64::from(snapshot.blood_pressure.diastolic))
            && self.oxygen_saturation.contains(snapshot.oxygen_saturation)
            && self
                .respiratory_rate
                .contains(f64::from(snapshot.respiratory_rate))
    }
}

/// One point of a live-monitoring stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiveReading {
    /// Simulation time of the reading (ms).
    pub at_ms: u64,
    pub heart_rate: u32,
    pub oxygen_saturation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveVitalsWalk {
    pub heart_rate: MetricBand,
    /// Chance per tick that the heart-rate step is replaced by a spike.
    pub spike_probability: f64,
    /// Magnitude of a spike; the sign is random.
    pub spike_delta: f64,
    pub oxygen_saturation: MetricBand,
}

impl Default for LiveVitalsWalk {
    fn default() -> Self {
        Self {
            heart_rate: MetricBand::new(5.0, 40.0, 180.0),
            spike_probability: 0.1,
            spike_delta: 15.0,
            oxygen_saturation: MetricBand::new(1.0, 92.0, 100.0),
        }
    }
}

impl LiveVitalsWalk {
    /// First reading of a stream, taken from the patient's current vitals.
    pub fn seed(&self, vitals: &VitalsSnapshot, at_ms: u64) -> LiveReading {
        LiveReading {
            at_ms,
            heart_rate: round_whole(self.heart_rate.step_by(f64::from(vitals.heart_rate), 0.0)),
            oxygen_saturation: round_tenth(
                self.oxygen_saturation
                    .step_by(vitals.oxygen_saturation, 0.0),
            ),
        }
    }

    pub fn next<R: Rng + ?Sized>(
        &self,
        previous: &LiveReading,
        at_ms: u64,
        rng: &mut R,
    ) -> LiveReading {
        let heart_rate = if rng.gen_bool(self.spike_probability) {
            let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            self.heart_rate
                .step_by(f64::from(previous.heart_rate), sign * self.spike_delta)
        } else {
            self.heart_rate.step(f64::from(previous.heart_rate), rng)
        };
        let oxygen = self
            .oxygen_saturation
            .step(previous.oxygen_saturation, rng);

        LiveReading {
            at_ms,
            heart_rate: round_whole(heart_rate),
            oxygen_saturation: round_tenth(oxygen),
        }
    }

    pub fn within_bands(&self, reading: &LiveReading) -> bool {
        self.heart_rate.contains(f64::from(reading.heart_rate))
            && self.oxygen_saturation.contains(reading.oxygen_saturation)
    }
}
