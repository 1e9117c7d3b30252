//! Resolves the fleet configuration once at startup: JSON file first, then flag overrides.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use fleet_core::config::{default_roster, FleetConfig, UnitSeed};
use serde::Deserialize;

/// On-disk layout: every [FleetConfig] field at the top level plus an optional roster.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SimulationFile {
    #[serde(flatten)]
    pub fleet: FleetConfig,
    pub roster: Option<Vec<UnitSeed>>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub fleet: FleetConfig,
    pub roster: Vec<UnitSeed>,
}

impl Settings {
    pub fn resolve(path: Option<&Path>, seed: Option<u64>) -> Result<Self> {
        let file = match path {
            Some(path) => load(path)?,
            None => SimulationFile::default(),
        };
        let mut fleet = file.fleet;
        if let Some(seed) = seed {
            fleet.seed = seed;
        }
        fleet
            .validate()
            .context("fleet configuration is invalid")?;
        Ok(Self {
            fleet,
            roster: file.roster.unwrap_or_else(default_roster),
        })
    }
}

fn load(path: &Path) -> Result<SimulationFile> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    parse(&raw).with_context(|| format!("parsing config file {}", path.display()))
}

fn parse(raw: &str) -> Result<SimulationFile> {
    Ok(serde_json::from_str(raw)?)
}
