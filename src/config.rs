//! Run configuration
//!
//! A run is described by a JSON file; every field is optional and falls back
//! to the defaults below (k1 = 100/s, k2 = 0.1/s, A0 = 1, 0.1 s at dt = 1e-4 s).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::kinetics::{Concentrations, KineticParams};
use crate::simulation::{ReactionSimulator, ValidationThresholds};

/// Everything needed for one simulation run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub initial: Concentrations,
    /// Final integration time [s]
    pub t_end: f64,
    /// Time step [s]
    pub dt: f64,
    pub kinetics: KineticParams,
    pub thresholds: ValidationThresholds,
    pub checks: bool,
    pub clip_negative: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            initial: Concentrations::default(),
            t_end: 0.1,
            dt: 1e-4,
            kinetics: KineticParams::default(),
            thresholds: ValidationThresholds::default(),
            checks: true,
            clip_negative: false,
        }
    }
}

impl RunConfig {
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a run file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            std::io::Error::new(e.kind(), format!("{}: {}", path.display(), e))
        })?;
        let config = Self::from_json(&content)?;
        log::debug!("Loaded run config from {}", path.display());
        Ok(config)
    }

    /// Simulator set up with this run's parameters and flags
    pub fn simulator(&self) -> ReactionSimulator {
        ReactionSimulator::new(self.kinetics)
            .with_thresholds(self.thresholds)
            .with_checks(self.checks)
            .with_clip_negative(self.clip_negative)
    }
}
