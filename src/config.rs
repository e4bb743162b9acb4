//! Solver settings file.
//!
//! A JSON document grouping the metaheuristic configurations with the
//! engine-wide knobs. Every field is optional; missing ones take their
//! default.
//!
//! ```json
//! {
//!   "genetic": { "population_size": 300, "generations": 9000 },
//!   "annealing": { "cooling_rate": 0.999 },
//!   "brute_force_limit": 10,
//!   "seed": 7,
//!   "solution_precision": 2
//! }
//! ```

use crate::error::{Error, Result};
use crate::heuristics::annealing::SaConfig;
use crate::heuristics::genetic::GaConfig;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Largest instance the brute force solver accepts unless configured otherwise
pub const DEFAULT_BRUTE_FORCE_LIMIT: usize = 11;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    pub genetic: GaConfig,
    pub annealing: SaConfig,
    /// Instances above this size are refused by the brute force solver
    pub brute_force_limit: usize,
    /// Overrides the seeds of both metaheuristics when set
    pub seed: Option<u64>,
    /// Decimals of the distance in written solution files (0 writes an integer)
    pub solution_precision: usize,
}

impl Default for SolverSettings {
    fn default() -> Self {
        SolverSettings {
            genetic: GaConfig::default(),
            annealing: SaConfig::default(),
            brute_force_limit: DEFAULT_BRUTE_FORCE_LIMIT,
            seed: None,
            solution_precision: 0,
        }
    }
}

impl SolverSettings {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let settings: SolverSettings = serde_json::from_reader(BufReader::new(file))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let settings: SolverSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.genetic.validate()?;
        self.annealing.validate()?;
        if self.solution_precision > 15 {
            return Err(Error::validation(
                "solution_precision",
                format!("at most 15 decimals are meaningful, got {}", self.solution_precision),
            ));
        }
        Ok(())
    }

    /// GA configuration with the global seed applied
    pub fn genetic_config(&self) -> GaConfig {
        let mut config = self.genetic.clone();
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        config
    }

    /// SA configuration with the global seed applied
    pub fn annealing_config(&self) -> SaConfig {
        let mut config = self.annealing.clone();
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        config
    }
}
