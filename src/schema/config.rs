//! Configuration types for the hybrid energy dispatch problem.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{EvolutionConfig, EvolutionConfigError};
use crate::evolution::{GeneBounds, GeneSpace};

/// Top-level configuration file: the problem to solve and how to search it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Load demand and power sources.
    #[serde(default)]
    pub problem: DispatchProblem,
    /// Genetic algorithm settings.
    #[serde(default)]
    pub evolution: EvolutionConfig,
}

impl DispatchConfig {
    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Validate the problem, its power ranges and the evolution settings.
    pub fn validate(&self) -> Result<(), EvolutionConfigError> {
        self.problem.validate()?;
        self.problem.gene_space()?;
        self.evolution.validate()
    }
}

/// Fixed load demand plus the sources that can supply it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchProblem {
    /// Load demand in watts.
    #[serde(default = "default_load_demand")]
    pub load_demand: f64,
    /// Power sources, one gene each, in gene order.
    #[serde(default = "default_sources")]
    pub sources: Vec<PowerSource>,
}

impl Default for DispatchProblem {
    fn default() -> Self {
        Self {
            load_demand: default_load_demand(),
            sources: default_sources(),
        }
    }
}

fn default_load_demand() -> f64 {
    1000.0
}

fn default_sources() -> Vec<PowerSource> {
    vec![
        PowerSource::new("Solar", 0.05, GeneBounds::new(0.0, 500.0)),
        PowerSource::new("Wind", 0.06, GeneBounds::new(0.0, 500.0)),
        PowerSource::new("Battery", 0.08, GeneBounds::new(0.0, 300.0)),
        PowerSource::new("Hydrogen", 0.10, GeneBounds::new(0.0, 300.0)),
    ]
}

/// A single generation source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerSource {
    /// Display name.
    pub name: String,
    /// Cost per unit of power.
    pub unit_cost: f64,
    /// Allowed output range in watts.
    pub bounds: GeneBounds,
}

impl PowerSource {
    pub fn new(name: impl Into<String>, unit_cost: f64, bounds: GeneBounds) -> Self {
        Self {
            name: name.into(),
            unit_cost,
            bounds,
        }
    }
}

impl DispatchProblem {
    /// Source names in gene order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.name.as_str())
    }

    /// Build the gene space from the source bounds.
    pub fn gene_space(&self) -> Result<GeneSpace, EvolutionConfigError> {
        GeneSpace::new(self.sources.iter().map(|s| s.bounds))
    }

    /// Validate problem parameters.
    pub fn validate(&self) -> Result<(), ProblemConfigError> {
        if !self.load_demand.is_finite() || self.load_demand < 0.0 {
            return Err(ProblemConfigError::InvalidLoadDemand(self.load_demand));
        }
        if self.sources.is_empty() {
            return Err(ProblemConfigError::NoSources);
        }
        for source in &self.sources {
            if !source.unit_cost.is_finite() || source.unit_cost < 0.0 {
                return Err(ProblemConfigError::InvalidUnitCost {
                    source_name: source.name.clone(),
                    cost: source.unit_cost,
                });
            }
        }
        Ok(())
    }
}

/// Problem validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ProblemConfigError {
    #[error("Load demand must be finite and non-negative, got {0}")]
    InvalidLoadDemand(f64),
    #[error("At least one power source is required")]
    NoSources,
    #[error("Source {source_name} has invalid unit cost {cost}")]
    InvalidUnitCost { source_name: String, cost: f64 },
}

/// Errors loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
