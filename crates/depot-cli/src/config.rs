//! Optional `depot` configuration file.
//!
//! ```toml
//! [solver]
//! name = "microlp"
//! integrality_tolerance = 1e-6
//!
//! [formulation]
//! tier_activation = "omit"   # omit | declare | enforce-order
//! ```
//!
//! Every key is optional. Command-line flags override file values.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use depot_algo::{FormulationOptions, MilpSolverKind, SolverConfig, TierActivation};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepotConfig {
    pub solver: SolverSection,
    pub formulation: FormulationSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSection {
    /// Backend name, parsed into a [`MilpSolverKind`]
    pub name: String,
    pub integrality_tolerance: f64,
}

impl Default for SolverSection {
    fn default() -> Self {
        let defaults = SolverConfig::default();
        Self {
            name: defaults.solver.as_str().to_string(),
            integrality_tolerance: defaults.integrality_tolerance,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormulationSection {
    pub tier_activation: TierActivation,
}

/// `<config dir>/depot/config.toml`, when the platform has a config dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("depot").join("config.toml"))
}

impl DepotConfig {
    /// Load the explicit file if given (it must exist), else the default
    /// location if present, else built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: DepotConfig = toml::from_str(&contents)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        debug!(path = %path.display(), ?config, "loaded configuration");
        Ok(config)
    }

    pub fn solver_config(&self, solver_override: Option<&str>) -> Result<SolverConfig> {
        let label = solver_override.unwrap_or(&self.solver.name);
        let solver: MilpSolverKind = label.parse()?;
        Ok(SolverConfig {
            solver,
            integrality_tolerance: self.solver.integrality_tolerance,
        })
    }

    pub fn formulation_options(&self, activation: Option<TierActivation>) -> FormulationOptions {
        FormulationOptions::new()
            .with_tier_activation(activation.unwrap_or(self.formulation.tier_activation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: DepotConfig = toml::from_str("[formulation]\ntier_activation = \"declare\"\n")
            .unwrap();
        assert_eq!(config.formulation.tier_activation, TierActivation::Declare);
        assert_eq!(config.solver, SolverSection::default());
        assert_eq!(config.solver.name, "microlp");
    }

    #[test]
    fn test_flags_override_file() {
        let config: DepotConfig =
            toml::from_str("[formulation]\ntier_activation = \"enforce-order\"\n").unwrap();
        let options = config.formulation_options(Some(TierActivation::Omit));
        assert_eq!(options.tier_activation, TierActivation::Omit);
        let options = config.formulation_options(None);
        assert_eq!(options.tier_activation, TierActivation::EnforceOrder);
    }

    #[test]
    fn test_unknown_solver_is_rejected() {
        let err = DepotConfig::default()
            .solver_config(Some("cplex"))
            .unwrap_err();
        assert!(err.to_string().contains("supported values"));
    }

    #[test]
    fn test_explicit_missing_file_fails() {
        let err = DepotConfig::load(Some(Path::new("/no/such/depot.toml"))).unwrap_err();
        assert!(format!("{err:#}").contains("reading config file"));
    }
}
