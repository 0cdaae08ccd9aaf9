/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Refinement configuration
//!
//! Everything here has a sensible default so that a refinement can be run
//! without a configuration file. A JSON file only needs to name the fields
//! it changes.

use crate::phases::Wavelength;
use crate::utils::constants::DEFAULT_DMIN_NM;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Termination settings for the least-squares solver
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Maximum number of residual evaluations
    pub max_nfev: usize,
    /// Relative reduction of the cost below which the solver stops
    pub ftol: f64,
    /// Relative step size below which the solver stops
    pub xtol: f64,
    /// Gradient norm below which the solver stops
    pub gtol: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_nfev: 8,
            ftol: 1e-4,
            xtol: 1e-4,
            gtol: 1e-4,
        }
    }
}

/// Instrument settings for fundamental-parameters profiles
///
/// Lengths are in metres and angles in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FpaConfig {
    pub window_width_deg: f64,
    pub output_points_synthesis: usize,
    pub output_points_extraction: usize,
    pub diffractometer_radius_synthesis: f64,
    pub diffractometer_radius_extraction: f64,
    pub equatorial_divergence_deg: f64,
    /// Linear absorption coefficient in 1/m
    pub absorption_coefficient: f64,
    pub sample_thickness: f64,
    pub si_psd_window: (f64, f64),
    pub dominant_wavelength: f64,
    /// Evaluation budget of one FPA refinement cycle
    pub max_nfev: usize,
}

impl Default for FpaConfig {
    fn default() -> Self {
        Self {
            window_width_deg: 25.0,
            output_points_synthesis: 1000,
            output_points_extraction: 500,
            diffractometer_radius_synthesis: 89e-3,
            diffractometer_radius_extraction: 217.5e-3,
            equatorial_divergence_deg: 1.0,
            absorption_coefficient: 8.0e4,
            sample_thickness: 1e-3,
            si_psd_window: (0.0, 2.5e-3),
            dominant_wavelength: 0.52368e-10,
            max_nfev: 100,
        }
    }
}

/// Settings shared by all refinement models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinementConfig {
    /// Smallest d-spacing (nm) for reflection generation
    pub dmin: f64,
    pub wavelengths: Vec<Wavelength>,
    pub solver: SolverOptions,
    /// Number of anchor points for the background fit
    pub background_points: usize,
    pub fpa: FpaConfig,
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            dmin: DEFAULT_DMIN_NM,
            wavelengths: Wavelength::defaults(),
            solver: SolverOptions::default(),
            background_points: 8,
            fpa: FpaConfig::default(),
        }
    }
}

impl RefinementConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dmin.is_nan() || self.dmin <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "dmin must be positive, got {}",
                self.dmin
            )));
        }
        if self.wavelengths.is_empty() {
            return Err(ConfigError::Invalid("no wavelengths given".to_string()));
        }
        if let Some(w) = self.wavelengths.iter().find(|w| w.value_nm <= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "wavelength '{}' must be positive",
                w.name
            )));
        }
        if self.background_points < 2 {
            return Err(ConfigError::Invalid(
                "background needs at least two anchor points".to_string(),
            ));
        }
        if self.solver.max_nfev == 0 || self.fpa.max_nfev == 0 {
            return Err(ConfigError::Invalid(
                "max_nfev must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Solver settings for fundamental-parameters refinements
    pub fn fpa_solver(&self) -> SolverOptions {
        SolverOptions {
            max_nfev: self.fpa.max_nfev,
            ..self.solver
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = RefinementConfig::default();
        assert_relative_eq!(config.dmin, 0.05);
        assert_eq!(config.wavelengths.len(), 2);
        assert_eq!(config.solver.max_nfev, 8);
        assert_eq!(config.fpa_solver().max_nfev, 100);
        assert_relative_eq!(config.fpa.si_psd_window.1, 2.5e-3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"dmin": 0.08, "solver": {{"max_nfev": 20}}, "wavelengths": [{{"name": "kev80", "wavelength_nm": 0.0154980}}]}}"#
        )
        .unwrap();
        let config = RefinementConfig::from_file(file.path()).unwrap();
        assert_relative_eq!(config.dmin, 0.08);
        assert_eq!(config.solver.max_nfev, 20);
        assert_relative_eq!(config.solver.ftol, 1e-4);
        assert_eq!(config.wavelengths.len(), 1);
        assert_relative_eq!(config.wavelengths[0].weight, 1.0);
        assert_eq!(config.background_points, 8);
    }

    #[test]
    fn test_invalid_values() {
        assert!(RefinementConfig::from_json_str(r#"{"dmin": -1.0}"#).is_err());
        assert!(RefinementConfig::from_json_str(r#"{"wavelengths": []}"#).is_err());
        assert!(RefinementConfig::from_json_str(r#"{"background_points": 1}"#).is_err());
    }
}
