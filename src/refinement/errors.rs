/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Error types for refinement models and the least-squares solver

use crate::config::ConfigError;
use crate::crystal::CrystalError;
use crate::parameters::ParameterError;
use crate::phases::PhaseError;
use crate::profile::ProfileError;
use crate::spectrum::SpectrumError;
use crate::utils::UtilsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RefinementError {
    #[error("Unknown or unusable parameter: {0}")]
    UnknownParameter(String),

    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("No data: {0}")]
    NoData(String),

    #[error("Solver error: {0}")]
    Solver(String),

    #[error("Spectrum error: {0}")]
    Spectrum(#[from] SpectrumError),

    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    #[error("Crystal error: {0}")]
    Crystal(#[from] CrystalError),

    #[error("Phase error: {0}")]
    Phase(#[from] PhaseError),

    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Numeric error: {0}")]
    Numeric(#[from] UtilsError),
}

pub type Result<T> = std::result::Result<T, RefinementError>;
