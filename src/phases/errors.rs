/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Error types for phase collections

use crate::crystal::CrystalError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhaseError {
    #[error("Phase not found: {0}")]
    PhaseNotFound(String),

    #[error("Inconsistent wavelengths: {0}")]
    InconsistentWavelengths(String),

    #[error("Crystal error: {0}")]
    Crystal(#[from] CrystalError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, PhaseError>;
