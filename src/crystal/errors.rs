/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Error types for the crystal module

use super::lattice::LatticeSystem;
use crate::atoms::AtomError;

/// Error types for crystal symmetry and material setup
#[derive(Debug, thiserror::Error)]
pub enum CrystalError {
    #[error("Unknown space group number: {0}")]
    UnknownSpaceGroup(u16),

    #[error("Space group {number} has no setting {setting}")]
    InvalidSetting { number: u16, setting: usize },

    #[error("Unknown lattice centering: {0}")]
    UnknownCentering(char),

    #[error("Symmetry code '{code}' is not valid in direction {direction} of a {system} lattice")]
    UnknownSymmetryCode {
        code: String,
        direction: usize,
        system: LatticeSystem,
    },

    #[error("Invalid Hall symbol: {0}")]
    HallSymbol(String),

    #[error("Material not found: {0}")]
    MaterialNotFound(String),

    #[error("Invalid lattice parameters: {0}")]
    InvalidLattice(String),

    #[error("Site index {index} out of range for {count} sites")]
    InvalidSite { index: usize, count: usize },

    #[error("Atom error: {0}")]
    Atom(#[from] AtomError),

    #[error("Invalid scattering table: {0}")]
    ScatteringTable(String),

    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for crystal operations
pub type Result<T> = std::result::Result<T, CrystalError>;
