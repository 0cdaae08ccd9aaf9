/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Error types for the atoms module

/// Error types for the atoms module
#[derive(Debug, thiserror::Error)]
pub enum AtomError {
    #[error("Invalid atomic number: {0}")]
    InvalidAtomicNumber(u32),

    #[error("Unknown element symbol: {0}")]
    UnknownElement(String),

    #[error("No coherent scattering data for element {0}")]
    MissingScatteringData(String),

    #[error("Atom site needs either an element symbol or an atomic number")]
    MissingElement,
}

/// Result type for atom operations
pub type Result<T> = std::result::Result<T, AtomError>;
