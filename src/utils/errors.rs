/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Error types for the utils module

use thiserror::Error;

/// Errors that can occur in the numeric helpers
#[derive(Error, Debug)]
pub enum UtilsError {
    /// Generic error with a message
    #[error("Utility error: {0}")]
    Generic(String),

    /// Input arrays do not have matching lengths
    #[error("Length mismatch: {0} vs {1}")]
    LengthMismatch(usize, usize),

    /// Interpolation abscissae are not strictly increasing
    #[error("Abscissae must be strictly increasing (violated at index {0})")]
    NotIncreasing(usize),

    /// Not enough points for the requested operation
    #[error("Need at least {needed} points, got {got}")]
    TooFewPoints { needed: usize, got: usize },
}

/// A specialized Result type for utils operations
pub type Result<T> = std::result::Result<T, UtilsError>;
