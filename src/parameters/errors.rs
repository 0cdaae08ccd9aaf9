/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Error types for refinement parameters

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParameterError {
    #[error("Parameter not found: {0}")]
    NotFound(String),

    #[error("Invalid parameter entry '{name}': {reason}")]
    InvalidEntry { name: String, reason: String },

    #[error("Length mismatch in bulk add: {0}")]
    LengthMismatch(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ParameterError>;
