/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Error types for peak-shape evaluation

use crate::utils::UtilsError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Numeric error: {0}")]
    Numeric(#[from] UtilsError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error in {file} at line {line}: {message}")]
    Parse {
        file: String,
        line: usize,
        message: String,
    },

    #[error("Invalid flux data: {0}")]
    InvalidFlux(String),

    #[error("Invalid profile parameter: {0}")]
    Parameter(String),
}

pub type Result<T> = std::result::Result<T, ProfileError>;
