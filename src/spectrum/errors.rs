/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Error types for spectra and backgrounds

use crate::utils::UtilsError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpectrumError {
    #[error("Background does not overlap spectrum '{0}'")]
    BackgroundNotInRange(String),

    #[error("Spectra do not overlap: '{0}'")]
    NoOverlap(String),

    #[error("Invalid spectrum data: {0}")]
    InvalidData(String),

    #[error("Parse error in {file} line {line}: {message}")]
    Parse {
        file: String,
        line: usize,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Numeric error: {0}")]
    Numeric(#[from] UtilsError),
}

pub type Result<T> = std::result::Result<T, SpectrumError>;
