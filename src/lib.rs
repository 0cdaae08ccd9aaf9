/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! # wppf-rs
//!
//! Whole powder pattern fitting for X-ray diffraction data.
//!
//! The crate derives reflection lists from space-group symmetry, synthesises
//! patterns from pseudo-Voigt, split pseudo-Voigt or fundamental-parameters
//! line profiles and refines them against measured data with either the
//! LeBail (free intensities) or the Rietveld (structure-factor intensities)
//! method.

pub mod atoms;
pub mod cli;
pub mod config;
pub mod crystal;
pub mod parameters;
pub mod phases;
pub mod profile;
pub mod refinement;
pub mod spectrum;
pub mod utils;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
