/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Diffraction spectra and their backgrounds

pub mod background;
pub mod errors;
#[allow(clippy::module_inception)]
pub mod spectrum;

pub use background::{AnchorPointProvider, Background, FixedAnchors, MinimumAnchors};
pub use errors::{Result, SpectrumError};
pub use spectrum::Spectrum;
