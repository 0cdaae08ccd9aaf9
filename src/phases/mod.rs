/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Phase collections and source wavelengths

pub mod collection;
pub mod errors;
pub mod wavelength;

pub use collection::{read_roster, LeBailPhases, Phases, RietveldPhases};
pub use errors::{PhaseError, Result};
pub use wavelength::Wavelength;
