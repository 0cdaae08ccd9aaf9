/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Utility functions shared across the refinement code
//!
//! Physical constants, unit conversions and the numeric helpers used for
//! spectra and line profiles.

pub mod constants;
pub mod conversions;
pub mod errors;
pub mod math;
pub mod spline;

pub use conversions::{angstrom_to_nm, kev_to_nm, nm_to_angstrom, nm_to_kev};
pub use errors::{Result, UtilsError};
pub use math::{
    convolve, convolve_same, gaussian_filter1d, interp, interp_many, linear_interpolate,
    linspace, trapz, trapz_unit,
};
pub use spline::CubicSpline;
