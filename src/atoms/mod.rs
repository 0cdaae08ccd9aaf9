/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Atomic data
//!
//! Element lookup, coherent scattering coefficients and the atom sites that
//! make up a crystal's asymmetric unit.

pub mod database;
pub mod errors;
pub mod site;

pub use database::{
    atomic_number_from_symbol, element_symbol, form_factor_coefficients, FormFactorCoefficients,
};
pub use errors::{AtomError, Result};
pub use site::{site_labels, AtomSite, Displacement};
