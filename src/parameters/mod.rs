/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Refinement parameters
//!
//! Every refinable quantity lives in a [`ParameterSet`] under a flat name.
//! [`ParameterKey`] gives those names structure.

pub mod errors;
pub mod keys;
pub mod parameter;
pub mod set;

pub use errors::{ParameterError, Result};
pub use keys::{AtomField, GlobalParam, LatticeField, ParameterKey, ANISOTROPIC_NAMES};
pub use parameter::Parameter;
pub use set::ParameterSet;
