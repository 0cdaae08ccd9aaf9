/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Refinement models
//!
//! A model owns the experimental data, its phases and the parameter set.
//! Each call to [`Refinement::refine_cycle`] resolves the varying parameters
//! into [`Binding`]s, hands them to a [`LeastSquaresSolver`] and copies the
//! converged values back into the parameter set.
//!
//! ```no_run
//! use wppf_rs::config::RefinementConfig;
//! use wppf_rs::parameters::ParameterSet;
//! use wppf_rs::phases::LeBailPhases;
//! use wppf_rs::refinement::{LeBail, Refinement, VaryToggles};
//! use wppf_rs::spectrum::{MinimumAnchors, Spectrum};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let spectrum = Spectrum::from_file("ceo2.xy")?;
//! let mut phases = LeBailPhases::with_defaults();
//! phases.load("phases.json")?;
//! let config = RefinementConfig::default();
//! let mut model = LeBail::new(spectrum, phases, ParameterSet::defaults(), &MinimumAnchors, &config)?;
//! model.vary_cagliotti(true);
//! for _ in 0..5 {
//!     model.refine_cycle()?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod binding;
pub mod errors;
pub mod fit;
pub mod lebail;
pub mod lebail_fpa;
pub mod metrics;
pub mod rietveld;
pub mod solver;
pub mod toggles;

pub use binding::{Binding, BindingContext, BoundParameter};
pub use errors::{RefinementError, Result};
pub use fit::{CycleReport, FitData, FitHistory, RefinementOutcome};
pub use lebail::{LeBail, LeBailSplit};
pub use lebail_fpa::LeBailFpa;
pub use metrics::FitMetrics;
pub use rietveld::{Rietveld, RietveldSplit};
pub use solver::{
    BoundedLevenbergMarquardt, LeastSquaresSolver, ResidualProblem, SolverOptions, SolverReport,
};
pub use toggles::VaryToggles;

use crate::parameters::ParameterSet;
use crate::spectrum::Spectrum;
use std::sync::Arc;

/// Common surface of every refinement model
pub trait Refinement {
    /// Run one refinement cycle and record its figures of merit
    fn refine_cycle(&mut self) -> Result<CycleReport>;

    fn parameters(&self) -> &ParameterSet;

    /// Mutable access for changing vary flags and bounds
    fn parameters_mut(&mut self) -> &mut ParameterSet;

    fn phase_names(&self) -> Vec<String>;

    fn experimental(&self) -> &Spectrum;

    fn background(&self) -> &Spectrum;

    /// Simulated pattern including background
    fn simulated(&self) -> &Spectrum;

    fn history(&self) -> &FitHistory;

    /// Figures of merit of the current simulated pattern
    fn metrics(&self) -> FitMetrics;

    fn set_solver(&mut self, solver: Arc<dyn LeastSquaresSolver>);
}
