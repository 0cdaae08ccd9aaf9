/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Pieces shared by every refinement model
//!
//! [`FitData`] holds the experimental pattern, its fitted background and the
//! counting-statistics weights. [`FitHistory`] records Rwp and gof per cycle.
//! The solver adapter in this module lets any model that can evaluate its
//! residuals for a set of bindings be driven by a [`LeastSquaresSolver`].

use super::binding::{solver_inputs, Binding, BoundParameter};
use super::errors::{RefinementError, Result};
use super::metrics::{weighted_residuals, weights, FitMetrics};
use super::solver::{LeastSquaresSolver, ResidualProblem, SolverOptions, SolverReport};
use crate::crystal::{CrystalError, Hkl, Material};
use crate::parameters::{LatticeField, Parameter, ParameterSet};
use crate::spectrum::{AnchorPointProvider, Background, Spectrum};
use log::{info, warn};
use ndarray::Array1;
use serde::Serialize;
use std::fmt;

/// Residual given to every point while a trial cell is degenerate
pub(crate) const REJECTED_RESIDUAL: f64 = 1.0e10;

/// Experimental pattern, background and weights on a common grid
#[derive(Debug, Clone)]
pub struct FitData {
    experimental: Spectrum,
    background: Spectrum,
    grid: Vec<f64>,
    observed: Vec<f64>,
    weights: Vec<f64>,
}

impl FitData {
    /// Fit the background and compute weights for an experimental pattern
    pub fn new(
        experimental: Spectrum,
        provider: &dyn AnchorPointProvider,
        background_points: usize,
    ) -> Result<Self> {
        let (grid, observed) = experimental.data()?;
        if grid.len() < 2 {
            return Err(RefinementError::NoData(format!(
                "spectrum '{}' has {} points",
                experimental.name(),
                grid.len()
            )));
        }
        let working = Spectrum::with_name(grid.clone(), observed.clone(), experimental.name())?;
        let background = Background::fit(&working, provider, background_points)?;
        let weights = weights(&observed);
        Ok(Self {
            experimental,
            background,
            grid,
            observed,
            weights,
        })
    }

    pub fn experimental(&self) -> &Spectrum {
        &self.experimental
    }

    pub fn background(&self) -> &Spectrum {
        &self.background
    }

    pub fn grid(&self) -> &[f64] {
        &self.grid
    }

    pub fn observed(&self) -> &[f64] {
        &self.observed
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    /// First and last grid point
    pub fn range(&self) -> (f64, f64) {
        (self.grid[0], self.grid[self.grid.len() - 1])
    }

    /// Peaks plus background as a spectrum on the grid
    pub fn simulated(&self, peaks: Array1<f64>) -> Result<Spectrum> {
        let y: Vec<f64> = peaks
            .iter()
            .zip(self.background.y())
            .map(|(p, b)| p + b)
            .collect();
        Ok(Spectrum::with_name(self.grid.clone(), y, "simulated")?)
    }

    pub fn residuals(&self, simulated: &Spectrum) -> Vec<f64> {
        weighted_residuals(&self.weights, simulated.y(), &self.observed)
    }

    /// Uniformly large residuals for a trial point the model cannot build
    pub fn rejected_residuals(&self) -> Vec<f64> {
        vec![REJECTED_RESIDUAL; self.len()]
    }

    pub fn metrics(&self, simulated: &Spectrum, n_params: usize) -> FitMetrics {
        FitMetrics::compute(
            &self.grid,
            simulated.y(),
            &self.observed,
            &self.weights,
            n_params,
        )
    }
}

/// Rwp and gof recorded after every cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FitHistory {
    niter: usize,
    rwp: Vec<f64>,
    gof: Vec<f64>,
}

impl FitHistory {
    /// Append one cycle and return its number
    pub fn record(&mut self, rwp: f64, gof: f64) -> usize {
        self.niter += 1;
        self.rwp.push(rwp);
        self.gof.push(gof);
        self.niter
    }

    pub fn niter(&self) -> usize {
        self.niter
    }

    pub fn rwp_history(&self) -> &[f64] {
        &self.rwp
    }

    pub fn gof_history(&self) -> &[f64] {
        &self.gof
    }

    /// Record a finished cycle and log its summary line
    pub(crate) fn finish_cycle(&mut self, outcome: RefinementOutcome) -> CycleReport {
        if !outcome.converged {
            warn!(
                "Solver stopped without converging ({}) after {} evaluations",
                outcome.status, outcome.nfev
            );
        }
        let iteration = self.record(outcome.rwp, outcome.gof);
        let report = CycleReport { iteration, outcome };
        info!("{}", report);
        report
    }
}

/// Result of one solver run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefinementOutcome {
    pub converged: bool,
    pub status: String,
    pub nfev: usize,
    pub rwp: f64,
    pub gof: f64,
}

/// Result of one refinement cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub iteration: usize,
    pub outcome: RefinementOutcome,
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Finished iteration. Rwp: {:.3} % goodness of fit: {:.3}",
            self.outcome.rwp * 100.0,
            self.outcome.gof
        )
    }
}

/// A model whose weighted residuals depend on a set of bound parameters
pub(crate) trait BoundModel {
    fn residual_count(&self) -> usize;

    /// Apply trial values to the bound state and return weighted residuals
    fn evaluate(&mut self, bindings: &[Binding], x: &[f64]) -> Result<Vec<f64>>;
}

struct ModelProblem<'a, M: BoundModel> {
    model: &'a mut M,
    bindings: &'a [Binding],
}

impl<M: BoundModel> ResidualProblem for ModelProblem<'_, M> {
    fn residual_count(&self) -> usize {
        self.model.residual_count()
    }

    fn residuals(&mut self, x: &[f64]) -> Result<Vec<f64>> {
        self.model.evaluate(self.bindings, x)
    }
}

/// Minimise a model over its bound parameters and leave it at the solution
pub(crate) fn run_solver<M: BoundModel>(
    model: &mut M,
    bound: &[BoundParameter],
    solver: &dyn LeastSquaresSolver,
    options: &SolverOptions,
) -> Result<SolverReport> {
    let (bindings, x0, lower, upper) = solver_inputs(bound);
    let report = {
        let mut problem = ModelProblem {
            model: &mut *model,
            bindings: &bindings,
        };
        solver.minimize(&mut problem, &x0, &lower, &upper, options)?
    };
    model.evaluate(&bindings, &report.x)?;
    Ok(report)
}

/// Map a degenerate trial cell to `None` so the solver sees a bad step
///
/// Every other error is passed through.
pub(crate) fn tolerate_degenerate<T>(result: Result<T>, phase: usize) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(RefinementError::Crystal(CrystalError::InvalidLattice(reason))) => {
            warn!("Rejecting trial lattice of phase {}: {}", phase, reason);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Copy converged values back into the parameter set
pub(crate) fn write_back(
    params: &mut ParameterSet,
    bound: &[BoundParameter],
    x: &[f64],
) -> Result<()> {
    for (b, &v) in bound.iter().zip(x) {
        params.set_value(&b.name, v)?;
    }
    Ok(())
}

/// Add `phase_a`, `phase_c`, ... for the independent lattice parameters
///
/// Existing entries are kept so that values from a parameter file win.
pub(crate) fn add_lattice_parameters(params: &mut ParameterSet, phase: &str, material: &Material) {
    for (name, value) in material.refinable_lattice_parameters() {
        let full = format!("{}_{}", phase, name);
        if params.contains(&full) {
            continue;
        }
        let delta = if value < 10.0 { 0.05 } else { 1.0 };
        params.add(Parameter::with_bounds(
            &full,
            value,
            value - delta,
            value + delta,
            false,
        ));
    }
}

/// Independent lattice parameters of a phase as stored in `params`
pub(crate) fn lattice_from_parameters(
    params: &ParameterSet,
    phase: &str,
    material: &Material,
) -> Result<[f64; 6]> {
    let values = material
        .refinable_lattice_parameters()
        .into_iter()
        .map(|(name, value)| {
            params
                .get(&format!("{}_{}", phase, name))
                .map_or(value, |p| p.value)
        })
        .collect::<Vec<f64>>();
    Ok(material.required_lattice_parameters(&values)?)
}

/// Lattice parameters after replacing some independent fields
pub(crate) fn updated_lattice(
    material: &Material,
    changes: &[(LatticeField, f64)],
) -> Result<[f64; 6]> {
    let lp = material.lattice_parameters();
    let values = material
        .lattice_system()
        .refinable_indices()
        .iter()
        .map(|&i| {
            changes
                .iter()
                .rev()
                .find(|(f, _)| f.index() == i)
                .map_or(lp[i], |&(_, v)| v)
        })
        .collect::<Vec<f64>>();
    Ok(material.required_lattice_parameters(&values)?)
}

/// Independent lattice fields of a phase
pub(crate) fn refinable_fields(material: &Material) -> Vec<LatticeField> {
    material
        .lattice_system()
        .refinable_indices()
        .iter()
        .filter_map(|&i| LatticeField::from_index(i))
        .collect()
}

/// Bragg angle `2θ` in degrees, or `None` if unobservable at this wavelength
pub(crate) fn bragg_angle(material: &Material, hkl: &Hkl, wavelength_nm: f64) -> Option<f64> {
    let sin_theta = material.lattice().g_length(hkl) * wavelength_nm / 2.0;
    (sin_theta.abs() <= 1.0).then(|| 2.0 * sin_theta.asin().to_degrees())
}
