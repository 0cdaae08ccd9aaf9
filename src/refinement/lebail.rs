/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! LeBail whole-pattern fitting
//!
//! Each reflection carries a free intensity. A cycle first repartitions the
//! observed pattern among overlapping reflections, adopts the extracted
//! values as the new calculated intensities and then refines peak shape,
//! zero error and lattice parameters by least squares.

use super::binding::{Binding, BindingContext};
use super::errors::{RefinementError, Result};
use super::fit::{
    add_lattice_parameters, bragg_angle, lattice_from_parameters, refinable_fields, run_solver,
    tolerate_degenerate, updated_lattice, write_back, BoundModel, CycleReport, FitData, FitHistory,
    RefinementOutcome,
};
use super::metrics::FitMetrics;
use super::solver::{BoundedLevenbergMarquardt, LeastSquaresSolver, SolverOptions};
use super::Refinement;
use crate::config::RefinementConfig;
use crate::crystal::{Hkl, Material};
use crate::parameters::{GlobalParam, LatticeField, ParameterSet};
use crate::phases::{LeBailPhases, Wavelength};
use crate::profile::{PeakShape, ProfileState, SplitProfileState};
use crate::spectrum::{AnchorPointProvider, Spectrum};
use crate::utils::trapz;
use log::{debug, info};
use ndarray::Array1;
use rayon::prelude::*;
use std::sync::Arc;

/// Starting intensity of every reflection
const INITIAL_INTENSITY: f64 = 1000.0;

/// Simulated intensities below this are excluded from the partition
const MIN_SIMULATED: f64 = 1e-12;

/// Reflections of one phase at one wavelength that fall inside the data range
#[derive(Debug, Clone)]
struct ReflectionSet {
    phase: usize,
    wavelength_nm: f64,
    /// Indices into the phase's reflection list
    indices: Vec<usize>,
    tth: Vec<f64>,
    intensities: Vec<f64>,
}

/// LeBail model over an arbitrary peak shape
pub struct LeBail<S: PeakShape = ProfileState> {
    data: FitData,
    phases: LeBailPhases,
    wavelengths: Vec<Wavelength>,
    shape: S,
    params: ParameterSet,
    zero_error: f64,
    reflections: Vec<ReflectionSet>,
    simulated: Spectrum,
    metrics: FitMetrics,
    history: FitHistory,
    options: SolverOptions,
    solver: Arc<dyn LeastSquaresSolver>,
}

/// LeBail model with independent left and right peak widths
pub type LeBailSplit = LeBail<SplitProfileState>;

impl LeBail<ProfileState> {
    /// Symmetric pseudo-Voigt LeBail model
    pub fn new(
        experimental: Spectrum,
        phases: LeBailPhases,
        params: ParameterSet,
        provider: &dyn AnchorPointProvider,
        config: &RefinementConfig,
    ) -> Result<Self> {
        let shape = ProfileState::from_parameters(&params);
        let wavelengths = phases.wavelengths().to_vec();
        Self::with_shape(
            experimental,
            phases,
            params,
            shape,
            wavelengths,
            provider,
            config,
            config.solver,
        )
    }
}

impl LeBail<SplitProfileState> {
    /// Split pseudo-Voigt LeBail model
    pub fn new_split(
        experimental: Spectrum,
        phases: LeBailPhases,
        params: ParameterSet,
        provider: &dyn AnchorPointProvider,
        config: &RefinementConfig,
    ) -> Result<Self> {
        let shape = SplitProfileState::from_parameters(&params);
        let wavelengths = phases.wavelengths().to_vec();
        Self::with_shape(
            experimental,
            phases,
            params,
            shape,
            wavelengths,
            provider,
            config,
            config.solver,
        )
    }
}

impl<S: PeakShape> LeBail<S> {
    /// Build a model from an already configured peak shape
    ///
    /// Lattice parameters missing from `params` are added from the phases;
    /// those present are applied to the phases before reflections are
    /// placed.
    #[allow(clippy::too_many_arguments)]
    pub fn with_shape(
        experimental: Spectrum,
        mut phases: LeBailPhases,
        mut params: ParameterSet,
        mut shape: S,
        wavelengths: Vec<Wavelength>,
        provider: &dyn AnchorPointProvider,
        config: &RefinementConfig,
        options: SolverOptions,
    ) -> Result<Self> {
        if phases.is_empty() {
            return Err(RefinementError::NoData("no phases to refine".to_string()));
        }
        let data = FitData::new(experimental, provider, config.background_points)?;

        for (name, material) in phases.iter_mut() {
            add_lattice_parameters(&mut params, name, material);
            let lp = lattice_from_parameters(&params, name, material)?;
            if lp != material.lattice_parameters() {
                material.set_lattice_parameters(lp)?;
            }
        }
        shape.load_parameters(&params);
        let zero_error = params
            .get(GlobalParam::ZeroError.name())
            .map_or(0.0, |p| p.value);

        let reflections = reflection_sets(&phases, &wavelengths, data.range());
        let simulated = data.simulated(Array1::zeros(data.len()))?;
        let mut model = Self {
            data,
            phases,
            wavelengths,
            shape,
            params,
            zero_error,
            reflections,
            simulated,
            metrics: FitMetrics {
                rwp: f64::INFINITY,
                rexp: f64::INFINITY,
                gof: f64::INFINITY,
            },
            history: FitHistory::default(),
            options,
            solver: Arc::new(BoundedLevenbergMarquardt::default()),
        };
        model.compute_spectrum()?;
        model.metrics = model.data.metrics(&model.simulated, 0);
        info!(
            "LeBail model: {} phases, {} wavelengths, {} reflections in range",
            model.phases.len(),
            model.wavelengths.len(),
            model.reflection_count()
        );
        Ok(model)
    }

    pub fn phases(&self) -> &LeBailPhases {
        &self.phases
    }

    pub fn shape(&self) -> &S {
        &self.shape
    }

    pub fn wavelengths(&self) -> &[Wavelength] {
        &self.wavelengths
    }

    pub fn zero_error(&self) -> f64 {
        self.zero_error
    }

    pub fn solver_options(&self) -> SolverOptions {
        self.options
    }

    pub fn set_solver_options(&mut self, options: SolverOptions) {
        self.options = options;
    }

    /// Number of reflections contributing to the pattern, over all wavelengths
    pub fn reflection_count(&self) -> usize {
        self.reflections.iter().map(|s| s.indices.len()).sum()
    }

    /// Reflections of one phase per wavelength as `(hkl, 2θ, intensity)`
    pub fn reflections(&self, phase: &str) -> Result<Vec<Vec<(Hkl, f64, f64)>>> {
        let material = self.phases.get(phase)?;
        let index = self.phase_index(phase)?;
        Ok(self
            .reflections
            .iter()
            .filter(|set| set.phase == index)
            .map(|set| {
                set.indices
                    .iter()
                    .zip(set.tth.iter().zip(&set.intensities))
                    .map(|(&i, (&t, &ic))| (material.hkls()[i], t, ic))
                    .collect()
            })
            .collect())
    }

    /// Re-read shape, zero error and lattice parameters after values were edited
    pub fn reload_parameters(&mut self) -> Result<()> {
        self.shape.load_parameters(&self.params);
        self.zero_error = self
            .params
            .get(GlobalParam::ZeroError.name())
            .map_or(0.0, |p| p.value);
        let names: Vec<String> = self.phases.names().map(str::to_string).collect();
        for (index, name) in names.iter().enumerate() {
            let material = self.phases.get(name)?;
            let lp = lattice_from_parameters(&self.params, name, material)?;
            self.set_lattice(index, lp)?;
        }
        self.compute_spectrum()
    }

    /// Repartition the observed intensity among the reflections
    ///
    /// For each reflection the observed pattern is weighted by the share of
    /// the simulated pattern that reflection accounts for and integrated.
    pub fn extract_intensities(&self) -> Result<Vec<Vec<f64>>> {
        let grid = self.data.grid();
        let observed = self.data.observed();
        let simulated = self.simulated.y();
        let shape = &self.shape;
        let zero_error = self.zero_error;

        self.reflections
            .iter()
            .map(|set| {
                set.tth
                    .par_iter()
                    .zip(&set.intensities)
                    .map(|(&t, &ic)| -> Result<f64> {
                        if !t.is_finite() {
                            return Ok(ic);
                        }
                        let profile = shape.extraction_profile(t + zero_error, grid)?;
                        let share: Vec<f64> = profile
                            .iter()
                            .zip(observed.iter().zip(simulated))
                            .map(|(&p, (&yo, &yc))| {
                                if yc.abs() > MIN_SIMULATED {
                                    yo * ic * p / yc
                                } else {
                                    0.0
                                }
                            })
                            .collect();
                        Ok(trapz(&share, grid))
                    })
                    .collect::<Result<Vec<f64>>>()
            })
            .collect()
    }

    /// Run the least-squares step over the varying parameters
    pub fn refine(&mut self) -> Result<RefinementOutcome> {
        let bound = self.binding_context().bind_varying(&self.params)?;
        for b in &bound {
            debug!("refining {} from {}", b.name, b.value);
        }
        let solver = Arc::clone(&self.solver);
        let options = self.options;
        let report = run_solver(self, &bound, solver.as_ref(), &options)?;
        write_back(&mut self.params, &bound, &report.x)?;
        self.metrics = self.data.metrics(&self.simulated, bound.len());
        Ok(RefinementOutcome {
            converged: report.success,
            status: report.status,
            nfev: report.nfev,
            rwp: self.metrics.rwp,
            gof: self.metrics.gof,
        })
    }

    fn binding_context(&self) -> BindingContext {
        BindingContext {
            phases: self.phases.names().map(str::to_string).collect(),
            profile: self.shape.parameters(),
            scale: false,
            lattice: self
                .phases
                .iter()
                .map(|(_, m)| refinable_fields(m))
                .collect(),
            sites: vec![Vec::new(); self.phases.len()],
        }
    }

    fn phase_index(&self, phase: &str) -> Result<usize> {
        self.phases
            .names()
            .position(|n| n == phase)
            .ok_or_else(|| RefinementError::UnknownParameter(phase.to_string()))
    }

    fn material(&self, index: usize) -> Result<&Material> {
        self.phases
            .iter()
            .nth(index)
            .map(|(_, m)| m)
            .ok_or_else(|| RefinementError::DimensionMismatch(format!("no phase {}", index)))
    }

    fn material_mut(&mut self, index: usize) -> Result<&mut Material> {
        self.phases
            .iter_mut()
            .nth(index)
            .map(|(_, m)| m)
            .ok_or_else(|| RefinementError::DimensionMismatch(format!("no phase {}", index)))
    }

    /// Apply new lattice parameters to a phase and move its reflections
    fn set_lattice(&mut self, index: usize, lp: [f64; 6]) -> Result<()> {
        let material = self.material_mut(index)?;
        if lp == material.lattice_parameters() {
            return Ok(());
        }
        material.set_lattice_parameters(lp)?;
        self.update_positions(index)
    }

    /// Recompute the Bragg angles of a phase after a lattice change
    ///
    /// The set of reflections stays fixed so intensities keep their identity.
    fn update_positions(&mut self, index: usize) -> Result<()> {
        let material = self
            .phases
            .iter()
            .nth(index)
            .map(|(_, m)| m)
            .ok_or_else(|| RefinementError::DimensionMismatch(format!("no phase {}", index)))?;
        // Reflections pushed past 90° are kept as NaN and skipped
        for set in self.reflections.iter_mut().filter(|s| s.phase == index) {
            for (t, &i) in set.tth.iter_mut().zip(&set.indices) {
                *t = bragg_angle(material, &material.hkls()[i], set.wavelength_nm).unwrap_or(f64::NAN);
            }
        }
        Ok(())
    }

    /// Sum of every reflection's profile scaled by its intensity
    fn peaks(&self) -> Result<Array1<f64>> {
        let grid = self.data.grid();
        let shape = &self.shape;
        let zero_error = self.zero_error;
        let zero = Array1::zeros(grid.len());
        self.reflections
            .iter()
            .flat_map(|set| set.tth.iter().zip(&set.intensities))
            .collect::<Vec<_>>()
            .into_par_iter()
            .filter(|(t, _)| t.is_finite())
            .map(|(&t, &ic)| -> Result<Array1<f64>> {
                Ok(shape.profile(t + zero_error, grid)? * ic)
            })
            .try_reduce(|| zero.clone(), |a, b| Ok(a + b))
    }

    fn compute_spectrum(&mut self) -> Result<()> {
        let peaks = self.peaks()?;
        self.simulated = self.data.simulated(peaks)?;
        Ok(())
    }
}

impl<S: PeakShape> BoundModel for LeBail<S> {
    fn residual_count(&self) -> usize {
        self.data.len()
    }

    fn evaluate(&mut self, bindings: &[Binding], x: &[f64]) -> Result<Vec<f64>> {
        let mut lattice: Vec<Vec<(LatticeField, f64)>> = vec![Vec::new(); self.phases.len()];
        for (binding, &value) in bindings.iter().zip(x) {
            match *binding {
                Binding::Profile(param) => {
                    self.shape.set_parameter(param, value);
                }
                Binding::ZeroError => self.zero_error = value,
                Binding::Lattice { phase, field } => lattice[phase].push((field, value)),
                Binding::Scale | Binding::Atom { .. } => {
                    return Err(RefinementError::UnknownParameter(format!("{:?}", binding)))
                }
            }
        }
        for (index, changes) in lattice.iter().enumerate() {
            if changes.is_empty() {
                continue;
            }
            let lp = updated_lattice(self.material(index)?, changes)?;
            if tolerate_degenerate(self.set_lattice(index, lp), index)?.is_none() {
                return Ok(self.data.rejected_residuals());
            }
        }
        self.compute_spectrum()?;
        Ok(self.data.residuals(&self.simulated))
    }
}

impl<S: PeakShape> Refinement for LeBail<S> {
    /// Extract intensities, then refine
    fn refine_cycle(&mut self) -> Result<CycleReport> {
        let extracted = self.extract_intensities()?;
        for (set, intensities) in self.reflections.iter_mut().zip(extracted) {
            set.intensities = intensities;
        }
        let outcome = self.refine()?;
        Ok(self.history.finish_cycle(outcome))
    }

    fn parameters(&self) -> &ParameterSet {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut ParameterSet {
        &mut self.params
    }

    fn phase_names(&self) -> Vec<String> {
        self.phases.names().map(str::to_string).collect()
    }

    fn experimental(&self) -> &Spectrum {
        self.data.experimental()
    }

    fn background(&self) -> &Spectrum {
        self.data.background()
    }

    fn simulated(&self) -> &Spectrum {
        &self.simulated
    }

    fn history(&self) -> &FitHistory {
        &self.history
    }

    fn metrics(&self) -> FitMetrics {
        self.metrics
    }

    fn set_solver(&mut self, solver: Arc<dyn LeastSquaresSolver>) {
        self.solver = solver;
    }
}

/// Reflections of every phase and wavelength inside `range`
fn reflection_sets(
    phases: &LeBailPhases,
    wavelengths: &[Wavelength],
    (lo, hi): (f64, f64),
) -> Vec<ReflectionSet> {
    let mut sets = Vec::with_capacity(phases.len() * wavelengths.len());
    for (phase, (_, material)) in phases.iter().enumerate() {
        for wavelength in wavelengths {
            let (tth, mask) = material.two_theta(wavelength.value_nm);
            let observable = mask.iter().enumerate().filter_map(|(i, &ok)| ok.then_some(i));
            let (indices, tth): (Vec<usize>, Vec<f64>) = observable
                .zip(tth)
                .filter(|&(_, t)| t >= lo && t <= hi)
                .unzip();
            debug!(
                "{} at {}: {} reflections in range",
                material.name(),
                wavelength.name,
                indices.len()
            );
            sets.push(ReflectionSet {
                phase,
                wavelength_nm: wavelength.value_nm,
                intensities: vec![INITIAL_INTENSITY; indices.len()],
                indices,
                tth,
            });
        }
    }
    sets
}
