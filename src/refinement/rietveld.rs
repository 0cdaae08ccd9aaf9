/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Rietveld whole-pattern fitting
//!
//! Reflection intensities follow from the structural model:
//! `scale · f/V² · w · m · |F|²` for phase fraction `f`, cell volume `V`,
//! wavelength weight `w` and multiplicity `m`, with the Lorentz-polarisation
//! factor applied per grid point.

use super::binding::{Binding, BindingContext, SiteLabel};
use super::errors::{RefinementError, Result};
use super::fit::{
    add_lattice_parameters, bragg_angle, lattice_from_parameters, refinable_fields, run_solver,
    tolerate_degenerate, updated_lattice, write_back, BoundModel, CycleReport, FitData, FitHistory,
    RefinementOutcome,
};
use super::metrics::FitMetrics;
use super::solver::{BoundedLevenbergMarquardt, LeastSquaresSolver, SolverOptions};
use super::Refinement;
use crate::atoms::{site_labels, AtomSite, Displacement};
use crate::config::RefinementConfig;
use crate::crystal::RietveldMaterial;
use crate::parameters::{
    AtomField, GlobalParam, LatticeField, Parameter, ParameterKey, ParameterSet,
};
use crate::phases::RietveldPhases;
use crate::profile::{PeakShape, ProfileState, SplitProfileState};
use crate::spectrum::{AnchorPointProvider, Spectrum};
use log::{debug, info};
use ndarray::Array1;
use rayon::prelude::*;
use std::sync::Arc;

/// Cached geometry and structure factors of one phase at one wavelength
#[derive(Debug, Clone)]
struct Channel {
    phase: usize,
    wavelength: usize,
    weight: f64,
    /// Bragg angle of every reflection, NaN where unobservable
    tth: Vec<f64>,
    multiplicity: Vec<f64>,
    /// `|F|²` of every reflection
    structure_factors: Vec<f64>,
}

/// Rietveld model over an arbitrary peak shape
pub struct Rietveld<S: PeakShape = ProfileState> {
    data: FitData,
    phases: RietveldPhases,
    shape: S,
    params: ParameterSet,
    zero_error: f64,
    scale: f64,
    channels: Vec<Channel>,
    lorentz_polarization: Array1<f64>,
    simulated: Spectrum,
    metrics: FitMetrics,
    history: FitHistory,
    options: SolverOptions,
    solver: Arc<dyn LeastSquaresSolver>,
}

/// Rietveld model with independent left and right peak widths
pub type RietveldSplit = Rietveld<SplitProfileState>;

impl Rietveld<ProfileState> {
    /// Symmetric pseudo-Voigt Rietveld model
    pub fn new(
        experimental: Spectrum,
        phases: RietveldPhases,
        params: ParameterSet,
        provider: &dyn AnchorPointProvider,
        config: &RefinementConfig,
    ) -> Result<Self> {
        let shape = ProfileState::from_parameters(&params);
        Self::with_shape(experimental, phases, params, shape, provider, config)
    }
}

impl Rietveld<SplitProfileState> {
    /// Split pseudo-Voigt Rietveld model
    pub fn new_split(
        experimental: Spectrum,
        phases: RietveldPhases,
        params: ParameterSet,
        provider: &dyn AnchorPointProvider,
        config: &RefinementConfig,
    ) -> Result<Self> {
        let shape = SplitProfileState::from_parameters(&params);
        Self::with_shape(experimental, phases, params, shape, provider, config)
    }
}

impl<S: PeakShape> Rietveld<S> {
    /// Build a model from an already configured peak shape
    ///
    /// Lattice and atom parameters missing from `params` are added from the
    /// phases; those present are applied to every wavelength channel.
    pub fn with_shape(
        experimental: Spectrum,
        mut phases: RietveldPhases,
        mut params: ParameterSet,
        mut shape: S,
        provider: &dyn AnchorPointProvider,
        config: &RefinementConfig,
    ) -> Result<Self> {
        if phases.is_empty() {
            return Err(RefinementError::NoData("no phases to refine".to_string()));
        }
        let data = FitData::new(experimental, provider, config.background_points)?;

        for (name, channels) in phases.iter_mut() {
            let first = channels
                .first()
                .ok_or_else(|| RefinementError::NoData(format!("phase '{}' has no wavelengths", name)))?;
            add_lattice_parameters(&mut params, name, first.material());
            add_atom_parameters(&mut params, name, first.sites());

            let lp = lattice_from_parameters(&params, name, first.material())?;
            let sites = sites_from_parameters(&params, name, first.sites());
            for material in channels.iter_mut() {
                if lp != material.lattice_parameters() {
                    material.set_lattice_parameters(lp)?;
                }
                for (index, site) in sites.iter().enumerate() {
                    apply_site(material, index, site)?;
                }
            }
        }
        shape.load_parameters(&params);
        let zero_error = params
            .get(GlobalParam::ZeroError.name())
            .map_or(0.0, |p| p.value);
        let scale = params.get(GlobalParam::Scale.name()).map_or(1.0, |p| p.value);

        let weights: Vec<f64> = phases.wavelengths().iter().map(|w| w.weight).collect();
        let mut channels = Vec::new();
        for (phase, (_, materials)) in phases.iter().enumerate() {
            for (wavelength, material) in materials.iter().enumerate() {
                channels.push(Channel {
                    phase,
                    wavelength,
                    weight: weights.get(wavelength).copied().unwrap_or(1.0),
                    tth: positions(material),
                    multiplicity: material.multiplicity().into_iter().map(|m| m as f64).collect(),
                    structure_factors: material.structure_factors()?,
                });
            }
        }

        let lorentz_polarization = lorentz_polarization(data.grid());
        let simulated = data.simulated(Array1::zeros(data.len()))?;
        let mut model = Self {
            data,
            phases,
            shape,
            params,
            zero_error,
            scale,
            channels,
            lorentz_polarization,
            simulated,
            metrics: FitMetrics {
                rwp: f64::INFINITY,
                rexp: f64::INFINITY,
                gof: f64::INFINITY,
            },
            history: FitHistory::default(),
            options: config.solver,
            solver: Arc::new(BoundedLevenbergMarquardt::default()),
        };
        model.compute_spectrum()?;
        model.metrics = model.data.metrics(&model.simulated, 0);
        info!(
            "Rietveld model: {} phases, {} channels",
            model.phases.len(),
            model.channels.len()
        );
        Ok(model)
    }

    pub fn phases(&self) -> &RietveldPhases {
        &self.phases
    }

    pub fn shape(&self) -> &S {
        &self.shape
    }

    pub fn zero_error(&self) -> f64 {
        self.zero_error
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn solver_options(&self) -> SolverOptions {
        self.options
    }

    pub fn set_solver_options(&mut self, options: SolverOptions) {
        self.options = options;
    }

    /// `|F|²` of every reflection of a phase at one wavelength index
    pub fn structure_factors(&self, phase: &str, wavelength: usize) -> Result<&[f64]> {
        let index = self
            .phases
            .names()
            .position(|n| n == phase)
            .ok_or_else(|| RefinementError::UnknownParameter(phase.to_string()))?;
        self.channels
            .iter()
            .find(|c| c.phase == index && c.wavelength == wavelength)
            .map(|c| c.structure_factors.as_slice())
            .ok_or_else(|| {
                RefinementError::DimensionMismatch(format!(
                    "phase '{}' has no wavelength {}",
                    phase, wavelength
                ))
            })
    }

    /// Number of reflections inside the data range, over all channels
    pub fn reflection_count(&self) -> usize {
        let (lo, hi) = self.data.range();
        self.channels
            .iter()
            .flat_map(|c| c.tth.iter())
            .filter(|&&t| t >= lo && t <= hi)
            .count()
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
        let mut lattice = Vec::with_capacity(self.phases.len());
        let mut sites = Vec::with_capacity(self.phases.len());
        for (_, materials) in self.phases.iter() {
            match materials.first() {
                Some(first) => {
                    lattice.push(refinable_fields(first.material()));
                    sites.push(
                        site_labels(first.sites())
                            .into_iter()
                            .zip(first.sites())
                            .map(|(label, site)| SiteLabel {
                                label,
                                anisotropic: site.displacement.is_anisotropic(),
                            })
                            .collect(),
                    );
                }
                None => {
                    lattice.push(Vec::new());
                    sites.push(Vec::new());
                }
            }
        }
        BindingContext {
            phases: self.phases.names().map(str::to_string).collect(),
            profile: self.shape.parameters(),
            scale: true,
            lattice,
            sites,
        }
    }

    fn materials(&self, index: usize) -> Result<&[RietveldMaterial]> {
        self.phases
            .iter()
            .nth(index)
            .map(|(_, m)| m.as_slice())
            .ok_or_else(|| RefinementError::DimensionMismatch(format!("no phase {}", index)))
    }

    fn materials_mut(&mut self, index: usize) -> Result<&mut Vec<RietveldMaterial>> {
        self.phases
            .iter_mut()
            .nth(index)
            .map(|(_, m)| m)
            .ok_or_else(|| RefinementError::DimensionMismatch(format!("no phase {}", index)))
    }

    /// Apply lattice changes to every channel of a phase; `true` if anything moved
    fn update_lattice(&mut self, index: usize, changes: &[(LatticeField, f64)]) -> Result<bool> {
        let first = self
            .materials(index)?
            .first()
            .ok_or_else(|| RefinementError::NoData(format!("phase {} has no wavelengths", index)))?;
        let lp = updated_lattice(first.material(), changes)?;
        if lp == first.lattice_parameters() {
            return Ok(false);
        }
        for material in self.materials_mut(index)?.iter_mut() {
            material.set_lattice_parameters(lp)?;
        }
        Ok(true)
    }

    /// Apply atom changes to every channel of a phase; `true` if anything changed
    fn update_atoms(&mut self, index: usize, changes: &[(usize, AtomField, f64)]) -> Result<bool> {
        let mut sites: Vec<AtomSite> = self
            .materials(index)?
            .first()
            .map(|m| m.sites().to_vec())
            .unwrap_or_default();
        for &(site, field, value) in changes {
            if let Some(s) = sites.get_mut(site) {
                set_field(s, field, value);
            }
        }

        let mut changed = false;
        for material in self.materials_mut(index)?.iter_mut() {
            for (i, site) in sites.iter().enumerate() {
                changed |= apply_site(material, i, site)?;
            }
        }
        Ok(changed)
    }

    /// Recompute Bragg angles and, if requested, structure factors of a phase
    fn refresh_phase(&mut self, index: usize, structure: bool) -> Result<()> {
        let materials = self
            .phases
            .iter()
            .nth(index)
            .map(|(_, m)| m)
            .ok_or_else(|| RefinementError::DimensionMismatch(format!("no phase {}", index)))?;
        for channel in self.channels.iter_mut().filter(|c| c.phase == index) {
            let material = &materials[channel.wavelength];
            channel.tth = positions(material);
            if structure {
                channel.structure_factors = material.structure_factors()?;
            }
        }
        Ok(())
    }

    /// Profiles of every reflection inside the data range, scaled by intensity
    fn peaks(&self) -> Result<Array1<f64>> {
        let grid = self.data.grid();
        let (lo, hi) = self.data.range();
        let mut terms = Vec::new();
        for channel in &self.channels {
            let materials = self.materials(channel.phase)?;
            let material = &materials[channel.wavelength];
            let factor = self.scale * material.phase_fraction() / material.volume().powi(2)
                * channel.weight;
            for ((&t, &m), &f2) in channel
                .tth
                .iter()
                .zip(&channel.multiplicity)
                .zip(&channel.structure_factors)
            {
                if t >= lo && t <= hi {
                    terms.push((t, factor * m * f2));
                }
            }
        }

        let shape = &self.shape;
        let zero_error = self.zero_error;
        let zero = Array1::zeros(grid.len());
        let sum = terms
            .into_par_iter()
            .map(|(t, intensity)| -> Result<Array1<f64>> {
                Ok(shape.profile(t + zero_error, grid)? * intensity)
            })
            .try_reduce(|| zero.clone(), |a, b| Ok(a + b))?;
        Ok(sum * &self.lorentz_polarization)
    }

    fn compute_spectrum(&mut self) -> Result<()> {
        let peaks = self.peaks()?;
        self.simulated = self.data.simulated(peaks)?;
        Ok(())
    }
}

impl<S: PeakShape> BoundModel for Rietveld<S> {
    fn residual_count(&self) -> usize {
        self.data.len()
    }

    fn evaluate(&mut self, bindings: &[Binding], x: &[f64]) -> Result<Vec<f64>> {
        let n = self.phases.len();
        let mut lattice: Vec<Vec<(LatticeField, f64)>> = vec![Vec::new(); n];
        let mut atoms: Vec<Vec<(usize, AtomField, f64)>> = vec![Vec::new(); n];
        for (binding, &value) in bindings.iter().zip(x) {
            match *binding {
                Binding::Profile(param) => {
                    self.shape.set_parameter(param, value);
                }
                Binding::ZeroError => self.zero_error = value,
                Binding::Scale => self.scale = value,
                Binding::Lattice { phase, field } => lattice[phase].push((field, value)),
                Binding::Atom { phase, site, field } => atoms[phase].push((site, field, value)),
            }
        }

        for index in 0..n {
            let moved = if lattice[index].is_empty() {
                false
            } else {
                match tolerate_degenerate(self.update_lattice(index, &lattice[index]), index)? {
                    Some(moved) => moved,
                    None => return Ok(self.data.rejected_residuals()),
                }
            };
            let rebuilt = !atoms[index].is_empty() && self.update_atoms(index, &atoms[index])?;
            if moved || rebuilt {
                self.refresh_phase(index, true)?;
            }
        }
        self.compute_spectrum()?;
        Ok(self.data.residuals(&self.simulated))
    }
}

impl<S: PeakShape> Refinement for Rietveld<S> {
    /// One least-squares step; Rietveld has no intensity extraction
    fn refine_cycle(&mut self) -> Result<CycleReport> {
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

/// `(1 + cos²2θ) / (cos θ · sin²θ)` on the grid
fn lorentz_polarization(grid: &[f64]) -> Array1<f64> {
    grid.iter()
        .map(|&tth| {
            let two_theta = tth.to_radians();
            let theta = 0.5 * two_theta;
            (1.0 + two_theta.cos().powi(2)) / (theta.cos() * theta.sin().powi(2))
        })
        .collect()
}

/// Bragg angle of every reflection at the material's wavelength
fn positions(material: &RietveldMaterial) -> Vec<f64> {
    let m = material.material();
    m.hkls()
        .iter()
        .map(|h| bragg_angle(m, h, material.wavelength_nm()).unwrap_or(f64::NAN))
        .collect()
}

fn atom_key(phase: &str, label: &str, field: AtomField) -> String {
    ParameterKey::Atom {
        phase: phase.to_string(),
        site: label.to_string(),
        field,
    }
    .to_string()
}

/// Add position, occupancy and displacement parameters for every site
fn add_atom_parameters(params: &mut ParameterSet, phase: &str, sites: &[AtomSite]) {
    for (label, site) in site_labels(sites).iter().zip(sites) {
        let mut add = |field: AtomField, value: f64, lb: f64, ub: f64| {
            let name = atom_key(phase, label, field);
            if !params.contains(&name) {
                params.add(Parameter::with_bounds(&name, value, lb, ub, false));
            }
        };
        for (i, field) in [AtomField::X, AtomField::Y, AtomField::Z].into_iter().enumerate() {
            add(field, site.position[i], 0.0, 1.0);
        }
        add(AtomField::Occupancy, site.occupancy, 0.0, 1.0);
        match site.displacement {
            Displacement::Isotropic(u) => add(AtomField::Isotropic, u, 0.0, f64::INFINITY),
            Displacement::Anisotropic(u) => {
                for (i, &value) in u.iter().enumerate() {
                    add(AtomField::Anisotropic(i), value, -1e-3, f64::INFINITY);
                }
            }
        }
    }
}

/// Sites with any values present in `params` applied
fn sites_from_parameters(params: &ParameterSet, phase: &str, sites: &[AtomSite]) -> Vec<AtomSite> {
    site_labels(sites)
        .iter()
        .zip(sites)
        .map(|(label, site)| {
            let mut site = site.clone();
            let mut fields = vec![AtomField::X, AtomField::Y, AtomField::Z, AtomField::Occupancy];
            if site.displacement.is_anisotropic() {
                fields.extend((0..6).map(AtomField::Anisotropic));
            } else {
                fields.push(AtomField::Isotropic);
            }
            for field in fields {
                if let Some(p) = params.get(&atom_key(phase, label, field)) {
                    set_field(&mut site, field, p.value);
                }
            }
            site
        })
        .collect()
}

fn set_field(site: &mut AtomSite, field: AtomField, value: f64) {
    match (field, &mut site.displacement) {
        (AtomField::X, _) => site.position[0] = value,
        (AtomField::Y, _) => site.position[1] = value,
        (AtomField::Z, _) => site.position[2] = value,
        (AtomField::Occupancy, _) => site.occupancy = value,
        (AtomField::Isotropic, Displacement::Isotropic(u)) => *u = value,
        (AtomField::Anisotropic(i), Displacement::Anisotropic(u)) if i < 6 => u[i] = value,
        _ => {}
    }
}

/// Push a site's values into a material where they differ; `true` if any did
fn apply_site(material: &mut RietveldMaterial, index: usize, site: &AtomSite) -> Result<bool> {
    let Some(current) = material.sites().get(index).cloned() else {
        return Err(RefinementError::DimensionMismatch(format!(
            "{} has no site {}",
            material.name(),
            index
        )));
    };
    let mut changed = false;
    if current.position != site.position {
        material.set_site_position(index, site.position)?;
        changed = true;
    }
    if current.occupancy != site.occupancy {
        material.set_site_occupancy(index, site.occupancy)?;
        changed = true;
    }
    if current.displacement != site.displacement {
        material.set_site_displacement(index, site.displacement)?;
        changed = true;
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crystal::{AnomalousTable, Material};
    use crate::phases::Wavelength;
    use crate::spectrum::FixedAnchors;
    use crate::utils::linspace;
    use approx::assert_relative_eq;

    fn ceo2_phases() -> RietveldPhases {
        let wavelength = Wavelength::new("alpha1", 0.15406, 1.0);
        let material =
            Material::new("CeO2", 225, 0, [0.5411, 0.5411, 0.5411, 90.0, 90.0, 90.0], 0.1).unwrap();
        let sites = vec![
            AtomSite::new(58, [0.0, 0.0, 0.0], 1.0, Displacement::Isotropic(5e-5)).unwrap(),
            AtomSite::new(8, [0.25, 0.25, 0.25], 1.0, Displacement::Isotropic(1e-4)).unwrap(),
        ];
        let rietveld =
            RietveldMaterial::new(material, sites, wavelength.energy_kev(), &AnomalousTable::empty())
                .unwrap();
        let mut phases = RietveldPhases::new(vec![wavelength], 0.1).unwrap();
        phases.insert("CeO2", vec![rietveld]);
        phases
    }

    fn narrow_params() -> ParameterSet {
        let mut params = ParameterSet::defaults();
        for (name, value) in [("U", 0.0), ("V", 0.0), ("W", 0.01), ("eta1", 1.0), ("eta2", 0.0), ("eta3", 0.0)] {
            params.set_value(name, value).unwrap();
        }
        params
    }

    fn flat(level: f64) -> (Spectrum, FixedAnchors) {
        let x = linspace(25.0, 60.0, 1401);
        let y = vec![level; x.len()];
        let anchors = FixedAnchors::new(vec![(25.0, level), (60.0, level)]);
        (Spectrum::new(x, y).unwrap(), anchors)
    }

    #[test]
    fn test_atom_parameters_added() {
        let (expt, anchors) = flat(10.0);
        let model = Rietveld::new(expt, ceo2_phases(), narrow_params(), &anchors, &RefinementConfig::default()).unwrap();
        let params = model.parameters();
        for name in ["CeO2_a", "CeO2_Ce1_x", "CeO2_Ce1_occ", "CeO2_O1_z", "CeO2_O1_dw"] {
            assert!(params.contains(name), "{} missing", name);
        }
        assert_relative_eq!(params.value("CeO2_O1_x").unwrap(), 0.25);
        assert_eq!(params.get("CeO2_O1_dw").unwrap().ub, f64::INFINITY);
        assert!(!params.contains("CeO2_O1_U11"));
        assert_eq!(model.reflection_count(), 5);
    }

    #[test]
    fn test_self_consistent_pattern() {
        let (expt, anchors) = flat(10.0);
        let config = RefinementConfig::default();
        let generator = Rietveld::new(expt, ceo2_phases(), narrow_params(), &anchors, &config).unwrap();
        let synthetic = generator.simulated().clone();
        assert!(synthetic.y().iter().cloned().fold(0.0, f64::max) > 10.0);

        let mut model = Rietveld::new(synthetic, ceo2_phases(), narrow_params(), &anchors, &config).unwrap();
        let report = model.refine_cycle().unwrap();
        assert_relative_eq!(report.outcome.rwp, 0.0, epsilon = 1e-10);
        assert_eq!(report.outcome.nfev, 1);
    }

    #[test]
    fn test_user_values_applied() {
        let (expt, anchors) = flat(10.0);
        let mut params = narrow_params();
        params.add(Parameter::with_bounds("CeO2_O1_occ", 0.5, 0.0, 1.0, false));
        let model = Rietveld::new(expt, ceo2_phases(), params, &anchors, &RefinementConfig::default()).unwrap();
        let material = &model.phases().get("CeO2").unwrap()[0];
        assert_relative_eq!(material.sites()[1].occupancy, 0.5);
    }

    #[test]
    fn test_scale_refinement() {
        let (expt, anchors) = flat(10.0);
        let config = RefinementConfig::default();
        let generator = Rietveld::new(expt, ceo2_phases(), narrow_params(), &anchors, &config).unwrap();
        let synthetic = generator.simulated().clone();

        let mut params = narrow_params();
        params.add(Parameter::with_bounds("scale", 0.7, 0.0, 10.0, true));
        let mut model = Rietveld::new(synthetic, ceo2_phases(), params, &anchors, &config).unwrap();
        model.set_solver_options(SolverOptions {
            max_nfev: 30,
            ..SolverOptions::default()
        });
        model.refine_cycle().unwrap();
        assert_relative_eq!(model.parameters().value("scale").unwrap(), 1.0, epsilon = 1e-3);
        assert_relative_eq!(model.scale(), 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_degenerate_trial_cell_is_penalised() {
        let (expt, anchors) = flat(10.0);
        let mut model = Rietveld::new(expt, ceo2_phases(), narrow_params(), &anchors, &RefinementConfig::default()).unwrap();
        let bindings = [Binding::Lattice {
            phase: 0,
            field: LatticeField::A,
        }];

        let valid = model.evaluate(&bindings, &[0.5412]).unwrap();
        let residuals = model.evaluate(&bindings, &[0.0]).unwrap();
        assert!(residuals.iter().all(|&r| r == crate::refinement::fit::REJECTED_RESIDUAL));
        let material = &model.phases().get("CeO2").unwrap()[0];
        assert_relative_eq!(material.lattice_parameters()[0], 0.5412);

        let again = model.evaluate(&bindings, &[0.5412]).unwrap();
        for (a, b) in again.iter().zip(&valid) {
            assert_relative_eq!(*a, *b, epsilon = 1e-9, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_lorentz_polarization() {
        let lp = lorentz_polarization(&[90.0]);
        // θ = 45°: (1 + 0) / (√½ · ½)
        assert_relative_eq!(lp[0], 2.0 * 2.0_f64.sqrt(), epsilon = 1e-12);
    }
}
