/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Switching groups of parameters on and off
//!
//! Every toggle returns the number of parameters it touched. Label toggles
//! fail when no site of any phase carries the label.

use super::errors::{RefinementError, Result};
use super::Refinement;
use crate::parameters::{AtomField, GlobalParam, ParameterKey};

const CAGLIOTTI: [GlobalParam; 12] = [
    GlobalParam::U,
    GlobalParam::V,
    GlobalParam::W,
    GlobalParam::P,
    GlobalParam::Ul,
    GlobalParam::Vl,
    GlobalParam::Wl,
    GlobalParam::Pl,
    GlobalParam::Ur,
    GlobalParam::Vr,
    GlobalParam::Wr,
    GlobalParam::Pr,
];

const LORENTZ: [GlobalParam; 6] = [
    GlobalParam::X,
    GlobalParam::Y,
    GlobalParam::Xl,
    GlobalParam::Yl,
    GlobalParam::Xr,
    GlobalParam::Yr,
];

const MIXING: [GlobalParam; 3] = [GlobalParam::Eta1, GlobalParam::Eta2, GlobalParam::Eta3];

const EMISSION: [GlobalParam; 3] = [
    GlobalParam::GaussWidth,
    GlobalParam::LorWidth,
    GlobalParam::CrystalliteSize,
];

/// Bulk vary flags on any refinement model
pub trait VaryToggles: Refinement {
    fn vary_all(&mut self, vary: bool) -> usize {
        let params = self.parameters_mut();
        params.vary_all(vary);
        params.len()
    }

    /// U, V, W and the split U, V, W, P branches
    fn vary_cagliotti(&mut self, vary: bool) -> usize {
        toggle(self, vary, |key| matches!(key, ParameterKey::Global(g) if CAGLIOTTI.contains(g)))
    }

    /// X, Y and their split counterparts
    fn vary_lorentz(&mut self, vary: bool) -> usize {
        toggle(self, vary, |key| matches!(key, ParameterKey::Global(g) if LORENTZ.contains(g)))
    }

    fn vary_mixing(&mut self, vary: bool) -> usize {
        toggle(self, vary, |key| matches!(key, ParameterKey::Global(g) if MIXING.contains(g)))
    }

    /// Emission widths and crystallite size of FPA models
    fn vary_emission(&mut self, vary: bool) -> usize {
        toggle(self, vary, |key| matches!(key, ParameterKey::Global(g) if EMISSION.contains(g)))
    }

    fn vary_zero_error(&mut self, vary: bool) -> usize {
        toggle(self, vary, |key| *key == ParameterKey::Global(GlobalParam::ZeroError))
    }

    fn vary_scale(&mut self, vary: bool) -> usize {
        toggle(self, vary, |key| *key == ParameterKey::Global(GlobalParam::Scale))
    }

    /// Lattice parameters of every phase
    fn vary_lattice(&mut self, vary: bool) -> usize {
        toggle(self, vary, |key| matches!(key, ParameterKey::Lattice { .. }))
    }

    fn vary_phase_lattice(&mut self, phase: &str, vary: bool) -> Result<usize> {
        if !self.phase_names().iter().any(|p| p == phase) {
            return Err(RefinementError::UnknownParameter(phase.to_string()));
        }
        Ok(toggle(self, vary, |key| {
            matches!(key, ParameterKey::Lattice { phase: p, .. } if p == phase)
        }))
    }

    /// Displacement parameters of every site, or only those of `label`
    fn vary_displacement(&mut self, label: Option<&str>, vary: bool) -> Result<usize> {
        toggle_sites(self, label, vary, AtomField::is_displacement)
    }

    fn vary_occupancy(&mut self, label: Option<&str>, vary: bool) -> Result<usize> {
        toggle_sites(self, label, vary, |f| *f == AtomField::Occupancy)
    }

    fn vary_positions(&mut self, label: Option<&str>, vary: bool) -> Result<usize> {
        toggle_sites(self, label, vary, AtomField::is_position)
    }
}

impl<T: Refinement + ?Sized> VaryToggles for T {}

fn toggle<M, F>(model: &mut M, vary: bool, predicate: F) -> usize
where
    M: Refinement + ?Sized,
    F: Fn(&ParameterKey) -> bool,
{
    let phases = model.phase_names();
    let phases: Vec<&str> = phases.iter().map(String::as_str).collect();
    model.parameters_mut().vary_matching(
        |name| ParameterKey::parse(name, &phases).is_some_and(|key| predicate(&key)),
        vary,
    )
}

fn toggle_sites<M, F>(model: &mut M, label: Option<&str>, vary: bool, field: F) -> Result<usize>
where
    M: Refinement + ?Sized,
    F: Fn(&AtomField) -> bool,
{
    let count = toggle(model, vary, |key| match key {
        ParameterKey::Atom { site, field: f, .. } => {
            field(f) && label.map_or(true, |l| l == site)
        }
        _ => false,
    });
    match label {
        Some(l) if count == 0 => Err(RefinementError::MissingParameter(format!(
            "no site labelled '{}'",
            l
        ))),
        _ => Ok(count),
    }
}
