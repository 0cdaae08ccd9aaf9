/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Dispatch from parameter names to model state
//!
//! Before the solver starts, every varying parameter is resolved into a
//! [`Binding`] that says exactly which piece of model state it drives.
//! Names that do not fit the model are rejected here rather than being
//! silently ignored during the fit.

use super::errors::{RefinementError, Result};
use crate::parameters::{AtomField, GlobalParam, LatticeField, ParameterKey, ParameterSet};

/// The model state a parameter drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    Profile(GlobalParam),
    ZeroError,
    Scale,
    Lattice {
        phase: usize,
        field: LatticeField,
    },
    Atom {
        phase: usize,
        site: usize,
        field: AtomField,
    },
}

/// A varying parameter together with its binding and bounds
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParameter {
    pub name: String,
    pub binding: Binding,
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Site label and displacement kind, as used in parameter names
#[derive(Debug, Clone, PartialEq)]
pub struct SiteLabel {
    pub label: String,
    pub anisotropic: bool,
}

/// Everything a model is able to refine
#[derive(Debug, Clone, Default)]
pub struct BindingContext {
    pub phases: Vec<String>,
    /// Profile parameters of the active peak shape
    pub profile: &'static [GlobalParam],
    pub scale: bool,
    /// Independent lattice parameters of each phase
    pub lattice: Vec<Vec<LatticeField>>,
    /// Atom sites of each phase; empty for LeBail models
    pub sites: Vec<Vec<SiteLabel>>,
}

impl BindingContext {
    /// Resolve one parameter name
    pub fn resolve(&self, name: &str) -> Result<Binding> {
        let phases: Vec<&str> = self.phases.iter().map(String::as_str).collect();
        let unknown = || RefinementError::UnknownParameter(name.to_string());
        let key = ParameterKey::parse(name, &phases).ok_or_else(unknown)?;
        let phase_index = |phase: &str| self.phases.iter().position(|p| p == phase);

        match key {
            ParameterKey::Global(GlobalParam::ZeroError) => Ok(Binding::ZeroError),
            ParameterKey::Global(GlobalParam::Scale) if self.scale => Ok(Binding::Scale),
            ParameterKey::Global(g) if self.profile.contains(&g) => Ok(Binding::Profile(g)),
            ParameterKey::Global(_) => Err(unknown()),
            ParameterKey::Lattice { phase, field } => {
                let phase = phase_index(&phase).ok_or_else(unknown)?;
                let refinable = self.lattice.get(phase).ok_or_else(unknown)?;
                if refinable.contains(&field) {
                    Ok(Binding::Lattice { phase, field })
                } else {
                    Err(unknown())
                }
            }
            ParameterKey::Atom { phase, site, field } => {
                let phase = phase_index(&phase).ok_or_else(unknown)?;
                let sites = self.sites.get(phase).ok_or_else(unknown)?;
                let index = sites
                    .iter()
                    .position(|s| s.label == site)
                    .ok_or_else(unknown)?;
                let anisotropic = sites[index].anisotropic;
                match field {
                    AtomField::Isotropic if anisotropic => Err(unknown()),
                    AtomField::Anisotropic(_) if !anisotropic => Err(unknown()),
                    _ => Ok(Binding::Atom {
                        phase,
                        site: index,
                        field,
                    }),
                }
            }
        }
    }

    /// Bind every varying parameter, in parameter-set order
    pub fn bind_varying(&self, params: &ParameterSet) -> Result<Vec<BoundParameter>> {
        params
            .varying()
            .map(|p| {
                Ok(BoundParameter {
                    name: p.name.clone(),
                    binding: self.resolve(&p.name)?,
                    value: p.value,
                    lower: p.lb,
                    upper: p.ub,
                })
            })
            .collect()
    }
}

/// Split bound parameters into bindings, start point and bounds
pub fn solver_inputs(bound: &[BoundParameter]) -> (Vec<Binding>, Vec<f64>, Vec<f64>, Vec<f64>) {
    let bindings = bound.iter().map(|b| b.binding).collect();
    let x0 = bound.iter().map(|b| b.value).collect();
    let lower = bound.iter().map(|b| b.lower).collect();
    let upper = bound.iter().map(|b| b.upper).collect();
    (bindings, x0, lower, upper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::Parameter;

    fn context() -> BindingContext {
        BindingContext {
            phases: vec!["CeO2".to_string(), "Ni".to_string()],
            profile: &[GlobalParam::U, GlobalParam::V, GlobalParam::W],
            scale: true,
            lattice: vec![vec![LatticeField::A], vec![LatticeField::A]],
            sites: vec![
                vec![
                    SiteLabel {
                        label: "Ce1".to_string(),
                        anisotropic: false,
                    },
                    SiteLabel {
                        label: "O1".to_string(),
                        anisotropic: true,
                    },
                ],
                vec![],
            ],
        }
    }

    #[test]
    fn test_resolve() {
        let ctx = context();
        assert_eq!(ctx.resolve("U").unwrap(), Binding::Profile(GlobalParam::U));
        assert_eq!(ctx.resolve("zero_error").unwrap(), Binding::ZeroError);
        assert_eq!(ctx.resolve("scale").unwrap(), Binding::Scale);
        assert_eq!(
            ctx.resolve("Ni_a").unwrap(),
            Binding::Lattice {
                phase: 1,
                field: LatticeField::A
            }
        );
        assert_eq!(
            ctx.resolve("CeO2_O1_U12").unwrap(),
            Binding::Atom {
                phase: 0,
                site: 1,
                field: AtomField::Anisotropic(3)
            }
        );
    }

    #[test]
    fn test_reject_unusable_names() {
        let ctx = context();
        for name in ["Ul", "CeO2_b", "CeO2_O1_dw", "CeO2_Ce1_U11", "CeO2_O2_x", "Si_a", "foo"] {
            assert!(
                matches!(ctx.resolve(name), Err(RefinementError::UnknownParameter(_))),
                "{} should be rejected",
                name
            );
        }
        let lebail = BindingContext {
            scale: false,
            ..context()
        };
        assert!(lebail.resolve("scale").is_err());
    }

    #[test]
    fn test_bind_varying() {
        let mut params = ParameterSet::new();
        params.add(Parameter::with_bounds("U", 0.5, 0.0, 1.0, true));
        params.add(Parameter::with_bounds("V", 0.5, -1.0, 1.0, false));
        params.add(Parameter::with_bounds("CeO2_a", 0.541, 0.49, 0.59, true));
        let bound = context().bind_varying(&params).unwrap();
        assert_eq!(bound.len(), 2);
        let (bindings, x0, lower, upper) = solver_inputs(&bound);
        assert_eq!(bindings[0], Binding::Profile(GlobalParam::U));
        assert_eq!(x0, vec![0.5, 0.541]);
        assert_eq!(lower, vec![0.0, 0.49]);
        assert_eq!(upper, vec![1.0, 0.59]);

        params.add(Parameter::with_bounds("bogus", 1.0, 0.0, 2.0, true));
        assert!(context().bind_varying(&params).is_err());
    }
}
