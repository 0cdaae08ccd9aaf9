/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Structured parameter names
//!
//! Flat names such as `CeO2_a` or `CeO2_O1_U11` are what users see in
//! parameter files. Inside the refinement they are resolved once into a
//! [`ParameterKey`] so that updates never depend on string matching.

use std::fmt;

/// Profile, instrument and scale parameters shared by all phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalParam {
    U,
    V,
    W,
    P,
    X,
    Y,
    Eta1,
    Eta2,
    Eta3,
    ZeroError,
    Scale,
    Ul,
    Vl,
    Wl,
    Pl,
    Xl,
    Yl,
    Ur,
    Vr,
    Wr,
    Pr,
    Xr,
    Yr,
    GaussWidth,
    LorWidth,
    CrystalliteSize,
}

impl GlobalParam {
    pub const ALL: [GlobalParam; 26] = [
        GlobalParam::U,
        GlobalParam::V,
        GlobalParam::W,
        GlobalParam::P,
        GlobalParam::X,
        GlobalParam::Y,
        GlobalParam::Eta1,
        GlobalParam::Eta2,
        GlobalParam::Eta3,
        GlobalParam::ZeroError,
        GlobalParam::Scale,
        GlobalParam::Ul,
        GlobalParam::Vl,
        GlobalParam::Wl,
        GlobalParam::Pl,
        GlobalParam::Xl,
        GlobalParam::Yl,
        GlobalParam::Ur,
        GlobalParam::Vr,
        GlobalParam::Wr,
        GlobalParam::Pr,
        GlobalParam::Xr,
        GlobalParam::Yr,
        GlobalParam::GaussWidth,
        GlobalParam::LorWidth,
        GlobalParam::CrystalliteSize,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            GlobalParam::U => "U",
            GlobalParam::V => "V",
            GlobalParam::W => "W",
            GlobalParam::P => "P",
            GlobalParam::X => "X",
            GlobalParam::Y => "Y",
            GlobalParam::Eta1 => "eta1",
            GlobalParam::Eta2 => "eta2",
            GlobalParam::Eta3 => "eta3",
            GlobalParam::ZeroError => "zero_error",
            GlobalParam::Scale => "scale",
            GlobalParam::Ul => "Ul",
            GlobalParam::Vl => "Vl",
            GlobalParam::Wl => "Wl",
            GlobalParam::Pl => "Pl",
            GlobalParam::Xl => "Xl",
            GlobalParam::Yl => "Yl",
            GlobalParam::Ur => "Ur",
            GlobalParam::Vr => "Vr",
            GlobalParam::Wr => "Wr",
            GlobalParam::Pr => "Pr",
            GlobalParam::Xr => "Xr",
            GlobalParam::Yr => "Yr",
            GlobalParam::GaussWidth => "gauss_width",
            GlobalParam::LorWidth => "lor_width",
            GlobalParam::CrystalliteSize => "crystallite_size",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|g| g.name() == name)
    }
}

/// One of the six cell parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LatticeField {
    A,
    B,
    C,
    Alpha,
    Beta,
    Gamma,
}

impl LatticeField {
    pub const ALL: [LatticeField; 6] = [
        LatticeField::A,
        LatticeField::B,
        LatticeField::C,
        LatticeField::Alpha,
        LatticeField::Beta,
        LatticeField::Gamma,
    ];

    /// Position in `(a, b, c, α, β, γ)`
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn name(&self) -> &'static str {
        crate::crystal::LATTICE_PARAMETER_NAMES[self.index()]
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.name() == name)
    }
}

/// Names of the anisotropic displacement components, in storage order
pub const ANISOTROPIC_NAMES: [&str; 6] = ["U11", "U22", "U33", "U12", "U13", "U23"];

/// A refinable property of an atom site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtomField {
    X,
    Y,
    Z,
    Occupancy,
    /// Isotropic displacement `U`
    Isotropic,
    /// Index into U11, U22, U33, U12, U13, U23
    Anisotropic(usize),
}

impl AtomField {
    pub fn suffix(&self) -> &'static str {
        match self {
            AtomField::X => "x",
            AtomField::Y => "y",
            AtomField::Z => "z",
            AtomField::Occupancy => "occ",
            AtomField::Isotropic => "dw",
            AtomField::Anisotropic(i) => ANISOTROPIC_NAMES.get(*i).copied().unwrap_or("U??"),
        }
    }

    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "x" => Some(AtomField::X),
            "y" => Some(AtomField::Y),
            "z" => Some(AtomField::Z),
            "occ" => Some(AtomField::Occupancy),
            "dw" => Some(AtomField::Isotropic),
            _ => ANISOTROPIC_NAMES
                .iter()
                .position(|&n| n == suffix)
                .map(AtomField::Anisotropic),
        }
    }

    pub fn is_position(&self) -> bool {
        matches!(self, AtomField::X | AtomField::Y | AtomField::Z)
    }

    pub fn is_displacement(&self) -> bool {
        matches!(self, AtomField::Isotropic | AtomField::Anisotropic(_))
    }
}

/// Structured identity of a refinable parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParameterKey {
    Global(GlobalParam),
    Lattice { phase: String, field: LatticeField },
    /// `site` is the element label such as `O2`
    Atom {
        phase: String,
        site: String,
        field: AtomField,
    },
}

impl ParameterKey {
    /// Resolve a flat name against the known phase names
    ///
    /// Phase names may themselves contain underscores, so every phase is
    /// tried as a prefix and the longest match wins.
    pub fn parse(name: &str, phases: &[&str]) -> Option<Self> {
        if let Some(global) = GlobalParam::from_name(name) {
            return Some(ParameterKey::Global(global));
        }

        let mut candidates: Vec<&&str> = phases
            .iter()
            .filter(|p| name.len() > p.len() + 1 && name.starts_with(**p))
            .collect();
        candidates.sort_by_key(|p| std::cmp::Reverse(p.len()));

        for phase in candidates {
            let Some(rest) = name[phase.len()..].strip_prefix('_') else {
                continue;
            };
            if let Some(field) = LatticeField::from_name(rest) {
                return Some(ParameterKey::Lattice {
                    phase: phase.to_string(),
                    field,
                });
            }
            if let Some((site, suffix)) = rest.rsplit_once('_') {
                if let Some(field) = AtomField::from_suffix(suffix) {
                    if !site.is_empty() {
                        return Some(ParameterKey::Atom {
                            phase: phase.to_string(),
                            site: site.to_string(),
                            field,
                        });
                    }
                }
            }
        }
        None
    }

    pub fn phase(&self) -> Option<&str> {
        match self {
            ParameterKey::Global(_) => None,
            ParameterKey::Lattice { phase, .. } | ParameterKey::Atom { phase, .. } => Some(phase),
        }
    }
}

impl fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterKey::Global(g) => write!(f, "{}", g.name()),
            ParameterKey::Lattice { phase, field } => write!(f, "{}_{}", phase, field.name()),
            ParameterKey::Atom { phase, site, field } => {
                write!(f, "{}_{}_{}", phase, site, field.suffix())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("U", ParameterKey::Global(GlobalParam::U))]
    #[case("zero_error", ParameterKey::Global(GlobalParam::ZeroError))]
    #[case("crystallite_size", ParameterKey::Global(GlobalParam::CrystalliteSize))]
    #[case("CeO2_a", ParameterKey::Lattice { phase: "CeO2".into(), field: LatticeField::A })]
    #[case("Ni_fcc_gamma", ParameterKey::Lattice { phase: "Ni_fcc".into(), field: LatticeField::Gamma })]
    #[case("CeO2_Ce1_x", ParameterKey::Atom { phase: "CeO2".into(), site: "Ce1".into(), field: AtomField::X })]
    #[case("CeO2_O1_U23", ParameterKey::Atom { phase: "CeO2".into(), site: "O1".into(), field: AtomField::Anisotropic(5) })]
    #[case("Ni_fcc_Ni1_dw", ParameterKey::Atom { phase: "Ni_fcc".into(), site: "Ni1".into(), field: AtomField::Isotropic })]
    fn test_parse_and_render(#[case] name: &str, #[case] key: ParameterKey) {
        let phases = ["CeO2", "Ni", "Ni_fcc"];
        assert_eq!(ParameterKey::parse(name, &phases), Some(key.clone()));
        assert_eq!(key.to_string(), name);
    }

    #[test]
    fn test_unknown_names() {
        let phases = ["CeO2"];
        assert_eq!(ParameterKey::parse("CeO2_q", &phases), None);
        assert_eq!(ParameterKey::parse("Si_a", &phases), None);
        assert_eq!(ParameterKey::parse("CeO2_", &phases), None);
        assert_eq!(ParameterKey::parse("tth_zero", &phases), None);
    }
}
