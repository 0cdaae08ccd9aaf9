/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Space groups
//!
//! A [`SpaceGroup`] bundles everything the reflection generator and the
//! structure-factor code need: the full operator list, the direct point and
//! Laue groups, the centering letter and the compiled extinction rules.

use super::absences::{
    centering_allows, compile_rules, is_systematically_absent, parse_symmetry_elements,
    AbsenceRule, Hkl, SymmetryElement,
};
use super::errors::{CrystalError, Result};
use super::hall::{mat_neg, HallSymbol, IMat3, SymOp, IDENTITY};
use super::lattice::LatticeSystem;
use super::tables::{self, RHOMBOHEDRAL_GROUPS};

#[derive(Debug, Clone)]
pub struct SpaceGroup {
    number: u16,
    setting: usize,
    hall: &'static str,
    hermann_mauguin: &'static str,
    centering: char,
    lattice_system: LatticeSystem,
    operators: Vec<SymOp>,
    point_group: Vec<IMat3>,
    laue_group: Vec<IMat3>,
    centrosymmetric: bool,
    symmetry_elements: Vec<SymmetryElement>,
    rules: Vec<AbsenceRule>,
}

impl SpaceGroup {
    /// Build a space group from its number (1-230) and a 0-based setting
    ///
    /// Setting 1 selects origin choice 2 for the groups that have two origins,
    /// and rhombohedral axes for the seven R groups.
    pub fn new(number: u16, setting: usize) -> Result<Self> {
        let entry = tables::entry(number).ok_or(CrystalError::UnknownSpaceGroup(number))?;
        let hall = match setting {
            0 => entry.hall,
            1 => entry
                .hall_alternative
                .ok_or(CrystalError::InvalidSetting { number, setting })?,
            _ => return Err(CrystalError::InvalidSetting { number, setting }),
        };

        let rhombohedral_axes = setting == 1 && RHOMBOHEDRAL_GROUPS.contains(&number);
        let lattice_system = if rhombohedral_axes {
            LatticeSystem::Rhombohedral
        } else {
            LatticeSystem::from_space_group(number).ok_or(CrystalError::UnknownSpaceGroup(number))?
        };

        let hermann_mauguin = entry.hermann_mauguin;
        let centering = if rhombohedral_axes {
            'P'
        } else {
            hermann_mauguin
                .chars()
                .next()
                .ok_or(CrystalError::UnknownSpaceGroup(number))?
        };
        // Reject unknown centering letters up front
        centering_allows(centering, &[0, 0, 0])?;

        let operators = HallSymbol::parse(hall)?.operators();

        let mut point_group: Vec<IMat3> = Vec::new();
        for op in &operators {
            if !point_group.contains(&op.rotation) {
                point_group.push(op.rotation);
            }
        }
        let mut laue_group = point_group.clone();
        for r in &point_group {
            let inverted = mat_neg(r);
            if !laue_group.contains(&inverted) {
                laue_group.push(inverted);
            }
        }
        let centrosymmetric = point_group.contains(&mat_neg(&IDENTITY));

        let symmetry_elements = parse_symmetry_elements(hermann_mauguin);
        let rules = compile_rules(lattice_system, &symmetry_elements)?;

        Ok(Self {
            number,
            setting,
            hall,
            hermann_mauguin,
            centering,
            lattice_system,
            operators,
            point_group,
            laue_group,
            centrosymmetric,
            symmetry_elements,
            rules,
        })
    }

    pub fn number(&self) -> u16 {
        self.number
    }

    pub fn setting(&self) -> usize {
        self.setting
    }

    pub fn hall_symbol(&self) -> &'static str {
        self.hall
    }

    pub fn hermann_mauguin(&self) -> &'static str {
        self.hermann_mauguin
    }

    pub fn centering(&self) -> char {
        self.centering
    }

    pub fn lattice_system(&self) -> LatticeSystem {
        self.lattice_system
    }

    /// All operators, centering translations included
    pub fn operators(&self) -> &[SymOp] {
        &self.operators
    }

    /// Rotation parts of the operators in direct space
    pub fn point_group(&self) -> &[IMat3] {
        &self.point_group
    }

    /// Point group with inversion added
    pub fn laue_group(&self) -> &[IMat3] {
        &self.laue_group
    }

    pub fn centrosymmetric(&self) -> bool {
        self.centrosymmetric
    }

    /// True when the group has no glide planes or screw axes
    pub fn symmorphic(&self) -> bool {
        self.symmetry_elements.is_empty()
    }

    pub fn symmetry_elements(&self) -> &[SymmetryElement] {
        &self.symmetry_elements
    }

    /// Centering and glide/screw conditions from the extinction tables
    pub fn is_allowed(&self, hkl: &Hkl) -> Result<bool> {
        if !centering_allows(self.centering, hkl)? {
            return Ok(false);
        }
        Ok(self.symmorphic() || !is_systematically_absent(&self.rules, hkl))
    }

    /// General extinction condition derived directly from the operators
    ///
    /// A reflection is absent when some operator leaves it invariant while its
    /// translation gives a non-integral phase `h·t`.
    pub fn is_allowed_by_operators(&self, hkl: &Hkl) -> bool {
        for op in &self.operators {
            let r = &op.rotation;
            let mut image = [0; 3];
            for (j, v) in image.iter_mut().enumerate() {
                *v = hkl[0] * r[0][j] + hkl[1] * r[1][j] + hkl[2] * r[2][j];
            }
            if image == *hkl {
                let phase: i32 = (0..3).map(|i| hkl[i] * op.translation[i]).sum();
                if phase.rem_euclid(12) != 0 {
                    return false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 0, 1, 1)]
    #[case(14, 0, 4, 4)]
    #[case(62, 0, 8, 8)]
    #[case(141, 1, 32, 16)]
    #[case(166, 0, 36, 12)]
    #[case(166, 1, 12, 12)]
    #[case(194, 0, 24, 24)]
    #[case(225, 0, 192, 48)]
    #[case(227, 0, 192, 48)]
    #[case(227, 1, 192, 48)]
    fn test_group_sizes(
        #[case] number: u16,
        #[case] setting: usize,
        #[case] operators: usize,
        #[case] point_group: usize,
    ) {
        let sg = SpaceGroup::new(number, setting).unwrap();
        assert_eq!(sg.operators().len(), operators);
        assert_eq!(sg.point_group().len(), point_group);
    }

    #[test]
    fn test_laue_group_and_centrosymmetry() {
        let p21 = SpaceGroup::new(4, 0).unwrap();
        assert!(!p21.centrosymmetric());
        assert!(!p21.symmorphic());
        assert_eq!(p21.point_group().len(), 2);
        assert_eq!(p21.laue_group().len(), 4);

        let fm3m = SpaceGroup::new(225, 0).unwrap();
        assert!(fm3m.centrosymmetric());
        assert!(fm3m.symmorphic());
        assert_eq!(fm3m.laue_group().len(), 48);
        assert_eq!(fm3m.centering(), 'F');
    }

    #[test]
    fn test_settings() {
        assert!(matches!(
            SpaceGroup::new(225, 1),
            Err(CrystalError::InvalidSetting { .. })
        ));
        assert!(matches!(
            SpaceGroup::new(231, 0),
            Err(CrystalError::UnknownSpaceGroup(231))
        ));
        let r3m = SpaceGroup::new(166, 1).unwrap();
        assert_eq!(r3m.lattice_system(), LatticeSystem::Rhombohedral);
        assert_eq!(r3m.centering(), 'P');
        let r3m_hex = SpaceGroup::new(166, 0).unwrap();
        assert_eq!(r3m_hex.lattice_system(), LatticeSystem::Trigonal);
        assert_eq!(r3m_hex.centering(), 'R');
    }

    #[test]
    fn test_every_group_builds() {
        for number in 1..=230u16 {
            let sg = SpaceGroup::new(number, 0).unwrap();
            assert!(!sg.operators().is_empty());
            if let Some(alt) = tables::entry(number).and_then(|e| e.hall_alternative) {
                let other = SpaceGroup::new(number, 1).unwrap();
                assert_eq!(other.point_group().len(), sg.point_group().len(), "{}", alt);
            }
        }
    }

    #[test]
    fn test_diamond_glide() {
        let fd3m = SpaceGroup::new(227, 0).unwrap();
        assert!(fd3m.is_allowed(&[1, 1, 1]).unwrap());
        assert!(fd3m.is_allowed(&[2, 2, 0]).unwrap());
        assert!(!fd3m.is_allowed(&[2, 0, 0]).unwrap());
        assert!(!fd3m.is_allowed(&[4, 2, 0]).unwrap());
        assert!(fd3m.is_allowed(&[4, 0, 0]).unwrap());
        assert!(!fd3m.is_allowed_by_operators(&[2, 0, 0]));
    }
}
