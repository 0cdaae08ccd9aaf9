/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Crystal phases for whole-pattern fitting
//!
//! A [`Material`] owns the lattice, the space group and the list of unique
//! reflections of one phase. Lattice parameters change during refinement;
//! the reflection list is generated once and stays aligned with any
//! per-reflection data held by the caller.

use super::absences::Hkl;
use super::errors::{CrystalError, Result};
use super::hall::IMat3;
use super::lattice::{Lattice, LatticeSystem, Space, LATTICE_PARAMETER_NAMES};
use super::reflections::{generate_reflections, hkl_star, reciprocal_operators, vector_star};
use super::space_group::SpaceGroup;
use std::fmt;

#[derive(Debug, Clone)]
pub struct Material {
    name: String,
    space_group: SpaceGroup,
    lattice: Lattice,
    dmin: f64,
    reciprocal_point_group: Vec<IMat3>,
    reciprocal_laue_group: Vec<IMat3>,
    hkls: Vec<Hkl>,
}

impl Material {
    /// Build a phase and generate its reflections
    ///
    /// # Arguments
    ///
    /// * `name` - Phase name, used as the parameter prefix
    /// * `space_group_number` - 1 to 230
    /// * `setting` - 0-based setting index
    /// * `lattice_parameters` - `(a, b, c, α, β, γ)` in nm and degrees
    /// * `dmin` - Smallest d-spacing kept, in nm
    pub fn new(
        name: &str,
        space_group_number: u16,
        setting: usize,
        lattice_parameters: [f64; 6],
        dmin: f64,
    ) -> Result<Self> {
        if dmin <= 0.0 {
            return Err(CrystalError::InvalidLattice(format!(
                "dmin must be positive, got {}",
                dmin
            )));
        }
        let space_group = SpaceGroup::new(space_group_number, setting)?;
        let lattice = Lattice::new(lattice_parameters)?;
        let reciprocal_point_group = reciprocal_operators(&lattice, space_group.point_group());
        let reciprocal_laue_group = reciprocal_operators(&lattice, space_group.laue_group());
        let hkls = generate_reflections(&lattice, &space_group, &reciprocal_laue_group, dmin)?;

        Ok(Self {
            name: name.to_string(),
            space_group,
            lattice,
            dmin,
            reciprocal_point_group,
            reciprocal_laue_group,
            hkls,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn space_group(&self) -> &SpaceGroup {
        &self.space_group
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn lattice_system(&self) -> LatticeSystem {
        self.space_group.lattice_system()
    }

    pub fn lattice_parameters(&self) -> [f64; 6] {
        self.lattice.parameters()
    }

    /// Replace the lattice parameters and recompute the metric tensors
    pub fn set_lattice_parameters(&mut self, parameters: [f64; 6]) -> Result<()> {
        self.lattice = Lattice::new(parameters)?;
        Ok(())
    }

    /// Names and values of the independent lattice parameters
    pub fn refinable_lattice_parameters(&self) -> Vec<(&'static str, f64)> {
        let lp = self.lattice_parameters();
        self.lattice_system()
            .refinable_indices()
            .iter()
            .map(|&i| (LATTICE_PARAMETER_NAMES[i], lp[i]))
            .collect()
    }

    /// Expand the independent lattice parameters into all six
    pub fn required_lattice_parameters(&self, p: &[f64]) -> Result<[f64; 6]> {
        self.lattice_system().required_lattice_parameters(p)
    }

    pub fn volume(&self) -> f64 {
        self.lattice.volume()
    }

    pub fn dmin(&self) -> f64 {
        self.dmin
    }

    pub fn calc_length(&self, v: &[f64; 3], space: Space) -> f64 {
        self.lattice.calc_length(v, space)
    }

    /// Symmetry-equivalent vectors of `v` under the direct or reciprocal point group
    pub fn calc_star(&self, v: &[f64; 3], space: Space, laue: bool) -> Vec<[f64; 3]> {
        let ops: &[IMat3] = match (space, laue) {
            (Space::Direct, false) => self.space_group.point_group(),
            (Space::Direct, true) => self.space_group.laue_group(),
            (Space::Reciprocal, false) => &self.reciprocal_point_group,
            (Space::Reciprocal, true) => &self.reciprocal_laue_group,
        };
        vector_star(v, ops)
    }

    /// Unique reflections, sorted by decreasing d-spacing
    pub fn hkls(&self) -> &[Hkl] {
        &self.hkls
    }

    /// Regenerate the reflection list for the current lattice
    pub fn regenerate_reflections(&mut self) -> Result<()> {
        self.hkls = generate_reflections(
            &self.lattice,
            &self.space_group,
            &self.reciprocal_laue_group,
            self.dmin,
        )?;
        Ok(())
    }

    /// Size of each reflection's star without inversion
    pub fn multiplicity(&self) -> Vec<usize> {
        self.hkls
            .iter()
            .map(|h| hkl_star(h, &self.reciprocal_point_group).len())
            .collect()
    }

    /// Bragg angles `2θ` in degrees at the given wavelength (nm)
    ///
    /// Returns the angles of the observable reflections together with a mask
    /// over [`hkls`](Self::hkls) marking which reflections they belong to.
    pub fn two_theta(&self, wavelength_nm: f64) -> (Vec<f64>, Vec<bool>) {
        let mut tth = Vec::with_capacity(self.hkls.len());
        let mut mask = Vec::with_capacity(self.hkls.len());
        for h in &self.hkls {
            let sin_theta = self.lattice.g_length(h) * wavelength_nm / 2.0;
            if sin_theta.abs() <= 1.0 {
                tth.push(2.0 * sin_theta.asin().to_degrees());
                mask.push(true);
            } else {
                mask.push(false);
            }
        }
        (tth, mask)
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lp = self.lattice_parameters();
        write!(
            f,
            "{} [{} ({}), a={:.5} b={:.5} c={:.5} nm, α={:.3} β={:.3} γ={:.3}, {} reflections]",
            self.name,
            self.space_group.hermann_mauguin(),
            self.space_group.number(),
            lp[0],
            lp[1],
            lp[2],
            lp[3],
            lp[4],
            lp[5],
            self.hkls.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn nacl() -> Material {
        Material::new("NaCl", 225, 0, [0.5640, 0.5640, 0.5640, 90.0, 90.0, 90.0], 0.1).unwrap()
    }

    #[test]
    fn test_fcc_reflections() {
        let m = nacl();
        assert_eq!(
            &m.hkls()[..6],
            &[[1, 1, 1], [2, 0, 0], [2, 2, 0], [3, 1, 1], [2, 2, 2], [4, 0, 0]]
        );
        assert!(!m.hkls().contains(&[1, 0, 0]));
        assert!(!m.hkls().contains(&[1, 1, 0]));
        assert_eq!(&m.multiplicity()[..3], &[8, 6, 12]);
    }

    #[test]
    fn test_two_theta_mask() {
        let m = nacl();
        let (tth, mask) = m.two_theta(0.15406);
        assert_eq!(mask.len(), m.hkls().len());
        assert_eq!(tth.len(), mask.iter().filter(|&&v| v).count());
        // 111 of NaCl sits near 27.4°
        assert_relative_eq!(tth[0], 27.37, epsilon = 0.05);

        // Long wavelength: high-order reflections become unobservable
        let (tth, mask) = m.two_theta(0.5);
        assert!(mask.iter().any(|&v| !v));
        assert!(tth.iter().all(|t| *t <= 180.0));
    }

    #[test]
    fn test_lattice_update() {
        let mut m = nacl();
        let before = m.two_theta(0.15406).0[0];
        let lp = m.required_lattice_parameters(&[0.57]).unwrap();
        m.set_lattice_parameters(lp).unwrap();
        let after = m.two_theta(0.15406).0[0];
        assert!(after < before);
        assert_eq!(m.refinable_lattice_parameters(), vec![("a", 0.57)]);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(Material::new("x", 0, 0, [0.5, 0.5, 0.5, 90.0, 90.0, 90.0], 0.1).is_err());
        assert!(Material::new("x", 225, 0, [0.5, 0.5, 0.5, 90.0, 90.0, 90.0], 0.0).is_err());
    }
}
