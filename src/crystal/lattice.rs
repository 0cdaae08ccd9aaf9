/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Lattice geometry
//!
//! Metric tensors of a unit cell, vector lengths in direct and reciprocal
//! space, and the rules that tie the refinable subset of lattice parameters
//! to the full `(a, b, c, α, β, γ)` set for each lattice system.

use super::errors::{CrystalError, Result};
use log::warn;
use std::fmt;

/// Names of the six lattice parameters in storage order
pub const LATTICE_PARAMETER_NAMES: [&str; 6] = ["a", "b", "c", "alpha", "beta", "gamma"];

/// Lattice families, with the rhombohedral axes of the R groups kept separate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LatticeSystem {
    Triclinic,
    Monoclinic,
    Orthorhombic,
    Tetragonal,
    Trigonal,
    Rhombohedral,
    Hexagonal,
    Cubic,
}

impl LatticeSystem {
    /// Lattice family of a space group in its standard (hexagonal-axes) setting
    pub fn from_space_group(number: u16) -> Option<Self> {
        let system = match number {
            1..=2 => LatticeSystem::Triclinic,
            3..=15 => LatticeSystem::Monoclinic,
            16..=74 => LatticeSystem::Orthorhombic,
            75..=142 => LatticeSystem::Tetragonal,
            143..=167 => LatticeSystem::Trigonal,
            168..=194 => LatticeSystem::Hexagonal,
            195..=230 => LatticeSystem::Cubic,
            _ => return None,
        };
        Some(system)
    }

    /// Indices into `(a, b, c, α, β, γ)` of the independent parameters
    pub fn refinable_indices(&self) -> &'static [usize] {
        match self {
            LatticeSystem::Triclinic => &[0, 1, 2, 3, 4, 5],
            LatticeSystem::Monoclinic => &[0, 1, 2, 4],
            LatticeSystem::Orthorhombic => &[0, 1, 2],
            LatticeSystem::Tetragonal => &[0, 2],
            LatticeSystem::Trigonal | LatticeSystem::Hexagonal => &[0, 2],
            LatticeSystem::Rhombohedral => &[0, 3],
            LatticeSystem::Cubic => &[0],
        }
    }

    /// Expand the independent parameters into the full six
    ///
    /// `p` holds the values for [`refinable_indices`](Self::refinable_indices) in order.
    pub fn required_lattice_parameters(&self, p: &[f64]) -> Result<[f64; 6]> {
        let need = self.refinable_indices().len();
        if p.len() != need {
            return Err(CrystalError::InvalidLattice(format!(
                "{} lattice needs {} independent parameters, got {}",
                self,
                need,
                p.len()
            )));
        }
        let full = match self {
            LatticeSystem::Triclinic => [p[0], p[1], p[2], p[3], p[4], p[5]],
            LatticeSystem::Monoclinic => [p[0], p[1], p[2], 90.0, p[3], 90.0],
            LatticeSystem::Orthorhombic => [p[0], p[1], p[2], 90.0, 90.0, 90.0],
            LatticeSystem::Tetragonal => [p[0], p[0], p[1], 90.0, 90.0, 90.0],
            LatticeSystem::Trigonal | LatticeSystem::Hexagonal => {
                [p[0], p[0], p[1], 90.0, 90.0, 120.0]
            }
            LatticeSystem::Rhombohedral => [p[0], p[0], p[0], p[1], p[1], p[1]],
            LatticeSystem::Cubic => [p[0], p[0], p[0], 90.0, 90.0, 90.0],
        };
        Ok(full)
    }
}

impl fmt::Display for LatticeSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LatticeSystem::Triclinic => "triclinic",
            LatticeSystem::Monoclinic => "monoclinic",
            LatticeSystem::Orthorhombic => "orthorhombic",
            LatticeSystem::Tetragonal => "tetragonal",
            LatticeSystem::Trigonal => "trigonal",
            LatticeSystem::Rhombohedral => "rhombohedral",
            LatticeSystem::Hexagonal => "hexagonal",
            LatticeSystem::Cubic => "cubic",
        };
        write!(f, "{}", name)
    }
}

/// Which space a vector is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Space {
    Direct,
    Reciprocal,
}

pub type Mat3 = [[f64; 3]; 3];

/// A unit cell with its direct and reciprocal metric tensors
///
/// Lengths are in nm and angles in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    parameters: [f64; 6],
    dmt: Mat3,
    rmt: Mat3,
    volume: f64,
}

impl Lattice {
    /// Build the metric tensors for `(a, b, c, α, β, γ)`
    ///
    /// A suspiciously small cell volume only produces a warning. A cell whose
    /// metric tensor is not positive definite cannot be inverted and is rejected;
    /// refinement models treat such a trial cell as a rejected step.
    pub fn new(parameters: [f64; 6]) -> Result<Self> {
        let [a, b, c, alpha, beta, gamma] = parameters;
        let ca = alpha.to_radians().cos();
        let cb = beta.to_radians().cos();
        let cg = gamma.to_radians().cos();

        let dmt = [
            [a * a, a * b * cg, a * c * cb],
            [a * b * cg, b * b, b * c * ca],
            [a * c * cb, b * c * ca, c * c],
        ];
        let det = det3(&dmt);
        if !det.is_finite() || det <= 0.0 {
            return Err(CrystalError::InvalidLattice(format!(
                "metric tensor of {:?} is singular (det = {})",
                parameters, det
            )));
        }
        let volume = det.sqrt();
        if volume < 1e-5 {
            warn!("unit cell volume {:.3e} nm^3 is suspiciously small", volume);
        }
        let rmt = inverse3(&dmt, det);

        Ok(Self {
            parameters,
            dmt,
            rmt,
            volume,
        })
    }

    pub fn parameters(&self) -> [f64; 6] {
        self.parameters
    }

    /// Direct metric tensor
    pub fn dmt(&self) -> &Mat3 {
        &self.dmt
    }

    /// Reciprocal metric tensor
    pub fn rmt(&self) -> &Mat3 {
        &self.rmt
    }

    /// Cell volume in nm³
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// `sqrt(vᵀ M v)` with the metric of the given space
    pub fn calc_length(&self, v: &[f64; 3], space: Space) -> f64 {
        let m = match space {
            Space::Direct => &self.dmt,
            Space::Reciprocal => &self.rmt,
        };
        quadratic_form(m, v).sqrt()
    }

    /// Reciprocal length of an integer triple
    pub fn g_length(&self, hkl: &[i32; 3]) -> f64 {
        self.calc_length(
            &[hkl[0] as f64, hkl[1] as f64, hkl[2] as f64],
            Space::Reciprocal,
        )
    }

    /// d-spacing of a reflection in nm
    pub fn d_spacing(&self, hkl: &[i32; 3]) -> f64 {
        1.0 / self.g_length(hkl)
    }
}

pub fn quadratic_form(m: &Mat3, v: &[f64; 3]) -> f64 {
    let mut sum = 0.0;
    for i in 0..3 {
        for j in 0..3 {
            sum += v[i] * m[i][j] * v[j];
        }
    }
    sum
}

pub fn mat3_mul(a: &Mat3, b: &Mat3) -> Mat3 {
    let mut c = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            c[i][j] = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    c
}

fn det3(m: &Mat3) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

fn inverse3(m: &Mat3, det: f64) -> Mat3 {
    let mut inv = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            // Cofactor of m[j][i]
            let r0 = (j + 1) % 3;
            let r1 = (j + 2) % 3;
            let c0 = (i + 1) % 3;
            let c1 = (i + 2) % 3;
            inv[i][j] = (m[r0][c0] * m[r1][c1] - m[r0][c1] * m[r1][c0]) / det;
        }
    }
    inv
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case([0.5411, 0.5411, 0.5411, 90.0, 90.0, 90.0])]
    #[case([0.4913, 0.4913, 0.5405, 90.0, 90.0, 120.0])]
    #[case([0.5, 0.6, 0.7, 80.0, 95.0, 105.0])]
    #[case([0.3, 0.3, 0.3, 75.0, 75.0, 75.0])]
    fn test_metric_tensors_are_inverse(#[case] lp: [f64; 6]) {
        let lattice = Lattice::new(lp).unwrap();
        let product = mat3_mul(lattice.dmt(), lattice.rmt());
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(product[i][j], expected, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_orthogonal_reciprocal_lengths() {
        let lattice = Lattice::new([0.4, 0.5, 0.6, 90.0, 90.0, 90.0]).unwrap();
        assert_relative_eq!(lattice.g_length(&[1, 0, 0]), 1.0 / 0.4, epsilon = 1e-12);
        assert_relative_eq!(lattice.g_length(&[0, 1, 0]), 1.0 / 0.5, epsilon = 1e-12);
        assert_relative_eq!(lattice.g_length(&[0, 0, 1]), 1.0 / 0.6, epsilon = 1e-12);
        assert_relative_eq!(lattice.volume(), 0.4 * 0.5 * 0.6, epsilon = 1e-12);
        assert_relative_eq!(
            lattice.calc_length(&[1.0, 1.0, 0.0], Space::Direct),
            (0.16f64 + 0.25).sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_hexagonal_volume() {
        let lattice = Lattice::new([0.3, 0.3, 0.5, 90.0, 90.0, 120.0]).unwrap();
        let expected = 0.3 * 0.3 * 0.5 * (120f64).to_radians().sin();
        assert_relative_eq!(lattice.volume(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_cell_rejected() {
        assert!(Lattice::new([0.5, 0.5, 0.5, 0.0, 0.0, 0.0]).is_err());
        assert!(Lattice::new([0.0, 0.5, 0.5, 90.0, 90.0, 90.0]).is_err());
    }

    #[test]
    fn test_required_lattice_parameters() {
        let full = LatticeSystem::Monoclinic
            .required_lattice_parameters(&[0.5, 0.6, 0.7, 101.0])
            .unwrap();
        assert_eq!(full, [0.5, 0.6, 0.7, 90.0, 101.0, 90.0]);
        let full = LatticeSystem::Hexagonal
            .required_lattice_parameters(&[0.3, 0.5])
            .unwrap();
        assert_eq!(full, [0.3, 0.3, 0.5, 90.0, 90.0, 120.0]);
        let full = LatticeSystem::Rhombohedral
            .required_lattice_parameters(&[0.5, 60.0])
            .unwrap();
        assert_eq!(full, [0.5, 0.5, 0.5, 60.0, 60.0, 60.0]);
        assert!(LatticeSystem::Cubic
            .required_lattice_parameters(&[0.5, 0.5])
            .is_err());
    }

    #[test]
    fn test_lattice_system_from_number() {
        assert_eq!(LatticeSystem::from_space_group(14), Some(LatticeSystem::Monoclinic));
        assert_eq!(LatticeSystem::from_space_group(167), Some(LatticeSystem::Trigonal));
        assert_eq!(LatticeSystem::from_space_group(225), Some(LatticeSystem::Cubic));
        assert_eq!(LatticeSystem::from_space_group(0), None);
    }
}
