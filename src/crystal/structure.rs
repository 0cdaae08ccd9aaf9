/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Crystal phases with an atomic basis
//!
//! [`RietveldMaterial`] extends a [`Material`] with the atom sites of the
//! asymmetric unit, their symmetry-expanded positions and the scattering
//! corrections needed to evaluate structure factors at one beam energy.

use super::absences::Hkl;
use super::errors::{CrystalError, Result};
use super::lattice::{Mat3, Space};
use super::material::Material;
use super::scattering::{form_factor, AnomalousTable, ScatteringCorrection};
use crate::atoms::{AtomSite, Displacement};
use crate::utils::kev_to_nm;
use num_complex::Complex64;
use rayon::prelude::*;
use std::f64::consts::PI;
use std::fmt;

/// Reduced positions closer than this (summed over x, y, z) are the same atom
const POSITION_TOLERANCE: f64 = 1e-4;

#[derive(Debug, Clone)]
pub struct RietveldMaterial {
    material: Material,
    sites: Vec<AtomSite>,
    expanded: Vec<Vec<[f64; 3]>>,
    beta: Vec<Option<Mat3>>,
    corrections: Vec<ScatteringCorrection>,
    energy_kev: f64,
    wavelength_nm: f64,
    phase_fraction: f64,
}

impl RietveldMaterial {
    /// Attach an atomic basis to a phase for a beam of the given energy
    pub fn new(
        material: Material,
        sites: Vec<AtomSite>,
        energy_kev: f64,
        anomalous: &AnomalousTable,
    ) -> Result<Self> {
        let corrections = sites
            .iter()
            .map(|site| anomalous.correction(site.atomic_number(), energy_kev))
            .collect::<Result<Vec<_>>>()?;

        let mut rietveld = Self {
            material,
            sites,
            expanded: Vec::new(),
            beta: Vec::new(),
            corrections,
            energy_kev,
            wavelength_nm: kev_to_nm(energy_kev),
            phase_fraction: 1.0,
        };
        rietveld.expanded = (0..rietveld.sites.len())
            .map(|i| rietveld.expand_site(i))
            .collect();
        rietveld.beta = (0..rietveld.sites.len())
            .map(|i| rietveld.beta_tensor(i))
            .collect();
        Ok(rietveld)
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn name(&self) -> &str {
        self.material.name()
    }

    pub fn sites(&self) -> &[AtomSite] {
        &self.sites
    }

    /// All positions in the unit cell generated from one site
    pub fn expanded_positions(&self, site: usize) -> Option<&[[f64; 3]]> {
        self.expanded.get(site).map(Vec::as_slice)
    }

    pub fn energy_kev(&self) -> f64 {
        self.energy_kev
    }

    pub fn wavelength_nm(&self) -> f64 {
        self.wavelength_nm
    }

    pub fn phase_fraction(&self) -> f64 {
        self.phase_fraction
    }

    pub fn set_phase_fraction(&mut self, fraction: f64) {
        self.phase_fraction = fraction;
    }

    pub fn volume(&self) -> f64 {
        self.material.volume()
    }

    pub fn hkls(&self) -> &[Hkl] {
        self.material.hkls()
    }

    pub fn multiplicity(&self) -> Vec<usize> {
        self.material.multiplicity()
    }

    /// Bragg angles at this material's own wavelength
    pub fn two_theta(&self) -> (Vec<f64>, Vec<bool>) {
        self.material.two_theta(self.wavelength_nm)
    }

    pub fn lattice_parameters(&self) -> [f64; 6] {
        self.material.lattice_parameters()
    }

    /// Replace the lattice parameters; anisotropic displacement tensors follow
    pub fn set_lattice_parameters(&mut self, parameters: [f64; 6]) -> Result<()> {
        self.material.set_lattice_parameters(parameters)?;
        self.beta = (0..self.sites.len()).map(|i| self.beta_tensor(i)).collect();
        Ok(())
    }

    pub fn set_site_position(&mut self, site: usize, position: [f64; 3]) -> Result<()> {
        self.check_site(site)?;
        self.sites[site].position = position;
        self.expanded[site] = self.expand_site(site);
        Ok(())
    }

    pub fn set_site_occupancy(&mut self, site: usize, occupancy: f64) -> Result<()> {
        self.check_site(site)?;
        self.sites[site].occupancy = occupancy;
        Ok(())
    }

    pub fn set_site_displacement(&mut self, site: usize, displacement: Displacement) -> Result<()> {
        self.check_site(site)?;
        self.sites[site].displacement = displacement;
        self.beta[site] = self.beta_tensor(site);
        Ok(())
    }

    fn check_site(&self, site: usize) -> Result<()> {
        if site >= self.sites.len() {
            return Err(CrystalError::InvalidSite {
                index: site,
                count: self.sites.len(),
            });
        }
        Ok(())
    }

    /// Apply every space-group operator to a site and keep the distinct results
    fn expand_site(&self, site: usize) -> Vec<[f64; 3]> {
        let mut positions = vec![reduce_to_cell(&self.sites[site].position)];
        for op in self.material.space_group().operators() {
            let r = reduce_to_cell(&op.apply(&self.sites[site].position));
            let is_new = positions.iter().all(|p| {
                (0..3).map(|i| (r[i] - p[i]).abs()).sum::<f64>() >= POSITION_TOLERANCE
            });
            if is_new {
                positions.push(r);
            }
        }
        positions
    }

    /// `β = 2π² a*ᵢ a*ⱼ Uᵢⱼ` for anisotropic sites
    fn beta_tensor(&self, site: usize) -> Option<Mat3> {
        let Displacement::Anisotropic(u) = self.sites[site].displacement else {
            return None;
        };
        let recip = [
            self.material.calc_length(&[1.0, 0.0, 0.0], Space::Reciprocal),
            self.material.calc_length(&[0.0, 1.0, 0.0], Space::Reciprocal),
            self.material.calc_length(&[0.0, 0.0, 1.0], Space::Reciprocal),
        ];
        let umat = [[u[0], u[3], u[4]], [u[3], u[1], u[5]], [u[4], u[5], u[2]]];
        let mut beta = [[0.0; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                beta[i][j] = 2.0 * PI * PI * recip[i] * recip[j] * umat[i][j];
            }
        }
        Some(beta)
    }

    /// Complex structure factor of one reflection
    pub fn structure_factor(&self, hkl: &Hkl) -> Result<Complex64> {
        let h = [hkl[0] as f64, hkl[1] as f64, hkl[2] as f64];
        let g_sq = self.material.calc_length(&h, Space::Reciprocal).powi(2);
        // (sinθ/λ)² in nm⁻² for the displacement term and Å⁻² for f0
        let s_nm = 0.25 * g_sq;
        let s_angstrom = s_nm * 1e-2;

        let mut sf = Complex64::new(0.0, 0.0);
        for (i, site) in self.sites.iter().enumerate() {
            let ff = form_factor(site.atomic_number(), s_angstrom, &self.corrections[i])?;
            let damping = match (&site.displacement, &self.beta[i]) {
                (Displacement::Anisotropic(_), Some(beta)) => {
                    let mut q = 0.0;
                    for a in 0..3 {
                        for b in 0..3 {
                            q += h[a] * beta[a][b] * h[b];
                        }
                    }
                    (-q).exp()
                }
                (Displacement::Isotropic(u), _) => (-8.0 * PI * PI * u * s_nm).exp(),
                (Displacement::Anisotropic(_), None) => 1.0,
            };
            let ff = ff * site.occupancy * damping;

            for r in &self.expanded[i] {
                let arg = 2.0 * PI * (h[0] * r[0] + h[1] * r[1] + h[2] * r[2]);
                sf += ff * Complex64::new(arg.cos(), -arg.sin());
            }
        }
        Ok(sf)
    }

    /// `|F|²` of one reflection
    pub fn structure_factor_squared(&self, hkl: &Hkl) -> Result<f64> {
        Ok(self.structure_factor(hkl)?.norm_sqr())
    }

    /// `|F|²` for every reflection, in the order of [`hkls`](Self::hkls)
    pub fn structure_factors(&self) -> Result<Vec<f64>> {
        self.material
            .hkls()
            .par_iter()
            .map(|hkl| self.structure_factor_squared(hkl))
            .collect()
    }
}

/// Fractional coordinates folded into `[0, 1)`
fn reduce_to_cell(r: &[f64; 3]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (o, &v) in out.iter_mut().zip(r) {
        let mut f = v.fract();
        if f < 0.0 {
            f += 1.0;
        }
        if f.abs() < 1e-6 || (1.0 - f).abs() < 1e-6 {
            f = 0.0;
        }
        *o = f;
    }
    out
}

impl fmt::Display for RietveldMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} at {:.4} keV", self.material, self.energy_kev)?;
        for (site, positions) in self.sites.iter().zip(&self.expanded) {
            writeln!(f, "  {} x{}", site, positions.len())?;
        }
        Ok(())
    }
}
