/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Atom sites of the asymmetric unit

use super::database::{element_symbol, form_factor_coefficients};
use super::errors::{AtomError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Atomic displacement parameters of a site, in nm²
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Displacement {
    /// Isotropic U
    Isotropic(f64),
    /// Anisotropic U in the order U11, U22, U33, U12, U13, U23
    Anisotropic([f64; 6]),
}

impl Default for Displacement {
    fn default() -> Self {
        Displacement::Isotropic(0.0)
    }
}

impl Displacement {
    pub fn is_anisotropic(&self) -> bool {
        matches!(self, Displacement::Anisotropic(_))
    }
}

/// One site of the asymmetric unit
#[derive(Debug, Clone, PartialEq)]
pub struct AtomSite {
    atomic_number: u32,
    /// Fractional coordinates
    pub position: [f64; 3],
    pub occupancy: f64,
    pub displacement: Displacement,
}

impl AtomSite {
    /// Create a new site
    ///
    /// Fails when the atomic number has no coherent scattering coefficients,
    /// since such a site could never contribute to a structure factor.
    pub fn new(
        atomic_number: u32,
        position: [f64; 3],
        occupancy: f64,
        displacement: Displacement,
    ) -> Result<Self> {
        let symbol =
            element_symbol(atomic_number).ok_or(AtomError::InvalidAtomicNumber(atomic_number))?;
        if form_factor_coefficients(atomic_number).is_none() {
            return Err(AtomError::MissingScatteringData(symbol.to_string()));
        }
        Ok(Self {
            atomic_number,
            position,
            occupancy,
            displacement,
        })
    }

    pub fn atomic_number(&self) -> u32 {
        self.atomic_number
    }

    /// Element symbol of the site
    pub fn symbol(&self) -> &'static str {
        // Validated in `new`
        element_symbol(self.atomic_number).unwrap_or("X")
    }
}

impl fmt::Display for AtomSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:.5}, {:.5}, {:.5}) occ {:.3}",
            self.symbol(),
            self.position[0],
            self.position[1],
            self.position[2],
            self.occupancy
        )
    }
}

/// Labels such as `Ce1`, `O1`, `O2` numbering repeated elements within a phase
pub fn site_labels(sites: &[AtomSite]) -> Vec<String> {
    let mut seen: Vec<u32> = Vec::with_capacity(sites.len());
    sites
        .iter()
        .map(|site| {
            seen.push(site.atomic_number);
            let n = seen.iter().filter(|&&z| z == site.atomic_number).count();
            format!("{}{}", site.symbol(), n)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_validation() {
        assert!(AtomSite::new(58, [0.0; 3], 1.0, Displacement::default()).is_ok());
        assert!(matches!(
            AtomSite::new(0, [0.0; 3], 1.0, Displacement::default()),
            Err(AtomError::InvalidAtomicNumber(0))
        ));
        assert!(matches!(
            AtomSite::new(43, [0.0; 3], 1.0, Displacement::default()),
            Err(AtomError::MissingScatteringData(_))
        ));
    }

    #[test]
    fn test_site_labels_count_repeats() {
        let sites = vec![
            AtomSite::new(58, [0.0; 3], 1.0, Displacement::default()).unwrap(),
            AtomSite::new(8, [0.25; 3], 1.0, Displacement::default()).unwrap(),
            AtomSite::new(8, [0.5; 3], 1.0, Displacement::Anisotropic([0.0; 6])).unwrap(),
        ];
        assert_eq!(site_labels(&sites), vec!["Ce1", "O1", "O2"]);
    }

    #[test]
    fn test_displacement_deserializes_both_forms() {
        let iso: Displacement = serde_json::from_str("0.01").unwrap();
        assert_eq!(iso, Displacement::Isotropic(0.01));
        let aniso: Displacement = serde_json::from_str("[1, 2, 3, 0, 0, 0]").unwrap();
        assert!(aniso.is_anisotropic());
    }
}
