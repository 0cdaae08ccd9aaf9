/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

use crate::utils::constants::{CU_KALPHA1_NM, CU_KALPHA2_NM, CU_KALPHA2_WEIGHT};
use crate::utils::{kev_to_nm, nm_to_kev};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One emission line of the source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wavelength {
    pub name: String,
    #[serde(rename = "wavelength_nm")]
    pub value_nm: f64,
    #[serde(default = "unit_weight")]
    pub weight: f64,
}

fn unit_weight() -> f64 {
    1.0
}

impl Wavelength {
    pub fn new(name: &str, value_nm: f64, weight: f64) -> Self {
        Self {
            name: name.to_string(),
            value_nm,
            weight,
        }
    }

    pub fn from_energy_kev(name: &str, energy_kev: f64, weight: f64) -> Self {
        Self::new(name, kev_to_nm(energy_kev), weight)
    }

    pub fn energy_kev(&self) -> f64 {
        nm_to_kev(self.value_nm)
    }

    /// Cu Kα1 and Kα2
    pub fn defaults() -> Vec<Wavelength> {
        vec![
            Wavelength::new("alpha1", CU_KALPHA1_NM, 1.0),
            Wavelength::new("alpha2", CU_KALPHA2_NM, CU_KALPHA2_WEIGHT),
        ]
    }
}

impl fmt::Display for Wavelength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:.6} nm ({:.4} keV), weight {:.3}",
            self.name,
            self.value_nm,
            self.energy_kev(),
            self.weight
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_energy_round_trip() {
        let w = Wavelength::defaults().remove(0);
        assert_relative_eq!(w.energy_kev(), 8.0478, epsilon = 1e-3);
        let back = Wavelength::from_energy_kev("x", w.energy_kev(), 1.0);
        assert_relative_eq!(back.value_nm, w.value_nm, max_relative = 1e-12);
    }
}
