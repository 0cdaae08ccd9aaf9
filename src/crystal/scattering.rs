/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! X-ray atomic scattering factors
//!
//! The atomic form factor is `f0(s) + fNT + f' + i f''` where f0 is the
//! coherent four-Gaussian fit, fNT the nuclear Thomson term and
//! `f' = f1 + frel - Z`, `f'' = f2` come from tabulated anomalous data
//! interpolated at the beam energy.

use super::errors::{CrystalError, Result};
use crate::atoms::{element_symbol, form_factor_coefficients, AtomError};
use crate::utils::interp;
use log::warn;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Tabulated anomalous data of one element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalousRecord {
    pub energy_kev: Vec<f64>,
    pub f1: Vec<f64>,
    pub f2: Vec<f64>,
    /// Relativistic correction
    #[serde(default)]
    pub frel: f64,
    /// Nuclear Thomson scattering
    #[serde(default)]
    pub fnt: f64,
}

/// Energy-independent and energy-dependent corrections to f0 for one element
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScatteringCorrection {
    /// `f' + i f''`
    pub anomalous: Complex64,
    pub nuclear_thomson: f64,
}

/// Anomalous-scattering table keyed by element symbol
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnomalousTable {
    records: HashMap<String, AnomalousRecord>,
}

impl AnomalousTable {
    /// A table without entries; every element gets zero correction
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a JSON document `{ "Ce": { "energy_kev": [...], "f1": [...], "f2": [...] } }`
    pub fn from_json_str(json: &str) -> Result<Self> {
        let table: AnomalousTable = serde_json::from_str(json)?;
        for (symbol, record) in &table.records {
            let n = record.energy_kev.len();
            if n == 0 || record.f1.len() != n || record.f2.len() != n {
                return Err(CrystalError::ScatteringTable(format!(
                    "{}: energy, f1 and f2 must be non-empty and of equal length",
                    symbol
                )));
            }
            if record.energy_kev.windows(2).any(|w| w[1] <= w[0]) {
                return Err(CrystalError::ScatteringTable(format!(
                    "{}: energies must be strictly increasing",
                    symbol
                )));
            }
        }
        Ok(table)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn insert(&mut self, symbol: &str, record: AnomalousRecord) {
        self.records.insert(symbol.to_string(), record);
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.records.contains_key(symbol)
    }

    /// Corrections for an element at a beam energy in keV
    ///
    /// Elements missing from the table get zero correction and a warning.
    pub fn correction(&self, atomic_number: u32, energy_kev: f64) -> Result<ScatteringCorrection> {
        let symbol =
            element_symbol(atomic_number).ok_or(AtomError::InvalidAtomicNumber(atomic_number))?;
        let Some(record) = self.records.get(symbol) else {
            warn!(
                "no anomalous scattering data for {}; using f' = f'' = 0",
                symbol
            );
            return Ok(ScatteringCorrection::default());
        };

        let f1 = interp(energy_kev, &record.energy_kev, &record.f1)
            .map_err(|e| CrystalError::ScatteringTable(e.to_string()))?;
        let f2 = interp(energy_kev, &record.energy_kev, &record.f2)
            .map_err(|e| CrystalError::ScatteringTable(e.to_string()))?;

        Ok(ScatteringCorrection {
            anomalous: Complex64::new(f1 + record.frel - atomic_number as f64, f2),
            nuclear_thomson: record.fnt,
        })
    }
}

/// Complex atomic form factor at `s = (sinθ/λ)²` in Å⁻²
pub fn form_factor(atomic_number: u32, s: f64, correction: &ScatteringCorrection) -> Result<Complex64> {
    let coefficients = form_factor_coefficients(atomic_number).ok_or_else(|| {
        AtomError::MissingScatteringData(
            element_symbol(atomic_number)
                .unwrap_or("?")
                .to_string(),
        )
    })?;
    let f0 = coefficients.evaluate(s);
    Ok(Complex64::new(f0 + correction.nuclear_thomson, 0.0) + correction.anomalous)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TABLE: &str = r#"{
        "Ce": { "energy_kev": [5.0, 10.0], "f1": [50.0, 56.0], "f2": [10.0, 4.0], "frel": -0.5 }
    }"#;

    #[test]
    fn test_correction_interpolates() {
        let table = AnomalousTable::from_json_str(TABLE).unwrap();
        let c = table.correction(58, 7.5).unwrap();
        assert_relative_eq!(c.anomalous.re, 53.0 - 0.5 - 58.0, epsilon = 1e-12);
        assert_relative_eq!(c.anomalous.im, 7.0, epsilon = 1e-12);
        assert_relative_eq!(c.nuclear_thomson, 0.0);
    }

    #[test]
    fn test_missing_element_gives_zero() {
        let table = AnomalousTable::from_json_str(TABLE).unwrap();
        let c = table.correction(8, 8.0).unwrap();
        assert_eq!(c, ScatteringCorrection::default());
    }

    #[test]
    fn test_rejects_malformed_table() {
        let bad = r#"{ "O": { "energy_kev": [1.0, 2.0], "f1": [1.0], "f2": [1.0, 2.0] } }"#;
        assert!(AnomalousTable::from_json_str(bad).is_err());
        let unsorted = r#"{ "O": { "energy_kev": [2.0, 1.0], "f1": [1.0, 1.0], "f2": [1.0, 2.0] } }"#;
        assert!(AnomalousTable::from_json_str(unsorted).is_err());
    }

    #[test]
    fn test_form_factor_at_zero_angle() {
        let f = form_factor(8, 0.0, &ScatteringCorrection::default()).unwrap();
        assert_relative_eq!(f.re, 8.0, epsilon = 0.01);
        assert_relative_eq!(f.im, 0.0);
        assert!(form_factor(43, 0.0, &ScatteringCorrection::default()).is_err());
    }
}
