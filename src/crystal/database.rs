/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Materials database
//!
//! A JSON document keyed by crystal name:
//!
//! ```json
//! {
//!   "CeO2": {
//!     "space_group_number": 225,
//!     "space_group_setting": 1,
//!     "lattice_parameters": [0.5411, 0.5411, 0.5411, 90.0, 90.0, 90.0],
//!     "atoms": [
//!       { "element": "Ce", "position": [0.0, 0.0, 0.0], "u": 0.0 },
//!       { "element": "O", "position": [0.25, 0.25, 0.25], "u": 0.0 }
//!     ]
//!   }
//! }
//! ```
//!
//! Settings in the file are 1-based.

use super::errors::{CrystalError, Result};
use super::material::Material;
use super::scattering::AnomalousTable;
use super::structure::RietveldMaterial;
use crate::atoms::{atomic_number_from_symbol, AtomError, AtomSite, Displacement};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

fn default_setting() -> usize {
    1
}

fn default_occupancy() -> f64 {
    1.0
}

/// One atom of the asymmetric unit as written in the database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atomic_number: Option<u32>,
    pub position: [f64; 3],
    #[serde(default = "default_occupancy")]
    pub occupancy: f64,
    #[serde(default)]
    pub u: Displacement,
}

impl AtomRecord {
    fn to_site(&self) -> Result<AtomSite> {
        let z = match (&self.atomic_number, &self.element) {
            (Some(z), _) => *z,
            (None, Some(symbol)) => atomic_number_from_symbol(symbol)
                .ok_or_else(|| AtomError::UnknownElement(symbol.clone()))?,
            (None, None) => return Err(AtomError::MissingElement.into()),
        };
        Ok(AtomSite::new(z, self.position, self.occupancy, self.u)?)
    }
}

/// Crystallographic description of one phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrystalRecord {
    pub space_group_number: u16,
    #[serde(default = "default_setting")]
    pub space_group_setting: usize,
    pub lattice_parameters: [f64; 6],
    #[serde(default)]
    pub atoms: Vec<AtomRecord>,
}

impl CrystalRecord {
    fn setting_index(&self) -> Result<usize> {
        self.space_group_setting
            .checked_sub(1)
            .ok_or(CrystalError::InvalidSetting {
                number: self.space_group_number,
                setting: self.space_group_setting,
            })
    }

    pub fn sites(&self) -> Result<Vec<AtomSite>> {
        self.atoms.iter().map(AtomRecord::to_site).collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialDatabase {
    crystals: HashMap<String, CrystalRecord>,
}

impl MaterialDatabase {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn get(&self, name: &str) -> Result<&CrystalRecord> {
        self.crystals
            .get(name)
            .ok_or_else(|| CrystalError::MaterialNotFound(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.crystals.keys().map(String::as_str)
    }

    /// Build the lattice-only phase used by LeBail fits
    pub fn material(&self, name: &str, dmin: f64) -> Result<Material> {
        let record = self.get(name)?;
        Material::new(
            name,
            record.space_group_number,
            record.setting_index()?,
            record.lattice_parameters,
            dmin,
        )
    }

    /// Build the phase with its atomic basis at one beam energy
    pub fn rietveld_material(
        &self,
        name: &str,
        dmin: f64,
        energy_kev: f64,
        anomalous: &AnomalousTable,
    ) -> Result<RietveldMaterial> {
        let material = self.material(name, dmin)?;
        let sites = self.get(name)?.sites()?;
        RietveldMaterial::new(material, sites, energy_kev, anomalous)
    }
}
