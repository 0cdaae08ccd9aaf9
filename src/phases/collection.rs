/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Named collections of crystal phases
//!
//! A roster file lists which crystals to take from which materials database:
//!
//! ```json
//! { "materials.json": ["CeO2", "Ni"] }
//! ```
//!
//! Relative database paths are resolved against the roster's directory.

use super::errors::{PhaseError, Result};
use super::wavelength::Wavelength;
use crate::crystal::{AnomalousTable, Material, MaterialDatabase, RietveldMaterial};
use crate::utils::constants::DEFAULT_DMIN_NM;
use log::{info, warn};
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Phases keyed by name, in insertion order
///
/// `T` is a [`Material`] for LeBail fits or one [`RietveldMaterial`] per
/// wavelength (in the order of [`wavelengths`](Phases::wavelengths)) for
/// Rietveld fits.
#[derive(Debug, Clone)]
pub struct Phases<T> {
    entries: Vec<(String, T)>,
    wavelengths: Vec<Wavelength>,
    dmin: f64,
    roster: Vec<(String, Vec<String>)>,
}

pub type LeBailPhases = Phases<Material>;
pub type RietveldPhases = Phases<Vec<RietveldMaterial>>;

impl<T> Phases<T> {
    pub fn new(wavelengths: Vec<Wavelength>, dmin: f64) -> Result<Self> {
        if wavelengths.is_empty() {
            return Err(PhaseError::InconsistentWavelengths(
                "at least one wavelength is required".into(),
            ));
        }
        Ok(Self {
            entries: Vec::new(),
            wavelengths,
            dmin,
            roster: Vec::new(),
        })
    }

    pub fn wavelengths(&self) -> &[Wavelength] {
        &self.wavelengths
    }

    pub fn dmin(&self) -> f64 {
        self.dmin
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn get(&self, name: &str) -> Result<&T> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
            .ok_or_else(|| PhaseError::PhaseNotFound(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut T> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
            .ok_or_else(|| PhaseError::PhaseNotFound(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(n, t)| (n.as_str(), t))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut T)> {
        self.entries.iter_mut().map(|(n, t)| (n.as_str(), t))
    }

    /// Insert a phase, replacing (with a warning) one of the same name
    pub fn insert(&mut self, name: &str, phase: T) {
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| n == name) {
            warn!("phase '{}' already present, overwriting", name);
            slot.1 = phase;
        } else {
            self.entries.push((name.to_string(), phase));
        }
    }

    fn record_roster(&mut self, database: &str, names: &[&str]) {
        self.roster.push((
            database.to_string(),
            names.iter().map(|s| s.to_string()).collect(),
        ));
    }

    /// Write the roster this collection was loaded from
    pub fn dump<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut map = Map::new();
        for (file, names) in &self.roster {
            let list = names.iter().map(|n| Value::String(n.clone())).collect();
            map.insert(file.clone(), Value::Array(list));
        }
        fs::write(path, serde_json::to_string_pretty(&Value::Object(map))?)?;
        Ok(())
    }
}

/// Parse a roster file into (database path, crystal names) pairs
pub fn read_roster<P: AsRef<Path>>(path: P) -> Result<Vec<(PathBuf, String, Vec<String>)>> {
    let path = path.as_ref();
    let map: Map<String, Value> = serde_json::from_str(&fs::read_to_string(path)?)?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));

    map.into_iter()
        .map(|(file, names)| -> Result<(PathBuf, String, Vec<String>)> {
            let names: Vec<String> = serde_json::from_value(names)?;
            let resolved = if Path::new(&file).is_absolute() {
                PathBuf::from(&file)
            } else {
                base.join(&file)
            };
            Ok((resolved, file, names))
        })
        .collect()
}

impl LeBailPhases {
    /// Cu Kα1/Kα2 and the default resolution limit
    pub fn with_defaults() -> Self {
        Self {
            entries: Vec::new(),
            wavelengths: Wavelength::defaults(),
            dmin: DEFAULT_DMIN_NM,
            roster: Vec::new(),
        }
    }

    pub fn add_many(&mut self, database: &MaterialDatabase, names: &[&str]) -> Result<()> {
        for name in names {
            let material = database.material(name, self.dmin)?;
            info!("loaded phase {}", material);
            self.insert(name, material);
        }
        Ok(())
    }

    /// Add every phase named in a roster file
    pub fn load<P: AsRef<Path>>(&mut self, roster: P) -> Result<()> {
        for (path, file, names) in read_roster(roster)? {
            let database = MaterialDatabase::from_file(&path)?;
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            self.add_many(&database, &names)?;
            self.record_roster(&file, &names);
        }
        Ok(())
    }
}

impl RietveldPhases {
    pub fn with_defaults() -> Self {
        Self {
            entries: Vec::new(),
            wavelengths: Wavelength::defaults(),
            dmin: DEFAULT_DMIN_NM,
            roster: Vec::new(),
        }
    }

    /// Build each phase once per wavelength and rebalance the phase fractions
    pub fn add_many(
        &mut self,
        database: &MaterialDatabase,
        names: &[&str],
        anomalous: &AnomalousTable,
    ) -> Result<()> {
        for name in names {
            let channels = self
                .wavelengths
                .iter()
                .map(|w| database.rietveld_material(name, self.dmin, w.energy_kev(), anomalous))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            if let Some(first) = channels.first() {
                info!("loaded phase {}", first.material());
            }
            self.insert(name, channels);
        }
        self.balance_phase_fractions();
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(&mut self, roster: P, anomalous: &AnomalousTable) -> Result<()> {
        for (path, file, names) in read_roster(roster)? {
            let database = MaterialDatabase::from_file(&path)?;
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            self.add_many(&database, &names, anomalous)?;
            self.record_roster(&file, &names);
        }
        Ok(())
    }

    /// Give every phase the fraction `1 / number of phases`
    pub fn balance_phase_fractions(&mut self) {
        let fraction = 1.0 / self.entries.len().max(1) as f64;
        for (_, channels) in &mut self.entries {
            for material in channels {
                material.set_phase_fraction(fraction);
            }
        }
    }
}

impl<T> fmt::Display for Phases<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Phases in calculation:")?;
        for (i, (name, _)) in self.entries.iter().enumerate() {
            writeln!(f, "\t{}. {}", i + 1, name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DB: &str = r#"{
        "NaCl": {
            "space_group_number": 225,
            "lattice_parameters": [0.564, 0.564, 0.564, 90.0, 90.0, 90.0],
            "atoms": [
                { "element": "Na", "position": [0.0, 0.0, 0.0] },
                { "element": "Cl", "position": [0.5, 0.5, 0.5] }
            ]
        },
        "Si": {
            "space_group_number": 227,
            "space_group_setting": 1,
            "lattice_parameters": [0.5431, 0.5431, 0.5431, 90.0, 90.0, 90.0],
            "atoms": [ { "element": "Si", "position": [0.0, 0.0, 0.0] } ]
        }
    }"#;

    #[test]
    fn test_lebail_roster_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("materials.json"), DB).unwrap();
        let roster = dir.path().join("phases.json");
        fs::write(&roster, r#"{ "materials.json": ["Si", "NaCl"] }"#).unwrap();

        let mut phases = LeBailPhases::with_defaults();
        phases.load(&roster).unwrap();
        assert_eq!(phases.names().collect::<Vec<_>>(), vec!["Si", "NaCl"]);
        assert!(phases.get("Si").is_ok());
        assert!(matches!(phases.get("Ge"), Err(PhaseError::PhaseNotFound(_))));

        let dumped = dir.path().join("dumped.json");
        phases.dump(&dumped).unwrap();
        let mut again = LeBailPhases::with_defaults();
        again.load(&dumped).unwrap();
        assert_eq!(again.len(), 2);
        assert!(phases.to_string().contains("2. NaCl"));
    }

    #[test]
    fn test_rietveld_phase_fractions() {
        let db = MaterialDatabase::from_json_str(DB).unwrap();
        let mut phases = RietveldPhases::with_defaults();
        phases
            .add_many(&db, &["NaCl", "Si"], &AnomalousTable::empty())
            .unwrap();
        let nacl = phases.get("NaCl").unwrap();
        assert_eq!(nacl.len(), 2);
        assert_eq!(nacl[0].phase_fraction(), 0.5);
        assert!(nacl[1].wavelength_nm() > nacl[0].wavelength_nm());
    }

    #[test]
    fn test_requires_a_wavelength() {
        assert!(LeBailPhases::new(Vec::new(), 0.05).is_err());
    }
}
