/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Insertion-ordered parameter collections
//!
//! Parameter files are JSON objects mapping each name to
//! `[value, lower bound, upper bound, vary]`. Infinite bounds are written as
//! `null`.

use super::errors::{ParameterError, Result};
use super::keys::GlobalParam;
use super::parameter::Parameter;
use log::warn;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::ops::{Index, IndexMut};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    params: Vec<Parameter>,
    index: HashMap<String, usize>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Symmetric pseudo-Voigt defaults, all fixed
    pub fn defaults() -> Self {
        let mut set = Self::new();
        for (g, v) in [
            (GlobalParam::U, 0.5),
            (GlobalParam::V, 0.5),
            (GlobalParam::W, 0.5),
            (GlobalParam::X, 0.0),
            (GlobalParam::Y, 0.0),
        ] {
            set.add(Parameter::new(g.name(), v));
        }
        set.add_common();
        set
    }

    /// Split pseudo-Voigt defaults with independent left and right widths
    pub fn split_defaults() -> Self {
        let mut set = Self::new();
        for (g, v) in [
            (GlobalParam::Ul, 0.5),
            (GlobalParam::Vl, 0.5),
            (GlobalParam::Wl, 0.5),
            (GlobalParam::Pl, 0.0),
            (GlobalParam::Xl, 0.0),
            (GlobalParam::Yl, 0.0),
            (GlobalParam::Ur, 0.5),
            (GlobalParam::Vr, 0.5),
            (GlobalParam::Wr, 0.5),
            (GlobalParam::Pr, 0.0),
            (GlobalParam::Xr, 0.0),
            (GlobalParam::Yr, 0.0),
        ] {
            set.add(Parameter::new(g.name(), v));
        }
        set.add_common();
        set
    }

    /// Fundamental-parameters defaults
    ///
    /// Emission widths are in metres and the crystallite size in nm.
    pub fn fpa_defaults() -> Self {
        let mut set = Self::new();
        set.add(Parameter::with_bounds(
            GlobalParam::GaussWidth.name(),
            1e-13,
            0.0,
            f64::INFINITY,
            false,
        ));
        set.add(Parameter::with_bounds(
            GlobalParam::LorWidth.name(),
            1e-13,
            0.0,
            f64::INFINITY,
            false,
        ));
        set.add(Parameter::with_bounds(
            GlobalParam::CrystalliteSize.name(),
            100.0,
            1e-3,
            f64::INFINITY,
            false,
        ));
        set.add(Parameter::new(GlobalParam::ZeroError.name(), 0.0));
        set
    }

    fn add_common(&mut self) {
        for (g, v) in [
            (GlobalParam::Eta1, 1e-3),
            (GlobalParam::Eta2, 1e-3),
            (GlobalParam::Eta3, 1e-3),
            (GlobalParam::ZeroError, 0.0),
            (GlobalParam::Scale, 1.0),
        ] {
            self.add(Parameter::new(g.name(), v));
        }
    }

    /// Insert a parameter, overwriting (with a warning) one of the same name
    pub fn add(&mut self, parameter: Parameter) {
        match self.index.get(&parameter.name) {
            Some(&i) => {
                warn!(
                    "parameter '{}' already present, overwriting",
                    parameter.name
                );
                self.params[i] = parameter;
            }
            None => {
                self.index.insert(parameter.name.clone(), self.params.len());
                self.params.push(parameter);
            }
        }
    }

    /// Add several parameters given as parallel slices
    pub fn add_many(
        &mut self,
        names: &[&str],
        values: &[f64],
        lbs: &[f64],
        ubs: &[f64],
        varies: &[bool],
    ) -> Result<()> {
        let n = names.len();
        if values.len() != n || lbs.len() != n || ubs.len() != n || varies.len() != n {
            return Err(ParameterError::LengthMismatch(format!(
                "{} names, {} values, {} lower bounds, {} upper bounds, {} vary flags",
                n,
                values.len(),
                lbs.len(),
                ubs.len(),
                varies.len()
            )));
        }
        for i in 0..n {
            self.add(Parameter::with_bounds(
                names[i], values[i], lbs[i], ubs[i], varies[i],
            ));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.index.get(name).map(|&i| &self.params[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.index.get(name).map(|&i| &mut self.params[i])
    }

    pub fn value(&self, name: &str) -> Result<f64> {
        self.get(name)
            .map(|p| p.value)
            .ok_or_else(|| ParameterError::NotFound(name.to_string()))
    }

    pub fn set_value(&mut self, name: &str, value: f64) -> Result<()> {
        let p = self
            .get_mut(name)
            .ok_or_else(|| ParameterError::NotFound(name.to_string()))?;
        p.value = value;
        Ok(())
    }

    pub fn set_vary(&mut self, name: &str, vary: bool) -> Result<()> {
        let p = self
            .get_mut(name)
            .ok_or_else(|| ParameterError::NotFound(name.to_string()))?;
        p.vary = vary;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }

    /// Parameters currently free to vary, in insertion order
    pub fn varying(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter().filter(|p| p.vary)
    }

    pub fn vary_all(&mut self, vary: bool) {
        for p in &mut self.params {
            p.vary = vary;
        }
    }

    /// Set the vary flag of every parameter whose name matches; returns the number matched
    pub fn vary_matching<F>(&mut self, predicate: F, vary: bool) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let mut count = 0;
        for p in self.params.iter_mut().filter(|p| predicate(&p.name)) {
            p.vary = vary;
            count += 1;
        }
        count
    }

    /// Parse the JSON parameter table
    pub fn from_json_str(json: &str) -> Result<Self> {
        let map: Map<String, Value> = serde_json::from_str(json)?;
        let mut set = Self::new();
        for (name, entry) in map {
            set.add(parse_entry(&name, &entry)?);
        }
        Ok(set)
    }

    pub fn to_json_string(&self) -> Result<String> {
        let mut map = Map::new();
        for p in &self.params {
            map.insert(
                p.name.clone(),
                json!([finite_or_null(p.value), finite_or_null(p.lb), finite_or_null(p.ub), p.vary]),
            );
        }
        Ok(serde_json::to_string_pretty(&Value::Object(map))?)
    }

    /// Load a parameter file, adding its entries to this set
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let text = fs::read_to_string(path)?;
        let loaded = Self::from_json_str(&text)?;
        for p in loaded.params {
            self.add(p);
        }
        Ok(())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut set = Self::new();
        set.load(path)?;
        Ok(set)
    }

    pub fn dump<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}

fn finite_or_null(v: f64) -> Value {
    if v.is_finite() {
        json!(v)
    } else {
        Value::Null
    }
}

fn parse_entry(name: &str, entry: &Value) -> Result<Parameter> {
    let invalid = |reason: &str| ParameterError::InvalidEntry {
        name: name.to_string(),
        reason: reason.to_string(),
    };
    let items = entry
        .as_array()
        .filter(|a| a.len() == 4)
        .ok_or_else(|| invalid("expected [value, lb, ub, vary]"))?;

    let value = items[0]
        .as_f64()
        .ok_or_else(|| invalid("value must be a number"))?;
    let bound = |v: &Value, default: f64| -> Result<f64> {
        match v {
            Value::Null => Ok(default),
            other => other
                .as_f64()
                .ok_or_else(|| invalid("bounds must be numbers or null")),
        }
    };
    let lb = bound(&items[1], f64::NEG_INFINITY)?;
    let ub = bound(&items[2], f64::INFINITY)?;
    let vary = items[3]
        .as_bool()
        .ok_or_else(|| invalid("vary must be a boolean"))?;

    Ok(Parameter::with_bounds(name, value, lb, ub, vary))
}

impl Index<&str> for ParameterSet {
    type Output = Parameter;

    /// Panics when the name is absent; use [`ParameterSet::get`] for a fallible lookup.
    fn index(&self, name: &str) -> &Parameter {
        &self.params[self.index[name]]
    }
}

impl IndexMut<&str> for ParameterSet {
    fn index_mut(&mut self, name: &str) -> &mut Parameter {
        let i = self.index[name];
        &mut self.params[i]
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}

impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Parameters {{")?;
        for p in &self.params {
            writeln!(f, "  {}", p)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let set = ParameterSet::defaults();
        assert_eq!(set["U"].value, 0.5);
        assert_eq!(set["eta2"].value, 1e-3);
        assert_eq!(set["scale"].value, 1.0);
        assert!(set.varying().next().is_none());
        assert_eq!(set.names().next(), Some("U"));
        assert!(!set.contains("P"));

        let split = ParameterSet::split_defaults();
        assert!(split.contains("Yr") && !split.contains("U"));
        assert!(ParameterSet::fpa_defaults().contains("crystallite_size"));
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let mut set = ParameterSet::new();
        set.add(Parameter::new("a", 1.0));
        set.add(Parameter::new("b", 2.0));
        set.add(Parameter::new("a", 3.0));
        assert_eq!(set.len(), 2);
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(set["a"].value, 3.0);
    }

    #[test]
    fn test_add_many_checks_lengths() {
        let mut set = ParameterSet::new();
        assert!(set
            .add_many(&["a", "b"], &[1.0], &[0.0, 0.0], &[1.0, 1.0], &[true, false])
            .is_err());
        set.add_many(&["a", "b"], &[1.0, 2.0], &[0.0, 0.0], &[1.0, 3.0], &[true, false])
            .unwrap();
        assert_eq!(set.varying().count(), 1);
    }

    #[test]
    fn test_vary_matching() {
        let mut set = ParameterSet::defaults();
        let n = set.vary_matching(|name| name.starts_with("eta"), true);
        assert_eq!(n, 3);
        assert_eq!(set.varying().count(), 3);
        set.vary_all(false);
        assert_eq!(set.varying().count(), 0);
    }

    #[test]
    fn test_json_preserves_order_and_infinity() {
        let mut set = ParameterSet::new();
        set.add(Parameter::with_bounds("z", 1.0, f64::NEG_INFINITY, 2.0, true));
        set.add(Parameter::new("a", 0.5));
        let text = set.to_json_string().unwrap();
        assert!(text.find("\"z\"").unwrap() < text.find("\"a\"").unwrap());
        let back = ParameterSet::from_json_str(&text).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn test_malformed_entries() {
        assert!(ParameterSet::from_json_str(r#"{"U": [1.0, 0.0, 2.0]}"#).is_err());
        assert!(ParameterSet::from_json_str(r#"{"U": [1.0, "x", 2.0, true]}"#).is_err());
        assert!(ParameterSet::from_json_str(r#"{"U": [1.0, 0.0, 2.0, 1]}"#).is_err());
    }
}
