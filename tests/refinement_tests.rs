/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

use approx::assert_relative_eq;
use tempfile::tempdir;
use wppf_rs::atoms::{AtomSite, Displacement};
use wppf_rs::config::RefinementConfig;
use wppf_rs::crystal::{AnomalousTable, Material, RietveldMaterial};
use wppf_rs::parameters::ParameterSet;
use wppf_rs::phases::{LeBailPhases, RietveldPhases, Wavelength};
use wppf_rs::refinement::{LeBail, Refinement, RefinementError, Rietveld, VaryToggles};
use wppf_rs::spectrum::{FixedAnchors, Spectrum};
use wppf_rs::utils::linspace;

const CEO2: [f64; 6] = [0.5411, 0.5411, 0.5411, 90.0, 90.0, 90.0];

fn flat(level: f64) -> (Spectrum, FixedAnchors) {
    let x = linspace(25.0, 60.0, 1401);
    let y = vec![level; x.len()];
    let anchors = FixedAnchors::new(vec![(25.0, level), (60.0, level)]);
    (Spectrum::new(x, y).unwrap(), anchors)
}

fn lebail_phases() -> LeBailPhases {
    let mut phases = LeBailPhases::new(vec![Wavelength::new("alpha1", 0.15406, 1.0)], 0.1).unwrap();
    phases.insert("CeO2", Material::new("CeO2", 225, 0, CEO2, 0.1).unwrap());
    phases
}

fn rietveld_phases() -> RietveldPhases {
    let wavelength = Wavelength::new("alpha1", 0.15406, 1.0);
    let sites = vec![
        AtomSite::new(58, [0.0, 0.0, 0.0], 1.0, Displacement::Isotropic(5e-5)).unwrap(),
        AtomSite::new(8, [0.25, 0.25, 0.25], 1.0, Displacement::Isotropic(1e-4)).unwrap(),
    ];
    let material = RietveldMaterial::new(
        Material::new("CeO2", 225, 0, CEO2, 0.1).unwrap(),
        sites,
        wavelength.energy_kev(),
        &AnomalousTable::empty(),
    )
    .unwrap();
    let mut phases = RietveldPhases::new(vec![wavelength], 0.1).unwrap();
    phases.insert("CeO2", vec![material]);
    phases
}

fn profile_values(params: &mut ParameterSet, suffixes: &[&str]) {
    for suffix in suffixes {
        params.set_value(&format!("U{}", suffix), 0.0).unwrap();
        params.set_value(&format!("V{}", suffix), 0.0).unwrap();
        params.set_value(&format!("W{}", suffix), 0.01).unwrap();
        params.set_value(&format!("X{}", suffix), 0.02).unwrap();
    }
    params.set_value("eta1", 0.5).unwrap();
    params.set_value("eta2", 0.0).unwrap();
    params.set_value("eta3", 0.0).unwrap();
}

#[test]
fn test_split_model_reduces_to_symmetric() {
    let (expt, anchors) = flat(10.0);
    let config = RefinementConfig::default();

    let mut symmetric = ParameterSet::defaults();
    profile_values(&mut symmetric, &[""]);
    let mut split = ParameterSet::split_defaults();
    profile_values(&mut split, &["l", "r"]);

    let a = LeBail::new(expt.clone(), lebail_phases(), symmetric, &anchors, &config).unwrap();
    let b = LeBail::new_split(expt, lebail_phases(), split, &anchors, &config).unwrap();
    for (ya, yb) in a.simulated().y().iter().zip(b.simulated().y()) {
        assert_relative_eq!(*ya, *yb, epsilon = 1e-6, max_relative = 1e-9);
    }
}

#[test]
fn test_lebail_refits_its_own_pattern() {
    let (expt, anchors) = flat(10.0);
    let config = RefinementConfig::default();
    let mut params = ParameterSet::defaults();
    profile_values(&mut params, &[""]);

    let generator = LeBail::new(expt, lebail_phases(), params.clone(), &anchors, &config).unwrap();
    let synthetic = generator.simulated().clone();

    let mut model = LeBail::new(synthetic, lebail_phases(), params, &anchors, &config).unwrap();
    let first = model.refine_cycle().unwrap();
    let second = model.refine_cycle().unwrap();
    assert_eq!(first.iteration, 1);
    assert_eq!(second.iteration, 2);
    assert!(second.outcome.rwp < 1e-2);
    assert_eq!(model.history().niter(), 2);
    assert_eq!(model.history().rwp_history().len(), 2);
}

#[test]
fn test_toggles_on_rietveld_model() {
    let (expt, anchors) = flat(10.0);
    let mut model = Rietveld::new(
        expt,
        rietveld_phases(),
        ParameterSet::defaults(),
        &anchors,
        &RefinementConfig::default(),
    )
    .unwrap();

    // symmetric widths carry no P term
    assert_eq!(model.vary_cagliotti(true), 3);
    assert!(!model.parameters().contains("P"));
    assert_eq!(model.vary_lattice(true), 1);
    assert_eq!(model.vary_positions(Some("O1"), true).unwrap(), 3);
    assert_eq!(model.vary_displacement(None, true).unwrap(), 2);
    assert!(model.parameters().get("CeO2_O1_x").unwrap().vary);
    assert!(!model.parameters().get("CeO2_Ce1_x").unwrap().vary);

    assert!(matches!(
        model.vary_occupancy(Some("Zr1"), true),
        Err(RefinementError::MissingParameter(_))
    ));
    assert!(model.vary_phase_lattice("ZrO2", true).is_err());

    model.vary_all(false);
    assert_eq!(model.parameters().varying().count(), 0);
}

#[test]
fn test_parameters_survive_dump_and_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("params.json");
    let (expt, anchors) = flat(10.0);
    let mut model = Rietveld::new(
        expt,
        rietveld_phases(),
        ParameterSet::defaults(),
        &anchors,
        &RefinementConfig::default(),
    )
    .unwrap();
    model.vary_lattice(true);
    model.parameters().dump(&path).unwrap();

    let reloaded = ParameterSet::from_file(&path).unwrap();
    assert_eq!(reloaded.len(), model.parameters().len());
    let names: Vec<&str> = reloaded.names().collect();
    let original: Vec<&str> = model.parameters().names().collect();
    assert_eq!(names, original);
    let a = reloaded.get("CeO2_a").unwrap();
    assert_relative_eq!(a.value, 0.5411);
    assert!(a.vary);
}

#[test]
fn test_background_round_trip() {
    let x = linspace(20.0, 40.0, 201);
    let y: Vec<f64> = x.iter().map(|v| 100.0 + (v - 30.0).powi(2)).collect();
    let spectrum = Spectrum::new(x.clone(), y).unwrap();
    let background = Spectrum::new(x.clone(), x.iter().map(|v| 0.5 * v).collect()).unwrap();

    let restored = (&(&spectrum + &background).unwrap() - &background).unwrap();
    for (a, b) in restored.y().iter().zip(spectrum.y()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-9);
    }
}
