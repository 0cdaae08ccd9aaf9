/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

use std::fs;
use std::path::Path;

use tempfile::{tempdir, TempDir};
use wppf_rs::cli::{refine, Method, RefineArgs, VaryGroup};
use wppf_rs::config::RefinementConfig;
use wppf_rs::parameters::ParameterSet;
use wppf_rs::phases::LeBailPhases;
use wppf_rs::refinement::{LeBail, Refinement};
use wppf_rs::spectrum::{FixedAnchors, Spectrum};
use wppf_rs::utils::linspace;

const DATABASE: &str = r#"{
    "CeO2": {
        "space_group_number": 225,
        "space_group_setting": 1,
        "lattice_parameters": [0.5411, 0.5411, 0.5411, 90.0, 90.0, 90.0],
        "atoms": [
            { "element": "Ce", "position": [0.0, 0.0, 0.0], "u": 5e-5 },
            { "element": "O", "position": [0.25, 0.25, 0.25], "u": 1e-4 }
        ]
    }
}"#;

/// Materials database, roster, anchors and a LeBail pattern of CeO2
fn workspace() -> TempDir {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("materials.json"), DATABASE).unwrap();
    fs::write(dir.path().join("phases.json"), r#"{ "materials.json": ["CeO2"] }"#).unwrap();
    fs::write(dir.path().join("anchors.xy"), "25.0 10.0\n60.0 10.0\n").unwrap();

    let config = RefinementConfig::default();
    let mut phases = LeBailPhases::new(config.wavelengths.clone(), config.dmin).unwrap();
    phases.load(dir.path().join("phases.json")).unwrap();
    let x = linspace(25.0, 60.0, 1401);
    let flat = Spectrum::new(x.clone(), vec![10.0; x.len()]).unwrap();
    let anchors = FixedAnchors::new(vec![(25.0, 10.0), (60.0, 10.0)]);
    let generator = LeBail::new(flat, phases, ParameterSet::defaults(), &anchors, &config).unwrap();
    generator
        .simulated()
        .save(dir.path().join("ceo2.xy"), "synthetic CeO2")
        .unwrap();
    dir
}

fn args(dir: &Path, method: Method) -> RefineArgs {
    RefineArgs {
        spectrum: dir.join("ceo2.xy"),
        phases: dir.join("phases.json"),
        params: None,
        config: None,
        anchors: Some(dir.join("anchors.xy")),
        anomalous: None,
        flux: None,
        method,
        cycles: 2,
        vary: Vec::new(),
        dump_params: Some(dir.join("refined.json")),
        output: Some(dir.join("simulated.xy")),
    }
}

#[test]
fn test_lebail_end_to_end() {
    let dir = workspace();
    let reports = refine(&args(dir.path(), Method::Lebail)).unwrap();
    assert_eq!(reports.len(), 2);
    assert!(reports[1].outcome.rwp < 1e-2);
    assert!(reports[1].to_string().starts_with("Finished iteration."));

    let params = ParameterSet::from_file(dir.path().join("refined.json")).unwrap();
    assert!(params.contains("CeO2_a"));
    let simulated = Spectrum::from_file(dir.path().join("simulated.xy")).unwrap();
    assert_eq!(simulated.len(), 1401);
}

#[test]
fn test_rietveld_end_to_end() {
    let dir = workspace();
    let mut run = args(dir.path(), Method::Rietveld);
    run.cycles = 1;
    run.vary = vec![VaryGroup::Scale];
    let reports = refine(&run).unwrap();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].outcome.rwp.is_finite());

    let params = ParameterSet::from_file(dir.path().join("refined.json")).unwrap();
    assert!(params.get("scale").unwrap().vary);
    assert!(params.contains("CeO2_O1_occ"));
}

#[test]
fn test_fpa_requires_flux() {
    let dir = workspace();
    let err = refine(&args(dir.path(), Method::LebailFpa)).unwrap_err();
    assert!(err.to_string().contains("--flux"));
}

#[test]
fn test_missing_phase_file() {
    let dir = workspace();
    let mut run = args(dir.path(), Method::Lebail);
    run.phases = dir.path().join("absent.json");
    assert!(refine(&run).is_err());
}
