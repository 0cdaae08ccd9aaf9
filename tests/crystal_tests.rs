/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

use approx::assert_relative_eq;
use rstest::rstest;
use wppf_rs::crystal::{Lattice, Material, MaterialDatabase, SpaceGroup};

#[test]
fn test_table_absences_match_operators() {
    let mut settings_checked = 0;
    for number in 1..=230u16 {
        let groups = (0..2).map_while(|setting| SpaceGroup::new(number, setting).ok().map(|sg| (setting, sg)));
        for (setting, sg) in groups {
            settings_checked += 1;
            for h in -4..=4 {
                for k in -4..=4 {
                    for l in -4..=4 {
                        let hkl = [h, k, l];
                        if hkl == [0, 0, 0] {
                            continue;
                        }
                        assert_eq!(
                            sg.is_allowed(&hkl).unwrap(),
                            sg.is_allowed_by_operators(&hkl),
                            "group {} setting {} reflection {:?}",
                            number,
                            setting,
                            hkl
                        );
                    }
                }
            }
        }
    }
    // every group has its standard setting, some an alternative
    assert!(settings_checked > 230);
}

#[rstest]
#[case([0.5, 0.6, 0.7, 90.0, 90.0, 90.0])]
#[case([0.3, 0.3, 0.5, 90.0, 90.0, 120.0])]
#[case([0.52, 0.61, 0.49, 82.0, 97.5, 104.0])]
fn test_metric_tensor_inverse(#[case] lp: [f64; 6]) {
    let lattice = Lattice::new(lp).unwrap();
    let g = lattice.dmt();
    let gs = lattice.rmt();
    for i in 0..3 {
        for j in 0..3 {
            let v: f64 = (0..3).map(|k| g[i][k] * gs[k][j]).sum();
            assert_relative_eq!(v, if i == j { 1.0 } else { 0.0 }, epsilon = 1e-10);
        }
    }
}

#[test]
fn test_rock_salt_reflection_list() {
    let nacl = Material::new("NaCl", 225, 0, [0.564, 0.564, 0.564, 90.0, 90.0, 90.0], 0.1).unwrap();
    assert_eq!(
        &nacl.hkls()[..5],
        &[[1, 1, 1], [2, 0, 0], [2, 2, 0], [3, 1, 1], [2, 2, 2]]
    );
    assert_eq!(&nacl.multiplicity()[..5], &[8, 6, 12, 24, 8]);
    assert!(nacl.hkls().iter().all(|hkl| {
        let parity = hkl.iter().map(|v| v.rem_euclid(2)).sum::<i32>();
        parity == 0 || parity == 3
    }));
    assert!(nacl
        .hkls()
        .iter()
        .all(|hkl| nacl.lattice().d_spacing(hkl) >= 0.1 - 1e-12));
}

#[test]
fn test_database_round_trip() {
    let json = r#"{
        "Si": {
            "space_group_number": 227,
            "space_group_setting": 1,
            "lattice_parameters": [0.5431, 0.5431, 0.5431, 90.0, 90.0, 90.0],
            "atoms": [
                {"element": "Si", "position": [0.0, 0.0, 0.0], "occupancy": 1.0, "u": 5e-5}
            ]
        }
    }"#;
    let db = MaterialDatabase::from_json_str(json).unwrap();
    let si = db.material("Si", 0.1).unwrap();
    assert_relative_eq!(si.lattice_parameters()[2], 0.5431);
    assert_eq!(si.space_group().number(), 227);
    // the d glide removes 200 and 420; 222 is only a site extinction
    assert_eq!(&si.hkls()[..4], &[[1, 1, 1], [2, 2, 0], [3, 1, 1], [2, 2, 2]]);
    assert!(!si.hkls().contains(&[2, 0, 0]));
    assert!(!si.hkls().contains(&[4, 2, 0]));
}
