/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Systematic absences
//!
//! Lattice centering and the glide-plane / screw-axis extinction rules of the
//! International Tables, kept as data: each (lattice system, symbol position,
//! symmetry code) maps to a list of zone/condition pairs. A reflection lying
//! in a rule's zone must satisfy its condition to be observed.

use super::errors::{CrystalError, Result};
use super::lattice::LatticeSystem;

pub type Hkl = [i32; 3];

/// Is a reflection allowed by the centering of the lattice?
pub fn centering_allows(centering: char, hkl: &Hkl) -> Result<bool> {
    let [h, k, l] = *hkl;
    let allowed = match centering {
        'P' => true,
        'F' => {
            let parity = h.rem_euclid(2) + k.rem_euclid(2) + l.rem_euclid(2);
            parity == 0 || parity == 3
        }
        'I' => even(h + k + l),
        'A' => even(k + l),
        'B' => even(h + l),
        'C' => even(h + k),
        'R' => (-h + k + l).rem_euclid(3) == 0,
        other => return Err(CrystalError::UnknownCentering(other)),
    };
    Ok(allowed)
}

/// A glide plane or screw axis read from a Hermann-Mauguin symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymmetryElement {
    /// Glide plane with translation code `a`, `b`, `c`, `n` or `d`
    Glide { position: usize, code: char },
    /// Screw axis `N_k`
    Screw {
        position: usize,
        order: u32,
        translation: u32,
    },
}

impl SymmetryElement {
    pub fn position(&self) -> usize {
        match self {
            SymmetryElement::Glide { position, .. } | SymmetryElement::Screw { position, .. } => {
                *position
            }
        }
    }

    /// The code used to index the rule table, e.g. `c` or `21`
    pub fn code(&self) -> String {
        match self {
            SymmetryElement::Glide { code, .. } => code.to_string(),
            SymmetryElement::Screw {
                order, translation, ..
            } => format!("{}{}", order, translation),
        }
    }
}

/// Glide planes and screw axes in a full Hermann-Mauguin symbol such as `P 21/n 21/m 21/a`
///
/// The first token is the lattice letter; the remaining tokens are numbered
/// from zero by their position in the symbol.
pub fn parse_symmetry_elements(hermann_mauguin: &str) -> Vec<SymmetryElement> {
    let mut elements = Vec::new();
    for (position, token) in hermann_mauguin.split_whitespace().skip(1).enumerate() {
        let (rotation, plane) = match token.split_once('/') {
            Some((r, p)) => (Some(r), Some(p)),
            None if token.starts_with(|c: char| c.is_ascii_digit() || c == '-') => {
                (Some(token), None)
            }
            None => (None, Some(token)),
        };

        if let Some(rotation) = rotation {
            let digits: Vec<u32> = rotation
                .trim_start_matches('-')
                .chars()
                .filter_map(|c| c.to_digit(10))
                .collect();
            if let [order, translation] = digits[..] {
                elements.push(SymmetryElement::Screw {
                    position,
                    order,
                    translation,
                });
            }
        }

        if let Some(code) = plane.and_then(|p| p.chars().next()) {
            if matches!(code, 'a' | 'b' | 'c' | 'n' | 'd' | 'e') {
                elements.push(SymmetryElement::Glide { position, code });
            }
        }
    }
    elements
}

/// One extinction rule: reflections in `zone` are observed only if `allowed`
#[derive(Clone, Copy)]
pub struct AbsenceRule {
    pub zone: fn(&Hkl) -> bool,
    pub allowed: fn(&Hkl) -> bool,
}

impl AbsenceRule {
    pub fn is_absent(&self, hkl: &Hkl) -> bool {
        (self.zone)(hkl) && !(self.allowed)(hkl)
    }
}

impl std::fmt::Debug for AbsenceRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AbsenceRule")
    }
}

fn even(x: i32) -> bool {
    x.rem_euclid(2) == 0
}

fn div3(x: i32) -> bool {
    x.rem_euclid(3) == 0
}

fn div4(x: i32) -> bool {
    x.rem_euclid(4) == 0
}

fn div6(x: i32) -> bool {
    x.rem_euclid(6) == 0
}

macro_rules! rule {
    (|$h:ident| $zone:expr => $allowed:expr) => {
        AbsenceRule {
            zone: |$h: &Hkl| $zone,
            allowed: |$h: &Hkl| $allowed,
        }
    };
}

struct CodeRules {
    system: LatticeSystem,
    position: usize,
    codes: &'static [&'static str],
    rules: &'static [AbsenceRule],
}

use LatticeSystem::*;

const HEX_ZONES_1_C: &[AbsenceRule] = &[
    rule!(|h| h[0] == 0 => even(h[2])),
    rule!(|h| h[1] == 0 => even(h[2])),
    rule!(|h| h[0] == -h[1] => even(h[2])),
];

const HEX_ZONES_2_C: &[AbsenceRule] = &[
    rule!(|h| h[0] == h[1] => even(h[2])),
    rule!(|h| h[0] == -2 * h[1] => even(h[2])),
    rule!(|h| h[1] == -2 * h[0] => even(h[2])),
];

static RULE_TABLE: &[CodeRules] = &[
    // monoclinic, unique axis b
    CodeRules { system: Monoclinic, position: 1, codes: &["c"], rules: &[rule!(|h| h[1] == 0 => even(h[2]))] },
    CodeRules { system: Monoclinic, position: 1, codes: &["a"], rules: &[rule!(|h| h[1] == 0 => even(h[0]))] },
    CodeRules { system: Monoclinic, position: 1, codes: &["n"], rules: &[rule!(|h| h[1] == 0 => even(h[0] + h[2]))] },
    CodeRules { system: Monoclinic, position: 1, codes: &["21"], rules: &[rule!(|h| h[0] == 0 && h[2] == 0 => even(h[1]))] },
    // orthorhombic glides: 0kl, h0l, hk0
    CodeRules { system: Orthorhombic, position: 0, codes: &["b"], rules: &[rule!(|h| h[0] == 0 => even(h[1]))] },
    CodeRules { system: Orthorhombic, position: 0, codes: &["c"], rules: &[rule!(|h| h[0] == 0 => even(h[2]))] },
    CodeRules { system: Orthorhombic, position: 0, codes: &["n"], rules: &[rule!(|h| h[0] == 0 => even(h[1] + h[2]))] },
    CodeRules { system: Orthorhombic, position: 0, codes: &["d"], rules: &[rule!(|h| h[0] == 0 => div4(h[1] + h[2]))] },
    CodeRules { system: Orthorhombic, position: 1, codes: &["c"], rules: &[rule!(|h| h[1] == 0 => even(h[2]))] },
    CodeRules { system: Orthorhombic, position: 1, codes: &["a"], rules: &[rule!(|h| h[1] == 0 => even(h[0]))] },
    CodeRules { system: Orthorhombic, position: 1, codes: &["n"], rules: &[rule!(|h| h[1] == 0 => even(h[0] + h[2]))] },
    CodeRules { system: Orthorhombic, position: 1, codes: &["d"], rules: &[rule!(|h| h[1] == 0 => div4(h[0] + h[2]))] },
    CodeRules { system: Orthorhombic, position: 2, codes: &["a"], rules: &[rule!(|h| h[2] == 0 => even(h[0]))] },
    CodeRules { system: Orthorhombic, position: 2, codes: &["b"], rules: &[rule!(|h| h[2] == 0 => even(h[1]))] },
    CodeRules { system: Orthorhombic, position: 2, codes: &["n"], rules: &[rule!(|h| h[2] == 0 => even(h[0] + h[1]))] },
    CodeRules { system: Orthorhombic, position: 2, codes: &["d"], rules: &[rule!(|h| h[2] == 0 => div4(h[0] + h[1]))] },
    // orthorhombic screws: h00, 0k0, 00l
    CodeRules { system: Orthorhombic, position: 0, codes: &["21"], rules: &[rule!(|h| h[1] == 0 && h[2] == 0 => even(h[0]))] },
    CodeRules { system: Orthorhombic, position: 1, codes: &["21"], rules: &[rule!(|h| h[0] == 0 && h[2] == 0 => even(h[1]))] },
    CodeRules { system: Orthorhombic, position: 2, codes: &["21"], rules: &[rule!(|h| h[0] == 0 && h[1] == 0 => even(h[2]))] },
    // tetragonal glides
    CodeRules { system: Tetragonal, position: 0, codes: &["a"], rules: &[rule!(|h| h[2] == 0 => even(h[0]))] },
    CodeRules { system: Tetragonal, position: 0, codes: &["b"], rules: &[rule!(|h| h[2] == 0 => even(h[1]))] },
    CodeRules { system: Tetragonal, position: 0, codes: &["n"], rules: &[rule!(|h| h[2] == 0 => even(h[0] + h[1]))] },
    CodeRules { system: Tetragonal, position: 0, codes: &["d"], rules: &[rule!(|h| h[2] == 0 => div4(h[0] + h[1]))] },
    CodeRules {
        system: Tetragonal,
        position: 1,
        codes: &["a", "b"],
        rules: &[rule!(|h| h[0] == 0 => even(h[1])), rule!(|h| h[1] == 0 => even(h[0]))],
    },
    CodeRules {
        system: Tetragonal,
        position: 1,
        codes: &["c"],
        rules: &[rule!(|h| h[0] == 0 => even(h[2])), rule!(|h| h[1] == 0 => even(h[2]))],
    },
    CodeRules {
        system: Tetragonal,
        position: 1,
        codes: &["n"],
        rules: &[rule!(|h| h[0] == 0 => even(h[1] + h[2])), rule!(|h| h[1] == 0 => even(h[0] + h[2]))],
    },
    CodeRules {
        system: Tetragonal,
        position: 1,
        codes: &["d"],
        rules: &[rule!(|h| h[0] == 0 => div4(h[1] + h[2])), rule!(|h| h[1] == 0 => div4(h[0] + h[2]))],
    },
    CodeRules { system: Tetragonal, position: 2, codes: &["c", "n"], rules: &[rule!(|h| h[0].abs() == h[1].abs() => even(h[2]))] },
    CodeRules { system: Tetragonal, position: 2, codes: &["d"], rules: &[rule!(|h| h[0].abs() == h[1].abs() => div4(2 * h[0] + h[2]))] },
    // tetragonal screws
    CodeRules { system: Tetragonal, position: 0, codes: &["42"], rules: &[rule!(|h| h[0] == 0 && h[1] == 0 => even(h[2]))] },
    CodeRules { system: Tetragonal, position: 0, codes: &["41", "43"], rules: &[rule!(|h| h[0] == 0 && h[1] == 0 => div4(h[2]))] },
    CodeRules {
        system: Tetragonal,
        position: 1,
        codes: &["21"],
        rules: &[
            rule!(|h| h[1] == 0 && h[2] == 0 => even(h[0])),
            rule!(|h| h[0] == 0 && h[2] == 0 => even(h[1])),
        ],
    },
    // trigonal, hexagonal axes
    CodeRules { system: Trigonal, position: 1, codes: &["c"], rules: HEX_ZONES_1_C },
    CodeRules { system: Trigonal, position: 2, codes: &["c"], rules: HEX_ZONES_2_C },
    CodeRules { system: Trigonal, position: 0, codes: &["31", "32"], rules: &[rule!(|h| h[0] == 0 && h[1] == 0 => div3(h[2]))] },
    // rhombohedral axes
    CodeRules {
        system: Rhombohedral,
        position: 1,
        codes: &["c"],
        rules: &[
            rule!(|h| h[0] == h[1] => even(h[2])),
            rule!(|h| h[1] == h[2] => even(h[0])),
            rule!(|h| h[0] == h[2] => even(h[1])),
        ],
    },
    // hexagonal
    CodeRules { system: Hexagonal, position: 1, codes: &["c"], rules: HEX_ZONES_1_C },
    CodeRules { system: Hexagonal, position: 2, codes: &["c"], rules: HEX_ZONES_2_C },
    CodeRules { system: Hexagonal, position: 0, codes: &["63"], rules: &[rule!(|h| h[0] == 0 && h[1] == 0 => even(h[2]))] },
    CodeRules {
        system: Hexagonal,
        position: 0,
        codes: &["31", "32", "62", "64"],
        rules: &[rule!(|h| h[0] == 0 && h[1] == 0 => div3(h[2]))],
    },
    CodeRules { system: Hexagonal, position: 0, codes: &["61", "65"], rules: &[rule!(|h| h[0] == 0 && h[1] == 0 => div6(h[2]))] },
    // cubic glides
    CodeRules {
        system: Cubic,
        position: 0,
        codes: &["a"],
        rules: &[
            rule!(|h| h[0] == 0 => even(h[1])),
            rule!(|h| h[1] == 0 => even(h[2])),
            rule!(|h| h[2] == 0 => even(h[0])),
        ],
    },
    CodeRules {
        system: Cubic,
        position: 0,
        codes: &["n"],
        rules: &[
            rule!(|h| h[0] == 0 => even(h[1] + h[2])),
            rule!(|h| h[1] == 0 => even(h[0] + h[2])),
            rule!(|h| h[2] == 0 => even(h[0] + h[1])),
        ],
    },
    CodeRules {
        system: Cubic,
        position: 0,
        codes: &["d"],
        rules: &[
            rule!(|h| h[0] == 0 => div4(h[1] + h[2])),
            rule!(|h| h[1] == 0 => div4(h[0] + h[2])),
            rule!(|h| h[2] == 0 => div4(h[0] + h[1])),
        ],
    },
    CodeRules {
        system: Cubic,
        position: 2,
        codes: &["a", "b", "c", "n"],
        rules: &[
            rule!(|h| h[0].abs() == h[1].abs() => even(h[2])),
            rule!(|h| h[1].abs() == h[2].abs() => even(h[0])),
            rule!(|h| h[0].abs() == h[2].abs() => even(h[1])),
        ],
    },
    CodeRules {
        system: Cubic,
        position: 2,
        codes: &["d"],
        rules: &[
            rule!(|h| h[0].abs() == h[1].abs() => div4(2 * h[0] + h[2])),
            rule!(|h| h[1].abs() == h[2].abs() => div4(h[0] + 2 * h[1])),
            rule!(|h| h[0].abs() == h[2].abs() => div4(2 * h[0] + h[1])),
        ],
    },
    // cubic screws
    CodeRules {
        system: Cubic,
        position: 0,
        codes: &["21", "42"],
        rules: &[
            rule!(|h| h[1] == 0 && h[2] == 0 => even(h[0])),
            rule!(|h| h[0] == 0 && h[2] == 0 => even(h[1])),
            rule!(|h| h[0] == 0 && h[1] == 0 => even(h[2])),
        ],
    },
    CodeRules {
        system: Cubic,
        position: 0,
        codes: &["41", "43"],
        rules: &[
            rule!(|h| h[1] == 0 && h[2] == 0 => div4(h[0])),
            rule!(|h| h[0] == 0 && h[2] == 0 => div4(h[1])),
            rule!(|h| h[0] == 0 && h[1] == 0 => div4(h[2])),
        ],
    },
];

/// Look up the extinction rules for every glide and screw of a group
///
/// Fails when a code is not meaningful at its position for the lattice
/// system, which indicates a corrupt symbol rather than a data condition.
pub fn compile_rules(
    system: LatticeSystem,
    elements: &[SymmetryElement],
) -> Result<Vec<AbsenceRule>> {
    let mut rules = Vec::new();
    for element in elements {
        let code = element.code();
        let entry = RULE_TABLE
            .iter()
            .find(|r| {
                r.system == system
                    && r.position == element.position()
                    && r.codes.contains(&code.as_str())
            })
            .ok_or_else(|| CrystalError::UnknownSymmetryCode {
                code: code.clone(),
                direction: element.position(),
                system,
            })?;
        rules.extend_from_slice(entry.rules);
    }
    Ok(rules)
}

/// Does any of the rules forbid this reflection?
pub fn is_systematically_absent(rules: &[AbsenceRule], hkl: &Hkl) -> bool {
    rules.iter().any(|r| r.is_absent(hkl))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case('F', [1, 1, 1], true)]
    #[case('F', [2, 0, 0], true)]
    #[case('F', [1, 0, 0], false)]
    #[case('F', [1, 1, 0], false)]
    #[case('F', [-1, 1, 1], true)]
    #[case('I', [1, 1, 0], true)]
    #[case('I', [1, 0, 0], false)]
    #[case('C', [1, 1, 1], true)]
    #[case('C', [1, 0, 1], false)]
    #[case('A', [1, 0, 1], false)]
    #[case('B', [1, 1, 1], true)]
    #[case('R', [1, 0, 1], true)]
    #[case('R', [1, 0, 0], false)]
    fn test_centering(#[case] centering: char, #[case] hkl: Hkl, #[case] allowed: bool) {
        assert_eq!(centering_allows(centering, &hkl).unwrap(), allowed);
    }

    #[test]
    fn test_unknown_centering() {
        assert!(matches!(
            centering_allows('X', &[1, 0, 0]),
            Err(CrystalError::UnknownCentering('X'))
        ));
    }

    #[test]
    fn test_parse_symmetry_elements() {
        let elements = parse_symmetry_elements("P 21/n 21/m 21/a");
        assert_eq!(
            elements,
            vec![
                SymmetryElement::Screw { position: 0, order: 2, translation: 1 },
                SymmetryElement::Glide { position: 0, code: 'n' },
                SymmetryElement::Screw { position: 1, order: 2, translation: 1 },
                SymmetryElement::Screw { position: 2, order: 2, translation: 1 },
                SymmetryElement::Glide { position: 2, code: 'a' },
            ]
        );
        assert!(parse_symmetry_elements("F 4/m -3 2/m").is_empty());
        assert_eq!(
            parse_symmetry_elements("P 3 1 c"),
            vec![SymmetryElement::Glide { position: 2, code: 'c' }]
        );
    }

    #[test]
    fn test_p21c_rules() {
        let elements = parse_symmetry_elements("P 1 21/c 1");
        let rules = compile_rules(LatticeSystem::Monoclinic, &elements).unwrap();
        assert!(is_systematically_absent(&rules, &[1, 0, 1]));
        assert!(!is_systematically_absent(&rules, &[1, 0, 2]));
        assert!(is_systematically_absent(&rules, &[0, 3, 0]));
        assert!(!is_systematically_absent(&rules, &[0, 2, 0]));
        assert!(!is_systematically_absent(&rules, &[1, 1, 1]));
    }

    #[test]
    fn test_invalid_code_is_rejected() {
        let elements = vec![SymmetryElement::Glide { position: 0, code: 'c' }];
        assert!(matches!(
            compile_rules(LatticeSystem::Monoclinic, &elements),
            Err(CrystalError::UnknownSymmetryCode { .. })
        ));
        let elements = vec![SymmetryElement::Glide { position: 1, code: 'n' }];
        assert!(compile_rules(LatticeSystem::Hexagonal, &elements).is_err());
    }
}
