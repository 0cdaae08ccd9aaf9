/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Reflection generation
//!
//! Enumerates Miller indices inside a resolution limit, removes the
//! systematically absent ones, reduces the rest to one representative per
//! symmetry star and sorts them by increasing reciprocal length.

use super::absences::Hkl;
use super::errors::Result;
use super::hall::IMat3;
use super::lattice::{mat3_mul, Lattice, Space};
use super::space_group::SpaceGroup;
use std::collections::HashMap;

/// Map direct-space rotations into reciprocal space as `round(G · S · G*)`
pub fn reciprocal_operators(lattice: &Lattice, direct: &[IMat3]) -> Vec<IMat3> {
    direct
        .iter()
        .map(|s| {
            let s_f = s.map(|row| row.map(|v| v as f64));
            let m = mat3_mul(lattice.dmt(), &mat3_mul(&s_f, lattice.rmt()));
            m.map(|row| row.map(|v| v.round() as i32))
        })
        .collect()
}

/// Largest index along each axis whose d-spacing still exceeds `dmin`
pub fn max_indices(lattice: &Lattice, dmin: f64) -> [i32; 3] {
    let mut out = [1; 3];
    for (axis, n) in out.iter_mut().enumerate() {
        let mut v = [0.0; 3];
        loop {
            v[axis] = *n as f64;
            if 1.0 / lattice.calc_length(&v, Space::Reciprocal) > dmin {
                *n += 1;
            } else {
                break;
            }
        }
    }
    out
}

fn apply(op: &IMat3, h: &Hkl) -> Hkl {
    let mut out = [0; 3];
    for (i, o) in out.iter_mut().enumerate() {
        *o = op[i][0] * h[0] + op[i][1] * h[1] + op[i][2] * h[2];
    }
    out
}

/// Symmetry star of an integer triple, starting with the triple itself
pub fn hkl_star(hkl: &Hkl, operators: &[IMat3]) -> Vec<Hkl> {
    let mut star = vec![*hkl];
    for op in operators {
        let image = apply(op, hkl);
        if !star.contains(&image) {
            star.push(image);
        }
    }
    star
}

/// Symmetry star of a real vector, merging images closer than 1e-4
pub fn vector_star(v: &[f64; 3], operators: &[IMat3]) -> Vec<[f64; 3]> {
    let mut star = vec![*v];
    for op in operators {
        let mut image = [0.0; 3];
        for (i, o) in image.iter_mut().enumerate() {
            *o = op[i][0] as f64 * v[0] + op[i][1] as f64 * v[1] + op[i][2] as f64 * v[2];
        }
        let is_new = star.iter().all(|s| {
            (0..3).map(|i| (s[i] - image[i]).abs()).sum::<f64>() >= 1e-4
        });
        if is_new {
            star.push(image);
        }
    }
    star
}

/// Keep one member per symmetry star
///
/// The first member of each star encountered in `list` survives and is then
/// replaced by the star member with the largest component sum.
pub fn choose_symmetric(list: &[Hkl], operators: &[IMat3]) -> Vec<Hkl> {
    let index: HashMap<Hkl, usize> = list.iter().enumerate().map(|(i, h)| (*h, i)).collect();
    let mut keep = vec![true; list.len()];
    for (i, h) in list.iter().enumerate() {
        if !keep[i] {
            continue;
        }
        for other in hkl_star(h, operators).iter().skip(1) {
            if let Some(&j) = index.get(other) {
                keep[j] = false;
            }
        }
    }

    list.iter()
        .zip(keep)
        .filter(|(_, k)| *k)
        .map(|(h, _)| {
            let star = hkl_star(h, operators);
            let mut best = star[0];
            let mut best_sum = best.iter().sum::<i32>();
            for s in star.iter().skip(1) {
                let sum = s.iter().sum::<i32>();
                if sum > best_sum {
                    best = *s;
                    best_sum = sum;
                }
            }
            best
        })
        .collect()
}

/// Sort by reciprocal length, then max component, component sum, l, k and h
pub fn sort_reflections(list: &mut [Hkl], lattice: &Lattice) {
    let key = |h: &Hkl| {
        let g = (lattice.g_length(h) * 1e8).round() as i64;
        let max = h.iter().copied().max().unwrap_or(0);
        let sum: i32 = h.iter().sum();
        (g, max, sum, h[2], h[1], h[0])
    };
    list.sort_by_key(key);
}

/// Generate the sorted, symmetry-unique, absence-free reflections with `d ≥ dmin`
///
/// `laue_operators` are the reciprocal-space Laue operators; inversion is
/// always included because of Friedel's law.
pub fn generate_reflections(
    lattice: &Lattice,
    space_group: &SpaceGroup,
    laue_operators: &[IMat3],
    dmin: f64,
) -> Result<Vec<Hkl>> {
    let [ih, ik, il] = max_indices(lattice, dmin);

    let mut candidates = Vec::new();
    for h in (-ih..=ih).rev() {
        for k in (-ik..=ik).rev() {
            for l in (0..=il).rev() {
                let hkl = [h, k, l];
                if !space_group.is_allowed(&hkl)? {
                    continue;
                }
                if hkl == [0, 0, 0] {
                    continue;
                }
                if lattice.d_spacing(&hkl) >= dmin {
                    candidates.push(hkl);
                }
            }
        }
    }

    let mut unique = choose_symmetric(&candidates, laue_operators);
    sort_reflections(&mut unique, lattice);
    Ok(unique)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cubic(number: u16, a: f64) -> (Lattice, SpaceGroup, Vec<IMat3>) {
        let lattice = Lattice::new([a, a, a, 90.0, 90.0, 90.0]).unwrap();
        let sg = SpaceGroup::new(number, 0).unwrap();
        let laue = reciprocal_operators(&lattice, sg.laue_group());
        (lattice, sg, laue)
    }

    #[test]
    fn test_max_indices() {
        let lattice = Lattice::new([0.5, 0.5, 1.0, 90.0, 90.0, 90.0]).unwrap();
        // d = a/n must drop to dmin or below
        assert_eq!(max_indices(&lattice, 0.1), [5, 5, 10]);
    }

    #[test]
    fn test_star_sizes() {
        let (_, _, laue) = cubic(225, 0.5);
        assert_eq!(hkl_star(&[1, 0, 0], &laue).len(), 6);
        assert_eq!(hkl_star(&[1, 1, 1], &laue).len(), 8);
        assert_eq!(hkl_star(&[1, 2, 3], &laue).len(), 48);
        assert_eq!(vector_star(&[0.5, 0.0, 0.0], &laue).len(), 6);
    }

    #[test]
    fn test_simple_cubic_first_reflections() {
        let (lattice, sg, laue) = cubic(221, 0.4);
        let hkls = generate_reflections(&lattice, &sg, &laue, 0.1).unwrap();
        assert_eq!(&hkls[..5], &[[1, 0, 0], [1, 1, 0], [1, 1, 1], [2, 0, 0], [2, 1, 0]]);
    }

    #[test]
    fn test_sort_is_deterministic() {
        let lattice = Lattice::new([0.4, 0.4, 0.4, 90.0, 90.0, 90.0]).unwrap();
        let mut list = vec![[0, 0, 3], [2, 2, 1], [1, 1, 1]];
        sort_reflections(&mut list, &lattice);
        assert_eq!(list, vec![[1, 1, 1], [2, 2, 1], [0, 0, 3]]);
    }
}
