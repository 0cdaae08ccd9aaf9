/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Space-group generation from Hall symbols
//!
//! A Hall symbol lists a lattice symbol and up to four generator matrices.
//! Translations are kept in twelfths of a lattice vector so that every
//! operator is exact integer data and group closure needs no tolerance.

use super::errors::{CrystalError, Result};
use std::collections::VecDeque;

/// Integer 3×3 matrix acting on fractional coordinates
pub type IMat3 = [[i32; 3]; 3];

pub const IDENTITY: IMat3 = [[1, 0, 0], [0, 1, 0], [0, 0, 1]];

/// A Seitz operator `(R, t)` with the translation in twelfths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymOp {
    pub rotation: IMat3,
    pub translation: [i32; 3],
}

impl SymOp {
    pub fn new(rotation: IMat3, translation: [i32; 3]) -> Self {
        Self {
            rotation,
            translation: [
                translation[0].rem_euclid(12),
                translation[1].rem_euclid(12),
                translation[2].rem_euclid(12),
            ],
        }
    }

    pub fn identity() -> Self {
        Self::new(IDENTITY, [0; 3])
    }

    /// `self ∘ other`, i.e. apply `other` first
    pub fn compose(&self, other: &SymOp) -> SymOp {
        let rotation = mat_mul(&self.rotation, &other.rotation);
        let rt = mat_vec(&self.rotation, &other.translation);
        SymOp::new(
            rotation,
            [
                rt[0] + self.translation[0],
                rt[1] + self.translation[1],
                rt[2] + self.translation[2],
            ],
        )
    }

    /// Translation as a fraction of the lattice vectors
    pub fn translation_fraction(&self) -> [f64; 3] {
        [
            self.translation[0] as f64 / 12.0,
            self.translation[1] as f64 / 12.0,
            self.translation[2] as f64 / 12.0,
        ]
    }

    /// Apply the operator to a fractional position
    pub fn apply(&self, r: &[f64; 3]) -> [f64; 3] {
        let t = self.translation_fraction();
        let mut out = [0.0; 3];
        for (i, o) in out.iter_mut().enumerate() {
            *o = t[i]
                + self.rotation[i][0] as f64 * r[0]
                + self.rotation[i][1] as f64 * r[1]
                + self.rotation[i][2] as f64 * r[2];
        }
        out
    }
}

pub fn mat_mul(a: &IMat3, b: &IMat3) -> IMat3 {
    let mut c = [[0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            c[i][j] = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    c
}

pub fn mat_vec(a: &IMat3, v: &[i32; 3]) -> [i32; 3] {
    let mut out = [0; 3];
    for (i, o) in out.iter_mut().enumerate() {
        *o = a[i][0] * v[0] + a[i][1] * v[1] + a[i][2] * v[2];
    }
    out
}

pub fn mat_neg(a: &IMat3) -> IMat3 {
    let mut c = *a;
    for row in c.iter_mut() {
        for v in row.iter_mut() {
            *v = -*v;
        }
    }
    c
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
    Z,
    /// a - b, relative to c
    Prime,
    /// a + b, relative to c
    DoublePrime,
    /// body diagonal
    Star,
}

fn rotation_matrix(order: u32, axis: Axis) -> Option<IMat3> {
    use Axis::*;
    let m = match (order, axis) {
        (1, _) => IDENTITY,
        (2, Z) => [[-1, 0, 0], [0, -1, 0], [0, 0, 1]],
        (3, Z) => [[0, -1, 0], [1, -1, 0], [0, 0, 1]],
        (4, Z) => [[0, -1, 0], [1, 0, 0], [0, 0, 1]],
        (6, Z) => [[1, -1, 0], [1, 0, 0], [0, 0, 1]],
        (2, X) => [[1, 0, 0], [0, -1, 0], [0, 0, -1]],
        (3, X) => [[1, 0, 0], [0, 0, -1], [0, 1, -1]],
        (4, X) => [[1, 0, 0], [0, 0, -1], [0, 1, 0]],
        (6, X) => [[1, 0, 0], [0, 1, -1], [0, 1, 0]],
        (2, Y) => [[-1, 0, 0], [0, 1, 0], [0, 0, -1]],
        (3, Y) => [[-1, 0, 1], [0, 1, 0], [-1, 0, 0]],
        (4, Y) => [[0, 0, 1], [0, 1, 0], [-1, 0, 0]],
        (6, Y) => [[0, 0, 1], [0, 1, 0], [-1, 0, 1]],
        (2, Prime) => [[0, -1, 0], [-1, 0, 0], [0, 0, -1]],
        (2, DoublePrime) => [[0, 1, 0], [1, 0, 0], [0, 0, -1]],
        (3, Star) => [[0, 0, 1], [1, 0, 0], [0, 1, 0]],
        _ => return None,
    };
    Some(m)
}

fn centering_translations(lattice: char) -> Option<Vec<[i32; 3]>> {
    let t = match lattice {
        'P' => vec![],
        'A' => vec![[0, 6, 6]],
        'B' => vec![[6, 0, 6]],
        'C' => vec![[6, 6, 0]],
        'I' => vec![[6, 6, 6]],
        'R' => vec![[8, 4, 4], [4, 8, 8]],
        'F' => vec![[0, 6, 6], [6, 0, 6], [6, 6, 0]],
        _ => return None,
    };
    Some(t)
}

fn translation_letter(c: char) -> Option<[i32; 3]> {
    let t = match c {
        'a' => [6, 0, 0],
        'b' => [0, 6, 0],
        'c' => [0, 0, 6],
        'n' => [6, 6, 6],
        'u' => [3, 0, 0],
        'v' => [0, 3, 0],
        'w' => [0, 0, 3],
        'd' => [3, 3, 3],
        _ => return None,
    };
    Some(t)
}

/// Parsed form of a Hall symbol
#[derive(Debug, Clone)]
pub struct HallSymbol {
    pub centrosymmetric_lattice: bool,
    pub lattice: char,
    generators: Vec<SymOp>,
    origin_shift: [i32; 3],
}

impl HallSymbol {
    /// Parse a Hall symbol such as `-F 4 2 3` or `P 31 2c (0 0 1)`
    pub fn parse(symbol: &str) -> Result<Self> {
        let err = |msg: &str| CrystalError::HallSymbol(format!("{}: {}", symbol, msg));

        let (body, shift) = match symbol.find('(') {
            Some(open) => {
                let close = symbol
                    .find(')')
                    .ok_or_else(|| err("unterminated origin shift"))?;
                let parts: Vec<i32> = symbol[open + 1..close]
                    .split_whitespace()
                    .map(|p| p.parse::<i32>())
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|_| err("origin shift must be integers"))?;
                if parts.len() != 3 {
                    return Err(err("origin shift needs three components"));
                }
                (&symbol[..open], [parts[0], parts[1], parts[2]])
            }
            None => (symbol, [0; 3]),
        };

        let mut tokens = body.split_whitespace();
        let lattice_token = tokens.next().ok_or_else(|| err("empty symbol"))?;
        let (centro, lattice_str) = match lattice_token.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, lattice_token),
        };
        let mut lattice_chars = lattice_str.chars();
        let lattice = lattice_chars
            .next()
            .ok_or_else(|| err("missing lattice symbol"))?;
        if lattice_chars.next().is_some() || centering_translations(lattice).is_none() {
            return Err(CrystalError::UnknownCentering(lattice));
        }

        let mut generators = Vec::new();
        let mut previous_order = 0;
        for (position, token) in tokens.enumerate() {
            let (op, order) = parse_matrix_symbol(token, position, previous_order)
                .ok_or_else(|| err(&format!("bad matrix symbol '{}'", token)))?;
            generators.push(op);
            previous_order = order;
        }

        Ok(Self {
            centrosymmetric_lattice: centro,
            lattice,
            generators,
            origin_shift: shift,
        })
    }

    /// Close the generators into the full list of operators
    ///
    /// The identity comes first; the remaining order is deterministic.
    pub fn operators(&self) -> Vec<SymOp> {
        let mut seeds: Vec<SymOp> = Vec::new();
        // Infallible: validated at parse time
        for t in centering_translations(self.lattice).unwrap_or_default() {
            seeds.push(SymOp::new(IDENTITY, t));
        }
        if self.centrosymmetric_lattice {
            seeds.push(SymOp::new(mat_neg(&IDENTITY), [0; 3]));
        }
        seeds.extend(self.generators.iter().copied());

        let v = self.origin_shift;
        let seeds: Vec<SymOp> = seeds
            .into_iter()
            .map(|op| {
                let rv = mat_vec(&op.rotation, &v);
                SymOp::new(
                    op.rotation,
                    [
                        op.translation[0] + v[0] - rv[0],
                        op.translation[1] + v[1] - rv[1],
                        op.translation[2] + v[2] - rv[2],
                    ],
                )
            })
            .collect();

        close_group(&seeds)
    }
}

/// Parse one matrix symbol, returning the operator and its rotation order
fn parse_matrix_symbol(token: &str, position: usize, previous_order: u32) -> Option<(SymOp, u32)> {
    let mut chars = token.chars().peekable();
    let improper = if chars.peek() == Some(&'-') {
        chars.next();
        true
    } else {
        false
    };

    let order = chars.next()?.to_digit(10)?;
    if !matches!(order, 1 | 2 | 3 | 4 | 6) {
        return None;
    }

    let mut screw = 0;
    if let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
        if d == 0 || d >= order {
            return None;
        }
        screw = d as i32;
        chars.next();
    }

    let axis = match chars.peek() {
        Some('x') => Some(Axis::X),
        Some('y') => Some(Axis::Y),
        Some('z') => Some(Axis::Z),
        Some('\'') => Some(Axis::Prime),
        Some('"') => Some(Axis::DoublePrime),
        Some('*') => Some(Axis::Star),
        _ => None,
    };
    if axis.is_some() {
        chars.next();
    }

    let axis = match axis {
        Some(a) => a,
        None => match (position, order) {
            (_, 1) => Axis::Z,
            (0, _) => Axis::Z,
            (1, 2) if matches!(previous_order, 2 | 4) => Axis::X,
            (1, 2) if matches!(previous_order, 3 | 6) => Axis::Prime,
            (2, 3) => Axis::Star,
            _ => return None,
        },
    };

    let mut translation = [0; 3];
    for c in chars {
        let t = translation_letter(c)?;
        for i in 0..3 {
            translation[i] += t[i];
        }
    }

    if screw != 0 {
        let shift = 12 * screw / order as i32;
        match axis {
            Axis::X => translation[0] += shift,
            Axis::Y => translation[1] += shift,
            Axis::Z => translation[2] += shift,
            _ => return None,
        }
    }

    let mut rotation = rotation_matrix(order, axis)?;
    if improper {
        rotation = mat_neg(&rotation);
    }
    Some((SymOp::new(rotation, translation), order))
}

/// Breadth-first closure of a set of generators under composition
pub fn close_group(generators: &[SymOp]) -> Vec<SymOp> {
    let mut group = vec![SymOp::identity()];
    let mut queue: VecDeque<SymOp> = VecDeque::new();
    for g in generators {
        if !group.contains(g) {
            group.push(*g);
            queue.push_back(*g);
        }
    }

    while let Some(op) = queue.pop_front() {
        let snapshot = group.clone();
        for other in snapshot.iter() {
            for candidate in [op.compose(other), other.compose(&op)] {
                if !group.contains(&candidate) {
                    group.push(candidate);
                    queue.push_back(candidate);
                }
            }
        }
    }
    group
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("P 1", 1)]
    #[case("-P 1", 2)]
    #[case("-P 2ybc", 4)]
    #[case("-P 2ac 2n", 8)]
    #[case("-I 4bd 2", 32)]
    #[case("R 3", 9)]
    #[case("-P 3* 2n", 12)]
    #[case("-P 6c 2c", 24)]
    #[case("P 31 2c (0 0 1)", 6)]
    #[case("-F 4 2 3", 192)]
    #[case("F 4d 2 3 -1d", 192)]
    #[case("-I 4bd 2c 3", 96)]
    fn test_group_orders(#[case] symbol: &str, #[case] order: usize) {
        let hall = HallSymbol::parse(symbol).unwrap();
        assert_eq!(hall.operators().len(), order, "{}", symbol);
    }

    #[test]
    fn test_screw_translation() {
        let hall = HallSymbol::parse("P 61").unwrap();
        let ops = hall.operators();
        assert_eq!(ops.len(), 6);
        let six = ops
            .iter()
            .find(|op| op.rotation == [[1, -1, 0], [1, 0, 0], [0, 0, 1]])
            .unwrap();
        assert_eq!(six.translation, [0, 0, 2]);
    }

    #[test]
    fn test_origin_shift_moves_twofold() {
        // P3112: -y,-x,-z+2/3
        let ops = HallSymbol::parse("P 31 2c (0 0 1)").unwrap().operators();
        assert!(ops.contains(&SymOp::new(
            [[0, -1, 0], [-1, 0, 0], [0, 0, -1]],
            [0, 0, 8]
        )));
    }

    #[test]
    fn test_rejects_bad_symbols() {
        assert!(matches!(
            HallSymbol::parse("Q 2"),
            Err(CrystalError::UnknownCentering('Q'))
        ));
        assert!(HallSymbol::parse("P 5").is_err());
        assert!(HallSymbol::parse("P 2 2 2 (0 0)").is_err());
        assert!(HallSymbol::parse("").is_err());
    }

    #[test]
    fn test_apply_operator() {
        let op = SymOp::new([[0, -1, 0], [1, 0, 0], [0, 0, 1]], [6, 0, 3]);
        let r = op.apply(&[0.1, 0.2, 0.3]);
        assert!((r[0] - 0.3).abs() < 1e-12);
        assert!((r[1] - 0.1).abs() < 1e-12);
        assert!((r[2] - 0.55).abs() < 1e-12);
    }
}
