/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Crystallography for powder diffraction
//!
//! Space groups are generated from their Hall symbols. Reflections are
//! enumerated within a resolution limit, filtered by centering and the
//! glide/screw absence tables, reduced to one representative per symmetry
//! star and sorted by d-spacing.

pub mod absences;
pub mod database;
pub mod errors;
pub mod hall;
pub mod lattice;
pub mod material;
pub mod reflections;
pub mod scattering;
pub mod space_group;
pub mod structure;
pub mod tables;

pub use absences::{Hkl, SymmetryElement};
pub use database::{AtomRecord, CrystalRecord, MaterialDatabase};
pub use errors::{CrystalError, Result};
pub use hall::{HallSymbol, SymOp};
pub use lattice::{Lattice, LatticeSystem, Space, LATTICE_PARAMETER_NAMES};
pub use material::Material;
pub use scattering::{form_factor, AnomalousRecord, AnomalousTable, ScatteringCorrection};
pub use space_group::SpaceGroup;
pub use structure::RietveldMaterial;
