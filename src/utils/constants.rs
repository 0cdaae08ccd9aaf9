/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Physical constants used in diffraction calculations

/// Planck constant in J·s
pub const PLANCK: f64 = 6.626_070_15e-34;

/// Speed of light in m/s
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Elementary charge in C
pub const ELEMENTARY_CHARGE: f64 = 1.602_176_634e-19;

/// h·c/e in keV·nm, i.e. λ[nm] = HC_KEV_NM / E[keV]
pub const HC_KEV_NM: f64 = PLANCK * SPEED_OF_LIGHT / ELEMENTARY_CHARGE * 1.0e6;

/// h·c/e in keV·Å as used by flux-spectrum files
pub const HC_KEV_ANGSTROM: f64 = 12.398_419_84;

/// 4 ln 2, the Gaussian FWHM shape constant
pub const GAUSS_SHAPE: f64 = 4.0 * std::f64::consts::LN_2;

/// Default minimum d-spacing in nm
pub const DEFAULT_DMIN_NM: f64 = 0.05;

/// Cu Kα1 wavelength in nm
pub const CU_KALPHA1_NM: f64 = 0.15406;

/// Cu Kα2 wavelength in nm
pub const CU_KALPHA2_NM: f64 = 0.154443;

/// Relative weight of Cu Kα2 with respect to Kα1
pub const CU_KALPHA2_WEIGHT: f64 = 0.52;
