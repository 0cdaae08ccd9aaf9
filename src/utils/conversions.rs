/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Unit conversion utilities

use super::constants::HC_KEV_NM;

/// Convert a photon energy in keV to a wavelength in nm
pub fn kev_to_nm(kev: f64) -> f64 {
    HC_KEV_NM / kev
}

/// Convert a wavelength in nm to a photon energy in keV
pub fn nm_to_kev(nm: f64) -> f64 {
    HC_KEV_NM / nm
}

/// Convert a length in nm to Å
pub fn nm_to_angstrom(nm: f64) -> f64 {
    nm * 10.0
}

/// Convert a length in Å to nm
pub fn angstrom_to_nm(angstrom: f64) -> f64 {
    angstrom * 0.1
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_energy_wavelength_roundtrip() {
        let kev = 8.04778;
        assert_relative_eq!(nm_to_kev(kev_to_nm(kev)), kev, epsilon = 1e-10);
    }

    #[test]
    fn test_cu_kalpha_energy() {
        // Cu Kα1 sits at about 8.048 keV
        assert_relative_eq!(nm_to_kev(0.15406), 8.0478, epsilon = 1e-3);
    }

    #[test]
    fn test_length_conversions() {
        assert_relative_eq!(nm_to_angstrom(0.5411), 5.411, epsilon = 1e-12);
        assert_relative_eq!(angstrom_to_nm(5.411), 0.5411, epsilon = 1e-12);
    }
}
