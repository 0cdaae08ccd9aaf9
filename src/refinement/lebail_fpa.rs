/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! LeBail fitting with fundamental-parameters peak shapes
//!
//! Reflections are placed at the dominant wavelength of the flux only; the
//! spread of the emission spectrum is part of each line profile.

use super::errors::Result;
use super::lebail::LeBail;
use crate::config::RefinementConfig;
use crate::parameters::ParameterSet;
use crate::phases::{LeBailPhases, Wavelength};
use crate::profile::{Flux, FpaShape, PeakShape};
use crate::spectrum::{AnchorPointProvider, Spectrum};
use log::info;

/// LeBail model whose profiles come from the convolution engine
pub type LeBailFpa = LeBail<FpaShape>;

impl LeBail<FpaShape> {
    pub fn new_fpa(
        experimental: Spectrum,
        phases: LeBailPhases,
        params: ParameterSet,
        flux: Flux,
        provider: &dyn AnchorPointProvider,
        config: &RefinementConfig,
    ) -> Result<Self> {
        let mut shape = FpaShape::new(flux, config.fpa.clone());
        shape.load_parameters(&params);
        let dominant = Wavelength::new("dominant", shape.dominant_wavelength_nm(), 1.0);
        info!(
            "FPA profiles from {} emission lines, reflections at {:.6} nm",
            shape.flux().len(),
            dominant.value_nm
        );
        Self::with_shape(
            experimental,
            phases,
            params,
            shape,
            vec![dominant],
            provider,
            config,
            config.fpa_solver(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crystal::Material;
    use crate::refinement::Refinement;
    use crate::spectrum::FixedAnchors;
    use crate::utils::linspace;

    #[test]
    fn test_fpa_model_uses_dominant_wavelength() {
        let x = linspace(20.0, 40.0, 801);
        let y = vec![5.0; x.len()];
        let expt = Spectrum::new(x, y).unwrap();
        let anchors = FixedAnchors::new(vec![(20.0, 5.0), (40.0, 5.0)]);

        let mut config = RefinementConfig::default();
        config.fpa.output_points_synthesis = 200;
        config.fpa.output_points_extraction = 200;
        config.fpa.dominant_wavelength = 0.15406e-9;

        let mut phases = LeBailPhases::new(Wavelength::defaults(), 0.1).unwrap();
        phases.insert(
            "CeO2",
            Material::new("CeO2", 225, 0, [0.5411, 0.5411, 0.5411, 90.0, 90.0, 90.0], 0.1).unwrap(),
        );
        let flux = Flux::from_energies(&[8.04, 8.05, 8.06], &[0.5, 1.0, 0.5]).unwrap();

        let model =
            LeBail::new_fpa(expt, phases, ParameterSet::fpa_defaults(), flux, &anchors, &config)
                .unwrap();
        assert_eq!(model.wavelengths().len(), 1);
        assert_eq!(model.solver_options().max_nfev, 100);
        // 111 and 200 of CeO2 at Cu Kα
        assert_eq!(model.reflection_count(), 2);
        let peak = model
            .simulated()
            .y()
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        assert!(peak > 5.0);
    }
}
