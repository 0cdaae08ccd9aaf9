/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Weighted residuals and goodness-of-fit figures

use crate::utils::trapz;
use log::warn;
use serde::Serialize;

/// Counting-statistics weights `1/√y`
///
/// Non-positive observations get zero weight.
pub fn weights(observed: &[f64]) -> Vec<f64> {
    let mut skipped = 0;
    let w = observed
        .iter()
        .map(|&y| {
            if y > 0.0 {
                1.0 / y.sqrt()
            } else {
                skipped += 1;
                0.0
            }
        })
        .collect();
    if skipped > 0 {
        warn!(
            "{} of {} observations are not positive and get zero weight",
            skipped,
            observed.len()
        );
    }
    w
}

/// Per-point residuals `√w · (sim − obs)`
///
/// Their squares are `w·(sim − obs)²`, the summand of the weighted profile
/// residual.
pub fn weighted_residuals(weights: &[f64], simulated: &[f64], observed: &[f64]) -> Vec<f64> {
    weights
        .iter()
        .zip(simulated.iter().zip(observed))
        .map(|(w, (s, o))| w.sqrt() * (s - o))
        .collect()
}

/// Weighted profile residual and goodness of fit
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitMetrics {
    pub rwp: f64,
    pub rexp: f64,
    pub gof: f64,
}

impl FitMetrics {
    /// Compute `Rwp`, `Rexp` and `gof = (Rwp/Rexp)²`
    ///
    /// # Arguments
    ///
    /// * `x` - Two-theta grid
    /// * `simulated` - Model spectrum including background
    /// * `observed` - Experimental intensities
    /// * `weights` - Per-point weights
    /// * `n_params` - Number of refined parameters
    pub fn compute(
        x: &[f64],
        simulated: &[f64],
        observed: &[f64],
        weights: &[f64],
        n_params: usize,
    ) -> Self {
        let wss_y: Vec<f64> = weights
            .iter()
            .zip(simulated.iter().zip(observed))
            .map(|(w, (s, o))| w * (s - o) * (s - o))
            .collect();
        let den_y: Vec<f64> = weights
            .iter()
            .zip(simulated)
            .map(|(w, s)| w * s * s)
            .collect();
        let wss = trapz(&wss_y, x);
        let den = trapz(&den_y, x);

        if den.is_nan() || den <= 0.0 {
            warn!("Weighted simulated intensity is zero, Rwp is undefined");
            return Self {
                rwp: f64::INFINITY,
                rexp: f64::INFINITY,
                gof: f64::INFINITY,
            };
        }

        let n = simulated.len() as f64;
        let rwp = (wss / den).sqrt();
        let rexp = ((n - n_params as f64) / den).sqrt();
        let gof = if rexp > 0.0 {
            (rwp / rexp).powi(2)
        } else {
            f64::INFINITY
        };
        Self { rwp, rexp, gof }
    }
}
