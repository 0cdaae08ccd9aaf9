/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Bounded nonlinear least squares
//!
//! Models expose their weighted residuals through [`ResidualProblem`]; any
//! [`LeastSquaresSolver`] can then drive them. The built-in solver is a
//! Levenberg-Marquardt iteration with a forward-difference Jacobian whose
//! trial points are projected onto the parameter bounds.

#![allow(clippy::needless_range_loop)]
use super::errors::{RefinementError, Result};
pub use crate::config::SolverOptions;
use faer::Mat;
use log::debug;

/// A vector-valued residual function of the free parameters
pub trait ResidualProblem {
    /// Length of the residual vector
    fn residual_count(&self) -> usize;

    /// Residuals at the trial point `x`
    fn residuals(&mut self, x: &[f64]) -> Result<Vec<f64>>;
}

/// Result of a minimisation
#[derive(Debug, Clone, PartialEq)]
pub struct SolverReport {
    /// Best point found
    pub x: Vec<f64>,
    /// `½ Σ r²` at `x`
    pub cost: f64,
    /// Residual evaluations, excluding those spent on the Jacobian
    pub nfev: usize,
    /// Jacobian evaluations
    pub njev: usize,
    pub success: bool,
    pub status: String,
}

pub trait LeastSquaresSolver: Send + Sync {
    fn minimize(
        &self,
        problem: &mut dyn ResidualProblem,
        x0: &[f64],
        lower: &[f64],
        upper: &[f64],
        options: &SolverOptions,
    ) -> Result<SolverReport>;
}

/// Levenberg-Marquardt with box constraints
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundedLevenbergMarquardt {
    /// Initial damping factor
    pub initial_lambda: f64,
    /// Factor by which the damping grows after a rejected step
    pub lambda_up: f64,
    /// Factor by which the damping shrinks after an accepted step
    pub lambda_down: f64,
}

impl Default for BoundedLevenbergMarquardt {
    fn default() -> Self {
        Self {
            initial_lambda: 1e-3,
            lambda_up: 10.0,
            lambda_down: 10.0,
        }
    }
}

const MAX_LAMBDA: f64 = 1e16;

fn cost(r: &[f64]) -> f64 {
    0.5 * r.iter().map(|v| v * v).sum::<f64>()
}

fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

fn project(x: &mut [f64], lower: &[f64], upper: &[f64]) {
    for ((v, &lo), &hi) in x.iter_mut().zip(lower).zip(upper) {
        *v = v.max(lo).min(hi);
    }
}

/// Solve `A x = b` for symmetric positive definite `A` by Cholesky
///
/// Returns `None` if `A` is not positive definite.
fn cholesky_solve(a: &Mat<f64>, b: &[f64]) -> Option<Vec<f64>> {
    let n = a.nrows();
    let mut l = Mat::<f64>::zeros(n, n);
    for j in 0..n {
        let mut d = a[(j, j)];
        for k in 0..j {
            d -= l[(j, k)] * l[(j, k)];
        }
        if d <= 0.0 || !d.is_finite() {
            return None;
        }
        let djj = d.sqrt();
        l[(j, j)] = djj;
        for i in j + 1..n {
            let mut s = a[(i, j)];
            for k in 0..j {
                s -= l[(i, k)] * l[(j, k)];
            }
            l[(i, j)] = s / djj;
        }
    }

    // L y = b
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut s = b[i];
        for k in 0..i {
            s -= l[(i, k)] * y[k];
        }
        y[i] = s / l[(i, i)];
    }
    // Lᵀ x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut s = y[i];
        for k in i + 1..n {
            s -= l[(k, i)] * x[k];
        }
        x[i] = s / l[(i, i)];
    }
    Some(x)
}

impl BoundedLevenbergMarquardt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward-difference Jacobian, stepping backwards at an upper bound
    fn jacobian(
        &self,
        problem: &mut dyn ResidualProblem,
        x: &[f64],
        r: &[f64],
        lower: &[f64],
        upper: &[f64],
    ) -> Result<Mat<f64>> {
        let m = r.len();
        let n = x.len();
        let rel_step = f64::EPSILON.sqrt();
        let mut jac = Mat::<f64>::zeros(m, n);
        let mut trial = x.to_vec();

        for j in 0..n {
            let mut h = if x[j] != 0.0 {
                rel_step * x[j].abs()
            } else {
                rel_step
            };
            if x[j] + h > upper[j] && x[j] - h >= lower[j] {
                h = -h;
            }
            trial[j] = x[j] + h;
            let rj = problem.residuals(&trial)?;
            if rj.len() != m {
                return Err(RefinementError::DimensionMismatch(format!(
                    "residual length changed from {} to {}",
                    m,
                    rj.len()
                )));
            }
            for i in 0..m {
                jac[(i, j)] = (rj[i] - r[i]) / h;
            }
            trial[j] = x[j];
        }
        Ok(jac)
    }
}

impl LeastSquaresSolver for BoundedLevenbergMarquardt {
    fn minimize(
        &self,
        problem: &mut dyn ResidualProblem,
        x0: &[f64],
        lower: &[f64],
        upper: &[f64],
        options: &SolverOptions,
    ) -> Result<SolverReport> {
        let n = x0.len();
        if lower.len() != n || upper.len() != n {
            return Err(RefinementError::DimensionMismatch(format!(
                "{} parameters but {} lower and {} upper bounds",
                n,
                lower.len(),
                upper.len()
            )));
        }
        if let Some(i) = (0..n).find(|&i| lower[i] > upper[i]) {
            return Err(RefinementError::Solver(format!(
                "empty bounds for parameter {}: [{}, {}]",
                i, lower[i], upper[i]
            )));
        }

        let mut x = x0.to_vec();
        project(&mut x, lower, upper);
        let mut r = problem.residuals(&x)?;
        let m = r.len();
        let mut f = cost(&r);
        let mut nfev = 1;
        let mut njev = 0;

        if n == 0 {
            return Ok(SolverReport {
                x,
                cost: f,
                nfev,
                njev,
                success: true,
                status: "no free parameters".to_string(),
            });
        }
        if m < n {
            return Err(RefinementError::DimensionMismatch(format!(
                "{} residuals for {} parameters",
                m, n
            )));
        }

        let mut lambda = self.initial_lambda;
        let mut status = String::from("maximum number of function evaluations exceeded");
        let mut success = false;

        'outer: while nfev < options.max_nfev {
            let jac = self.jacobian(problem, &x, &r, lower, upper)?;
            njev += 1;

            // Normal equations JᵀJ δ = -Jᵀr
            let mut jtj = Mat::<f64>::zeros(n, n);
            let mut grad = vec![0.0; n];
            for a in 0..n {
                for i in 0..m {
                    grad[a] += jac[(i, a)] * r[i];
                }
                for b in a..n {
                    let mut s = 0.0;
                    for i in 0..m {
                        s += jac[(i, a)] * jac[(i, b)];
                    }
                    jtj[(a, b)] = s;
                    jtj[(b, a)] = s;
                }
            }

            // Only gradient components that can move the point inside the box count
            let gmax = (0..n)
                .filter(|&a| {
                    !((x[a] <= lower[a] && grad[a] > 0.0) || (x[a] >= upper[a] && grad[a] < 0.0))
                })
                .map(|a| grad[a].abs())
                .fold(0.0, f64::max);
            if gmax < options.gtol {
                status = "gradient below gtol".to_string();
                success = true;
                break;
            }

            loop {
                let mut damped = jtj.clone();
                for a in 0..n {
                    damped[(a, a)] += lambda * jtj[(a, a)].max(1e-12);
                }
                let neg_grad: Vec<f64> = grad.iter().map(|g| -g).collect();
                let Some(step) = cholesky_solve(&damped, &neg_grad) else {
                    lambda *= self.lambda_up;
                    if lambda > MAX_LAMBDA {
                        status = "normal equations are singular".to_string();
                        break 'outer;
                    }
                    continue;
                };

                let mut trial: Vec<f64> = x.iter().zip(&step).map(|(a, b)| a + b).collect();
                project(&mut trial, lower, upper);
                let dx: Vec<f64> = trial.iter().zip(&x).map(|(a, b)| a - b).collect();
                if norm(&dx) <= options.xtol * (options.xtol + norm(&x)) {
                    status = "step size below xtol".to_string();
                    success = true;
                    break 'outer;
                }

                let r_trial = problem.residuals(&trial)?;
                nfev += 1;
                let f_trial = cost(&r_trial);
                debug!(
                    "LM evaluation {}: cost {:.6e} -> {:.6e}, lambda {:.1e}",
                    nfev, f, f_trial, lambda
                );

                if f_trial.is_finite() && f_trial < f {
                    let reduction = f - f_trial;
                    x = trial;
                    r = r_trial;
                    f = f_trial;
                    lambda = (lambda / self.lambda_down).max(1e-12);
                    if reduction < options.ftol * f {
                        status = "cost reduction below ftol".to_string();
                        success = true;
                        break 'outer;
                    }
                    break;
                }

                lambda *= self.lambda_up;
                if lambda > MAX_LAMBDA {
                    status = "no improving step found".to_string();
                    break 'outer;
                }
                if nfev >= options.max_nfev {
                    break 'outer;
                }
            }
        }

        Ok(SolverReport {
            x,
            cost: f,
            nfev,
            njev,
            success,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Fit `y = a·exp(-b·t)` to noiseless data
    struct Decay {
        t: Vec<f64>,
        y: Vec<f64>,
    }

    impl Decay {
        fn new(a: f64, b: f64) -> Self {
            let t: Vec<f64> = (0..40).map(|i| i as f64 * 0.1).collect();
            let y = t.iter().map(|t| a * (-b * t).exp()).collect();
            Self { t, y }
        }
    }

    impl ResidualProblem for Decay {
        fn residual_count(&self) -> usize {
            self.t.len()
        }

        fn residuals(&mut self, x: &[f64]) -> Result<Vec<f64>> {
            Ok(self
                .t
                .iter()
                .zip(&self.y)
                .map(|(t, y)| x[0] * (-x[1] * t).exp() - y)
                .collect())
        }
    }

    fn options(max_nfev: usize) -> SolverOptions {
        SolverOptions {
            max_nfev,
            ftol: 1e-12,
            xtol: 1e-12,
            gtol: 1e-12,
        }
    }

    #[test]
    fn test_unbounded_fit_converges() {
        let mut problem = Decay::new(3.0, 1.5);
        let report = BoundedLevenbergMarquardt::new()
            .minimize(
                &mut problem,
                &[1.0, 0.5],
                &[f64::NEG_INFINITY; 2],
                &[f64::INFINITY; 2],
                &options(200),
            )
            .unwrap();
        assert!(report.success, "{}", report.status);
        assert_relative_eq!(report.x[0], 3.0, epsilon = 1e-5);
        assert_relative_eq!(report.x[1], 1.5, epsilon = 1e-5);
    }

    #[test]
    fn test_bounds_are_respected() {
        let mut problem = Decay::new(3.0, 1.5);
        let report = BoundedLevenbergMarquardt::new()
            .minimize(
                &mut problem,
                &[1.0, 0.5],
                &[0.0, 0.0],
                &[2.0, 10.0],
                &options(200),
            )
            .unwrap();
        assert!(report.x[0] <= 2.0);
        assert_relative_eq!(report.x[0], 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_evaluation_budget() {
        let mut problem = Decay::new(3.0, 1.5);
        let report = BoundedLevenbergMarquardt::new()
            .minimize(
                &mut problem,
                &[1.0, 0.5],
                &[f64::NEG_INFINITY; 2],
                &[f64::INFINITY; 2],
                &options(3),
            )
            .unwrap();
        assert!(report.nfev <= 3);
    }

    #[test]
    fn test_no_free_parameters() {
        let mut problem = Decay::new(3.0, 1.5);
        let report = BoundedLevenbergMarquardt::new()
            .minimize(&mut problem, &[], &[], &[], &options(10))
            .unwrap();
        assert!(report.success);
        assert_eq!(report.nfev, 1);
    }

    #[test]
    fn test_mismatched_bounds() {
        let mut problem = Decay::new(3.0, 1.5);
        let result = BoundedLevenbergMarquardt::new().minimize(
            &mut problem,
            &[1.0, 0.5],
            &[0.0],
            &[1.0, 1.0],
            &options(10),
        );
        assert!(matches!(result, Err(RefinementError::DimensionMismatch(_))));
    }

    #[test]
    fn test_cholesky() {
        let mut a = Mat::<f64>::zeros(2, 2);
        a[(0, 0)] = 4.0;
        a[(0, 1)] = 2.0;
        a[(1, 0)] = 2.0;
        a[(1, 1)] = 3.0;
        let x = cholesky_solve(&a, &[2.0, 1.0]).unwrap();
        assert_relative_eq!(x[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(x[1], 0.0, epsilon = 1e-12);
        a[(1, 1)] = -1.0;
        assert!(cholesky_solve(&a, &[1.0, 1.0]).is_none());
    }
}
