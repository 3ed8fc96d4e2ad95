//! # Portfolio Types
//!
//! $$
//! \mathbf{w}^\*=\arg\min_{\mathbf{w}} f(\mathbf{w})
//! $$
//!
//! Result containers for portfolio optimization.

use ndarray::Array1;
use ndarray::Array2;

use super::objectives::portfolio_return;
use super::objectives::portfolio_volatility;

/// Outcome of a single constrained solve.
///
/// Non-converged solves are returned too; check [`OptimizationResult::success`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OptimizationResult {
  /// Optimized weights, clipped onto the bounds.
  pub weights: Vec<f64>,
  /// Objective value at `weights`.
  pub objective: f64,
  /// Whether the solver met its convergence criteria.
  pub success: bool,
  /// Termination message.
  pub message: String,
  /// Total inner (L-BFGS) iterations.
  pub iterations: u64,
  /// Largest constraint or bound violation at `weights`.
  pub max_violation: f64,
}

impl OptimizationResult {
  /// Summarize the portfolio in return/risk terms.
  ///
  /// A zero-volatility portfolio has no defined Sharpe ratio; `sharpe` is then `NaN`.
  pub fn summarize(&self, mu: &Array1<f64>, cov: &Array2<f64>, risk_free: f64) -> PortfolioResult {
    let expected_return = portfolio_return(&self.weights, mu);
    let volatility = portfolio_volatility(&self.weights, cov);
    let sharpe = if volatility == 0.0 {
      f64::NAN
    } else {
      (expected_return - risk_free) / volatility
    };

    PortfolioResult {
      weights: self.weights.clone(),
      expected_return,
      volatility,
      sharpe,
    }
  }
}

/// Return/risk view of an optimized portfolio.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PortfolioResult {
  /// Final portfolio weights.
  pub weights: Vec<f64>,
  /// Model expected portfolio return (annualized if inputs are annualized).
  pub expected_return: f64,
  /// Model portfolio volatility.
  pub volatility: f64,
  /// Sharpe ratio computed as `(expected_return - risk_free) / volatility`; `NaN` at zero volatility.
  pub sharpe: f64,
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;

  use super::*;

  #[test]
  fn summarize_reports_return_risk_and_sharpe() {
    let result = OptimizationResult {
      weights: vec![0.5, 0.5],
      success: true,
      ..Default::default()
    };
    let mu = array![0.10, 0.20];
    let cov = array![[0.0064, 0.0], [0.0, 0.0225]];

    let summary = result.summarize(&mu, &cov, 0.02);
    let vol = (0.25 * 0.0064 + 0.25 * 0.0225_f64).sqrt();
    assert_abs_diff_eq!(summary.expected_return, 0.15, epsilon = 1e-15);
    assert_abs_diff_eq!(summary.volatility, vol, epsilon = 1e-15);
    assert_abs_diff_eq!(summary.sharpe, 0.13 / vol, epsilon = 1e-12);
  }

  #[test]
  fn zero_volatility_summary_has_nan_sharpe() {
    let result = OptimizationResult {
      weights: vec![1.0],
      ..Default::default()
    };
    let summary = result.summarize(&array![0.05], &array![[0.0]], 0.0);
    assert!(summary.sharpe.is_nan());
    assert_eq!(summary.volatility, 0.0);
  }
}
