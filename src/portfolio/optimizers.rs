//! # Portfolio Optimizers
//!
//! $$
//! \mathbf{w}^\*=\arg\max_{\mathbf{w}} \frac{\mathbb E[R_p]-r_f}{\sigma_p}
//! \quad\text{or}\quad
//! \arg\max_{\mathbf{w}}\ \mathbb E[R_p]-\tfrac12\lambda\sigma_p
//! $$
//!
//! Solver wrappers for single optimal portfolios. Every solve starts from equal weights.

use anyhow::bail;
use anyhow::Result;
use ndarray::Array1;
use ndarray::Array2;
use tracing::debug;

use super::constraints::build_constraints;
use super::constraints::Constraint;
use super::objectives::negative_sharpe_ratio;
use super::objectives::negative_utility;
use super::objectives::portfolio_volatility;
use super::solver::minimize;
use super::solver::SolverOptions;
use super::types::OptimizationResult;

/// Check that `mu` and `cov` describe the same non-empty asset universe.
pub fn validate_inputs(mu: &Array1<f64>, cov: &Array2<f64>) -> Result<()> {
  let n = mu.len();
  if n == 0 {
    bail!("expected returns are empty");
  }

  let (rows, cols) = cov.dim();
  if rows != cols {
    bail!("covariance matrix must be square, got {rows}x{cols}");
  }
  if rows != n {
    bail!("covariance matrix is {rows}x{cols} but there are {n} expected returns");
  }

  Ok(())
}

/// `1/n` for each of `n` assets.
pub fn equal_weights(n: usize) -> Vec<f64> {
  vec![1.0 / n as f64; n]
}

/// Minimize `objective` under `constraints` and `bounds` from the equal-weight portfolio.
///
/// The number of assets is taken from `bounds`.
pub fn optimal_portfolio<F>(
  objective: F,
  constraints: &[Constraint<'_>],
  bounds: &[(f64, f64)],
  options: &SolverOptions,
) -> OptimizationResult
where
  F: Fn(&[f64]) -> f64,
{
  let x0 = equal_weights(bounds.len());
  let result = minimize(objective, constraints, bounds, x0, options);
  debug!(
    success = result.success,
    iterations = result.iterations,
    objective = result.objective,
    "optimal portfolio solve finished"
  );
  result
}

fn check_bounds(n: usize, bounds: &[(f64, f64)]) -> Result<()> {
  if bounds.len() != n {
    bail!("expected {n} weight bounds, got {}", bounds.len());
  }
  Ok(())
}

/// Maximum-Sharpe portfolio: minimizes the negated Sharpe ratio subject to the budget
/// constraint (and non-negativity unless `allow_short`).
pub fn max_sharpe_portfolio(
  mu: &Array1<f64>,
  cov: &Array2<f64>,
  risk_free: f64,
  bounds: &[(f64, f64)],
  allow_short: bool,
  options: &SolverOptions,
) -> Result<OptimizationResult> {
  validate_inputs(mu, cov)?;
  check_bounds(mu.len(), bounds)?;

  let constraints = build_constraints(mu, None, allow_short);
  Ok(optimal_portfolio(
    |w: &[f64]| negative_sharpe_ratio(w, mu, cov, risk_free),
    &constraints,
    bounds,
    options,
  ))
}

/// Maximum-utility portfolio for the given risk aversion.
pub fn max_utility_portfolio(
  mu: &Array1<f64>,
  cov: &Array2<f64>,
  risk_aversion: f64,
  bounds: &[(f64, f64)],
  allow_short: bool,
  options: &SolverOptions,
) -> Result<OptimizationResult> {
  validate_inputs(mu, cov)?;
  check_bounds(mu.len(), bounds)?;

  let constraints = build_constraints(mu, None, allow_short);
  Ok(optimal_portfolio(
    |w: &[f64]| negative_utility(w, mu, cov, risk_aversion),
    &constraints,
    bounds,
    options,
  ))
}

/// Global minimum-volatility portfolio (no return target).
pub fn min_volatility_portfolio(
  mu: &Array1<f64>,
  cov: &Array2<f64>,
  bounds: &[(f64, f64)],
  allow_short: bool,
  options: &SolverOptions,
) -> Result<OptimizationResult> {
  validate_inputs(mu, cov)?;
  check_bounds(mu.len(), bounds)?;

  let constraints = build_constraints(mu, None, allow_short);
  Ok(optimal_portfolio(
    |w: &[f64]| portfolio_volatility(w, cov),
    &constraints,
    bounds,
    options,
  ))
}
