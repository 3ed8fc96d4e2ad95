//! # Efficient Frontier
//!
//! $$
//! \sigma^\*(r)=\min_{\mathbf{w}}\Big\{\sqrt{\mathbf{w}^\top\Sigma\mathbf{w}}\ :\
//! \mu^\top\mathbf{w}=r,\ \mathbf{1}^\top\mathbf{w}=1\Big\}
//! $$
//!
//! Sweeps a grid of target returns, solving one minimum-volatility problem per target.
//! Points are independent: each starts from equal weights and none reuses a neighbour's
//! solution.

use anyhow::bail;
use anyhow::Result;
use ndarray::Array1;
use ndarray::Array2;
use rayon::prelude::*;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::constraints::build_constraints;
use super::objectives::portfolio_volatility;
use super::optimizers::optimal_portfolio;
use super::optimizers::validate_inputs;
use super::solver::SolverOptions;
use super::types::OptimizationResult;

fn frontier_point(
  mu: &Array1<f64>,
  cov: &Array2<f64>,
  target: f64,
  bounds: &[(f64, f64)],
  allow_short: bool,
  options: &SolverOptions,
) -> OptimizationResult {
  let constraints = build_constraints(mu, Some(target), allow_short);
  let result = optimal_portfolio(
    |w: &[f64]| portfolio_volatility(w, cov),
    &constraints,
    bounds,
    options,
  );

  if result.success {
    debug!(target, volatility = result.objective, "frontier point converged");
  } else {
    warn!(target, message = %result.message, "frontier point did not converge");
  }

  result
}

fn check_sweep(mu: &Array1<f64>, cov: &Array2<f64>, bounds: &[(f64, f64)]) -> Result<()> {
  validate_inputs(mu, cov)?;
  if bounds.len() != mu.len() {
    bail!("expected {} weight bounds, got {}", mu.len(), bounds.len());
  }
  Ok(())
}

/// Minimum-volatility portfolio for every target in `targets`, in input order.
///
/// Non-converged points are kept; their `success` flag is false.
pub fn efficient_frontier(
  mu: &Array1<f64>,
  cov: &Array2<f64>,
  targets: &[f64],
  bounds: &[(f64, f64)],
  allow_short: bool,
  options: &SolverOptions,
) -> Result<Vec<OptimizationResult>> {
  check_sweep(mu, cov, bounds)?;
  info!(assets = mu.len(), points = targets.len(), "sweeping efficient frontier");

  Ok(
    targets
      .iter()
      .map(|&target| frontier_point(mu, cov, target, bounds, allow_short, options))
      .collect(),
  )
}

/// Parallel [`efficient_frontier`]; results are still in input order.
pub fn efficient_frontier_par(
  mu: &Array1<f64>,
  cov: &Array2<f64>,
  targets: &[f64],
  bounds: &[(f64, f64)],
  allow_short: bool,
  options: &SolverOptions,
) -> Result<Vec<OptimizationResult>> {
  check_sweep(mu, cov, bounds)?;
  info!(
    assets = mu.len(),
    points = targets.len(),
    threads = rayon::current_num_threads(),
    "sweeping efficient frontier in parallel"
  );

  Ok(
    targets
      .par_iter()
      .map(|&target| frontier_point(mu, cov, target, bounds, allow_short, options))
      .collect(),
  )
}

/// `n` evenly spaced targets from `lo` to `hi` inclusive.
pub fn target_return_grid(lo: f64, hi: f64, n: usize) -> Vec<f64> {
  match n {
    0 => Vec::new(),
    1 => vec![lo],
    _ => {
      let step = (hi - lo) / (n - 1) as f64;
      (0..n)
        .map(|i| if i == n - 1 { hi } else { lo + step * i as f64 })
        .collect()
    }
  }
}

/// Keep only converged frontier points.
pub fn converged(results: &[OptimizationResult]) -> Vec<&OptimizationResult> {
  results.iter().filter(|r| r.success).collect()
}
