//! # Portfolio Engine
//!
//! $$
//! \mathbf{w}^\* = \operatorname{Optimize}(\mu, \Sigma)
//! $$
//!
//! High-level API that carries bounds, short-selling policy, rates and solver settings.

use anyhow::Result;
use ndarray::Array1;
use ndarray::Array2;

use super::constraints::build_constraints;
use super::constraints::WeightBounds;
use super::frontier::efficient_frontier;
use super::frontier::efficient_frontier_par;
use super::objectives::Objective;
use super::optimizers::max_sharpe_portfolio;
use super::optimizers::max_utility_portfolio;
use super::optimizers::min_volatility_portfolio;
use super::optimizers::optimal_portfolio;
use super::optimizers::validate_inputs;
use super::solver::SolverOptions;
use super::types::OptimizationResult;

/// Runtime configuration for [`PortfolioEngine`].
#[derive(Clone, Debug)]
pub struct PortfolioEngineConfig {
  /// Per-asset weight bounds.
  pub bounds: WeightBounds,
  /// Skip the explicit `w_i >= 0` constraints and rely on `bounds` alone.
  pub allow_short: bool,
  /// Risk-free rate used by the Sharpe objective.
  pub risk_free: f64,
  /// Risk aversion used by the utility objective.
  pub risk_aversion: f64,
  /// Sweep frontier points on the rayon pool.
  pub parallel: bool,
  /// Solver settings.
  pub solver: SolverOptions,
}

impl Default for PortfolioEngineConfig {
  fn default() -> Self {
    Self {
      bounds: WeightBounds::default(),
      allow_short: false,
      risk_free: 0.0,
      risk_aversion: 1.0,
      parallel: false,
      solver: SolverOptions::default(),
    }
  }
}

/// Single entry point for frontier and risk-adjusted optimizations.
#[derive(Clone, Debug, Default)]
pub struct PortfolioEngine {
  config: PortfolioEngineConfig,
}

impl PortfolioEngine {
  /// Construct a new engine with explicit configuration.
  pub fn new(config: PortfolioEngineConfig) -> Self {
    Self { config }
  }

  /// Borrow engine configuration.
  pub fn config(&self) -> &PortfolioEngineConfig {
    &self.config
  }

  /// One minimum-volatility portfolio per target return, in input order.
  pub fn efficient_frontier(
    &self,
    mu: &Array1<f64>,
    cov: &Array2<f64>,
    targets: &[f64],
  ) -> Result<Vec<OptimizationResult>> {
    let bounds = self.config.bounds.resolve(mu.len())?;
    if self.config.parallel {
      efficient_frontier_par(mu, cov, targets, &bounds, self.config.allow_short, &self.config.solver)
    } else {
      efficient_frontier(mu, cov, targets, &bounds, self.config.allow_short, &self.config.solver)
    }
  }

  /// Portfolio with the highest Sharpe ratio over `config.risk_free`.
  pub fn max_sharpe(&self, mu: &Array1<f64>, cov: &Array2<f64>) -> Result<OptimizationResult> {
    let bounds = self.config.bounds.resolve(mu.len())?;
    max_sharpe_portfolio(
      mu,
      cov,
      self.config.risk_free,
      &bounds,
      self.config.allow_short,
      &self.config.solver,
    )
  }

  /// Portfolio with the highest utility for `config.risk_aversion`.
  pub fn max_utility(&self, mu: &Array1<f64>, cov: &Array2<f64>) -> Result<OptimizationResult> {
    let bounds = self.config.bounds.resolve(mu.len())?;
    max_utility_portfolio(
      mu,
      cov,
      self.config.risk_aversion,
      &bounds,
      self.config.allow_short,
      &self.config.solver,
    )
  }

  /// Global minimum-volatility portfolio.
  pub fn min_volatility(&self, mu: &Array1<f64>, cov: &Array2<f64>) -> Result<OptimizationResult> {
    let bounds = self.config.bounds.resolve(mu.len())?;
    min_volatility_portfolio(mu, cov, &bounds, self.config.allow_short, &self.config.solver)
  }

  /// Minimize an arbitrary [`Objective`], optionally pinning the portfolio return.
  pub fn optimize(
    &self,
    objective: Objective,
    mu: &Array1<f64>,
    cov: &Array2<f64>,
    target_return: Option<f64>,
  ) -> Result<OptimizationResult> {
    validate_inputs(mu, cov)?;
    let bounds = self.config.bounds.resolve(mu.len())?;
    let constraints = build_constraints(mu, target_return, self.config.allow_short);

    Ok(optimal_portfolio(
      |w: &[f64]| objective.evaluate(w, mu, cov),
      &constraints,
      &bounds,
      &self.config.solver,
    ))
  }
}
