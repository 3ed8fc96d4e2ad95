//! # Portfolio Objectives
//!
//! $$
//! \mu_p=\mu^\top\mathbf{w},\qquad
//! \sigma_p=\sqrt{\mathbf{w}^\top\Sigma\mathbf{w}},\qquad
//! U=\mu_p-\tfrac12\lambda\sigma_p
//! $$
//!
//! Scalar objectives of a candidate weight vector. The solver only minimizes, so the
//! maximization targets (Sharpe ratio, utility) are exposed in negated form.

use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;

/// Expected portfolio return `sum(mu_i * w_i)`.
pub fn portfolio_return(w: &[f64], mu: &Array1<f64>) -> f64 {
  mu.dot(&ArrayView1::from(w))
}

/// Portfolio volatility `sqrt(w' Σ w)`.
///
/// A covariance that is not positive-semidefinite can produce a negative quadratic form;
/// the result is then `NaN` and is left for the caller to see.
pub fn portfolio_volatility(w: &[f64], cov: &Array2<f64>) -> f64 {
  let w = ArrayView1::from(w);
  w.dot(&cov.dot(&w)).sqrt()
}

/// Negated Sharpe ratio `-(μ_p - r_f) / σ_p`.
///
/// Returns `NaN` when the portfolio volatility is exactly zero.
pub fn negative_sharpe_ratio(w: &[f64], mu: &Array1<f64>, cov: &Array2<f64>, risk_free: f64) -> f64 {
  let volatility = portfolio_volatility(w, cov);
  if volatility == 0.0 {
    return f64::NAN;
  }

  -(portfolio_return(w, mu) - risk_free) / volatility
}

/// Mean-volatility utility `μ_p - 0.5 λ σ_p`.
///
/// The penalty is on volatility, not variance.
pub fn utility(w: &[f64], mu: &Array1<f64>, cov: &Array2<f64>, risk_aversion: f64) -> f64 {
  portfolio_return(w, mu) - 0.5 * risk_aversion * portfolio_volatility(w, cov)
}

/// Negated [`utility`].
pub fn negative_utility(w: &[f64], mu: &Array1<f64>, cov: &Array2<f64>, risk_aversion: f64) -> f64 {
  -utility(w, mu, cov, risk_aversion)
}

/// Objective selector for [`crate::portfolio::PortfolioEngine::optimize`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Objective {
  /// Minimize portfolio volatility.
  Volatility,
  /// Maximize the Sharpe ratio over the given risk-free rate.
  NegativeSharpe { risk_free: f64 },
  /// Maximize mean-volatility utility with the given risk aversion.
  NegativeUtility { risk_aversion: f64 },
}

impl Objective {
  /// Evaluate the objective at `w`.
  pub fn evaluate(&self, w: &[f64], mu: &Array1<f64>, cov: &Array2<f64>) -> f64 {
    match *self {
      Objective::Volatility => portfolio_volatility(w, cov),
      Objective::NegativeSharpe { risk_free } => negative_sharpe_ratio(w, mu, cov, risk_free),
      Objective::NegativeUtility { risk_aversion } => {
        negative_utility(w, mu, cov, risk_aversion)
      }
    }
  }
}
