//! # Portfolio Constraints
//!
//! $$
//! \mu^\top\mathbf{w}-r^\*=0,\qquad \mathbf{1}^\top\mathbf{w}-1=0,\qquad w_i\ge 0
//! $$
//!
//! Constraint set and per-asset box bounds consumed by the solver.

use anyhow::bail;
use anyhow::Result;
use ndarray::Array1;

use super::objectives::portfolio_return;

type ConstraintFn<'a> = Box<dyn Fn(&[f64]) -> f64 + 'a>;

/// A scalar constraint on the weight vector.
pub enum Constraint<'a> {
  /// Satisfied when `f(w) == 0`.
  Equality(ConstraintFn<'a>),
  /// Satisfied when `f(w) >= 0`.
  Inequality(ConstraintFn<'a>),
}

impl<'a> Constraint<'a> {
  /// Constraint satisfied when `f(w) == 0`.
  pub fn equality(f: impl Fn(&[f64]) -> f64 + 'a) -> Self {
    Constraint::Equality(Box::new(f))
  }

  /// Constraint satisfied when `f(w) >= 0`.
  pub fn inequality(f: impl Fn(&[f64]) -> f64 + 'a) -> Self {
    Constraint::Inequality(Box::new(f))
  }

  /// Raw residual `f(w)`.
  pub fn evaluate(&self, w: &[f64]) -> f64 {
    match self {
      Constraint::Equality(f) | Constraint::Inequality(f) => f(w),
    }
  }

  /// Whether this is an equality constraint.
  pub fn is_equality(&self) -> bool {
    matches!(self, Constraint::Equality(_))
  }

  /// Amount by which `w` violates this constraint (0 when satisfied).
  pub fn violation(&self, w: &[f64]) -> f64 {
    match self {
      Constraint::Equality(f) => f(w).abs(),
      Constraint::Inequality(f) => (-f(w)).max(0.0),
    }
  }
}

impl std::fmt::Debug for Constraint<'_> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Constraint::Equality(_) => write!(f, "Equality(..)"),
      Constraint::Inequality(_) => write!(f, "Inequality(..)"),
    }
  }
}

/// Build the portfolio constraint set.
///
/// Order: target-return equality (when `target_return` is set), budget equality, then one
/// `w_i >= 0` inequality per asset unless `allow_short` is set. With `allow_short` the bounds
/// alone decide whether negative weights are reachable.
pub fn build_constraints(
  mu: &Array1<f64>,
  target_return: Option<f64>,
  allow_short: bool,
) -> Vec<Constraint<'_>> {
  let n = mu.len();
  let mut constraints = Vec::with_capacity(2 + if allow_short { 0 } else { n });

  if let Some(target) = target_return {
    constraints.push(Constraint::equality(move |w: &[f64]| {
      portfolio_return(w, mu) - target
    }));
  }

  constraints.push(Constraint::equality(|w: &[f64]| w.iter().sum::<f64>() - 1.0));

  if !allow_short {
    for i in 0..n {
      constraints.push(Constraint::inequality(move |w: &[f64]| w[i]));
    }
  }

  constraints
}

/// Per-asset weight bounds.
#[derive(Clone, Debug, PartialEq)]
pub enum WeightBounds {
  /// Same `(lower, upper)` range for every asset.
  Uniform(f64, f64),
  /// One `(lower, upper)` range per asset.
  PerAsset(Vec<(f64, f64)>),
}

impl Default for WeightBounds {
  fn default() -> Self {
    WeightBounds::Uniform(0.0, 1.0)
  }
}

impl WeightBounds {
  /// Expand into one `(lower, upper)` pair per asset.
  pub fn resolve(&self, n_assets: usize) -> Result<Vec<(f64, f64)>> {
    let bounds = match self {
      WeightBounds::Uniform(lo, hi) => vec![(*lo, *hi); n_assets],
      WeightBounds::PerAsset(bounds) => {
        if bounds.len() != n_assets {
          bail!(
            "expected {} weight bounds, got {}",
            n_assets,
            bounds.len()
          );
        }
        bounds.clone()
      }
    };

    for (i, &(lo, hi)) in bounds.iter().enumerate() {
      if lo.is_nan() || hi.is_nan() || lo > hi {
        bail!("invalid bounds for asset {i}: [{lo}, {hi}]");
      }
    }

    Ok(bounds)
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;

  use super::*;

  #[test]
  fn long_only_set_has_targets_budget_and_sign_constraints() {
    let mu = array![0.1, 0.2, 0.3];
    let constraints = build_constraints(&mu, Some(0.15), false);

    assert_eq!(constraints.len(), 5);
    assert!(constraints[0].is_equality());
    assert!(constraints[1].is_equality());
    assert!(constraints[2..].iter().all(|c| !c.is_equality()));

    let w = [0.5, 0.5, 0.0];
    assert_abs_diff_eq!(constraints[0].evaluate(&w), 0.0, epsilon = 1e-15);
    assert_abs_diff_eq!(constraints[1].evaluate(&w), 0.0, epsilon = 1e-15);
  }

  #[test]
  fn allow_short_drops_sign_constraints_only() {
    let mu = array![0.1, 0.2];
    let constraints = build_constraints(&mu, Some(0.15), true);
    assert_eq!(constraints.len(), 2);

    let without_target = build_constraints(&mu, None, true);
    assert_eq!(without_target.len(), 1);
    assert_abs_diff_eq!(without_target[0].evaluate(&[0.3, 0.3]), -0.4, epsilon = 1e-15);
  }

  #[test]
  fn violation_measures_distance_to_feasibility() {
    let mu = array![0.1, 0.2];
    let constraints = build_constraints(&mu, None, false);
    let w = [1.2, -0.2];

    assert_abs_diff_eq!(constraints[0].violation(&w), 0.0, epsilon = 1e-15);
    assert_eq!(constraints[1].violation(&w), 0.0);
    assert_abs_diff_eq!(constraints[2].violation(&w), 0.2, epsilon = 1e-15);
  }

  #[test]
  fn bounds_resolve_and_validate() {
    assert_eq!(WeightBounds::default().resolve(2).unwrap(), vec![(0.0, 1.0); 2]);
    assert!(WeightBounds::PerAsset(vec![(0.0, 1.0)]).resolve(2).is_err());
    assert!(WeightBounds::Uniform(0.5, 0.1).resolve(3).is_err());
    assert!(WeightBounds::Uniform(f64::NEG_INFINITY, f64::INFINITY)
      .resolve(3)
      .is_ok());
  }
}
