//! # Constrained Solver
//!
//! $$
//! \Psi_\rho(\mathbf{x};\lambda,\nu)=f(\mathbf{x})+\sum_j\Big(\lambda_j h_j+\tfrac\rho2 h_j^2\Big)
//! +\frac1{2\rho}\sum_k\Big(\max(0,\nu_k-\rho g_k)^2-\nu_k^2\Big)
//! $$
//!
//! General-purpose constrained minimizer for smooth objectives: an augmented Lagrangian
//! (Powell-Hestenes-Rockafellar) outer loop around argmin's L-BFGS. Equality constraints
//! `h(x) = 0`, inequality constraints `g(x) >= 0` and box bounds are all handled; box bounds
//! enter the Lagrangian as inequalities and the final iterate is clipped onto the box.
//! Gradients are central finite differences, so callers only provide function values.

use argmin::core::CostFunction;
use argmin::core::Executor;
use argmin::core::Gradient;
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::LBFGS;
use tracing::debug;

use super::constraints::Constraint;
use super::types::OptimizationResult;

/// Tuning knobs for [`minimize`].
#[derive(Clone, Debug)]
pub struct SolverOptions {
  /// Maximum number of multiplier updates.
  pub max_outer_iters: usize,
  /// Maximum L-BFGS iterations per subproblem.
  pub max_inner_iters: u64,
  /// Largest tolerated constraint violation at a converged point.
  pub constraint_tol: f64,
  /// Looser violation bound accepted once the penalty is capped and feasibility has stopped
  /// improving. Degenerate vertices, where more constraints are active than there are free
  /// variables, settle here.
  pub stalled_constraint_tol: f64,
  /// Converged once an outer step moves no coordinate by more than this.
  pub step_tol: f64,
  /// Converged once the objective changes by less than this (relative).
  pub objective_tol: f64,
  /// L-BFGS gradient-norm tolerance.
  pub grad_tol: f64,
  /// Starting penalty `rho`.
  pub initial_penalty: f64,
  /// Penalty multiplier applied when feasibility stalls.
  pub penalty_growth: f64,
  /// Upper limit on `rho`.
  pub max_penalty: f64,
  /// L-BFGS history length.
  pub lbfgs_memory: usize,
  /// Central-difference step.
  pub fd_step: f64,
  /// Give up after this many consecutive failed subproblems.
  pub max_inner_failures: usize,
}

impl Default for SolverOptions {
  fn default() -> Self {
    Self {
      max_outer_iters: 100,
      max_inner_iters: 500,
      constraint_tol: 1e-8,
      stalled_constraint_tol: 1e-6,
      step_tol: 1e-8,
      objective_tol: 1e-12,
      grad_tol: 1e-8,
      initial_penalty: 10.0,
      penalty_growth: 10.0,
      max_penalty: 1e8,
      lbfgs_memory: 10,
      fd_step: 1e-7,
      max_inner_failures: 3,
    }
  }
}

/// Augmented Lagrangian subproblem for fixed multipliers and penalty.
struct Subproblem<'p, 'c, F> {
  objective: &'p F,
  constraints: &'p [Constraint<'c>],
  bounds: &'p [(f64, f64)],
  lambda: &'p [f64],
  nu: &'p [f64],
  rho: f64,
  fd_step: f64,
}

impl<F> Subproblem<'_, '_, F>
where
  F: Fn(&[f64]) -> f64,
{
  fn value(&self, x: &[f64]) -> Result<f64, argmin::core::Error> {
    let f = (self.objective)(x);
    if !f.is_finite() {
      return Err(argmin::core::Error::msg(
        "objective evaluated to a non-finite value",
      ));
    }

    let (eq, ineq) = residuals(self.constraints, self.bounds, x);
    let mut psi = f;
    for (h, lambda) in eq.iter().zip(self.lambda) {
      psi += lambda * h + 0.5 * self.rho * h * h;
    }
    for (g, nu) in ineq.iter().zip(self.nu) {
      let shifted = (nu - self.rho * g).max(0.0);
      psi += (shifted * shifted - nu * nu) / (2.0 * self.rho);
    }

    Ok(psi)
  }
}

impl<F> CostFunction for Subproblem<'_, '_, F>
where
  F: Fn(&[f64]) -> f64,
{
  type Param = Vec<f64>;
  type Output = f64;

  fn cost(&self, x: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
    self.value(x)
  }
}

impl<F> Gradient for Subproblem<'_, '_, F>
where
  F: Fn(&[f64]) -> f64,
{
  type Param = Vec<f64>;
  type Gradient = Vec<f64>;

  fn gradient(&self, x: &Self::Param) -> Result<Self::Gradient, argmin::core::Error> {
    let mut grad = vec![0.0; x.len()];
    let mut probe = x.clone();

    for i in 0..x.len() {
      let h = self.fd_step * x[i].abs().max(1.0);
      probe[i] = x[i] + h;
      let f_plus = self.value(&probe)?;
      probe[i] = x[i] - h;
      let f_minus = self.value(&probe)?;
      probe[i] = x[i];
      grad[i] = (f_plus - f_minus) / (2.0 * h);
    }

    Ok(grad)
  }
}

/// Equality residuals `h(x)` and inequality residuals `g(x)` (user inequalities first, then
/// finite lower bounds `x_i - lo`, then finite upper bounds `hi - x_i`).
fn residuals(constraints: &[Constraint<'_>], bounds: &[(f64, f64)], x: &[f64]) -> (Vec<f64>, Vec<f64>) {
  let mut eq = Vec::new();
  let mut ineq = Vec::new();

  for c in constraints {
    if c.is_equality() {
      eq.push(c.evaluate(x));
    } else {
      ineq.push(c.evaluate(x));
    }
  }

  for (xi, &(lo, _)) in x.iter().zip(bounds) {
    if lo.is_finite() {
      ineq.push(xi - lo);
    }
  }
  for (xi, &(_, hi)) in x.iter().zip(bounds) {
    if hi.is_finite() {
      ineq.push(hi - xi);
    }
  }

  (eq, ineq)
}

fn max_violation(eq: &[f64], ineq: &[f64]) -> f64 {
  let eq_max = eq.iter().fold(0.0_f64, |acc, h| acc.max(h.abs()));
  ineq.iter().fold(eq_max, |acc, g| acc.max(-g))
}

fn clip_to_bounds(x: &mut [f64], bounds: &[(f64, f64)]) {
  for (xi, &(lo, hi)) in x.iter_mut().zip(bounds) {
    if *xi < lo {
      *xi = lo;
    } else if *xi > hi {
      *xi = hi;
    }
  }
}

fn solve_subproblem<F>(
  problem: Subproblem<'_, '_, F>,
  x0: Vec<f64>,
  options: &SolverOptions,
) -> Result<(Vec<f64>, u64), argmin::core::Error>
where
  F: Fn(&[f64]) -> f64,
{
  let linesearch = MoreThuenteLineSearch::new().with_c(1e-4, 0.9)?;
  let solver = LBFGS::new(linesearch, options.lbfgs_memory)
    .with_tolerance_grad(options.grad_tol)?;

  let res = Executor::new(problem, solver)
    .configure(|state| state.param(x0).max_iters(options.max_inner_iters))
    .run()?;

  let iters = res.state.iter;
  match res.state.best_param {
    Some(best) => Ok((best, iters)),
    None => Err(argmin::core::Error::msg("subproblem produced no iterate")),
  }
}

/// Minimize `objective` subject to `constraints` and per-variable `bounds`, starting at `x0`.
///
/// Never panics on numeric trouble and never returns an error: a failed or non-converged solve
/// comes back with `success == false` and a message, carrying the best iterate reached.
pub fn minimize<F>(
  objective: F,
  constraints: &[Constraint<'_>],
  bounds: &[(f64, f64)],
  x0: Vec<f64>,
  options: &SolverOptions,
) -> OptimizationResult
where
  F: Fn(&[f64]) -> f64,
{
  let n_eq = constraints.iter().filter(|c| c.is_equality()).count();
  let (_, ineq0) = residuals(constraints, bounds, &x0);

  let mut lambda = vec![0.0; n_eq];
  let mut nu = vec![0.0; ineq0.len()];
  let mut rho = options.initial_penalty;
  let mut x = x0;
  let mut f_prev = objective(&x);
  let mut prev_violation = f64::INFINITY;
  let mut iterations = 0u64;
  let mut failures = 0usize;
  let mut last_error = String::new();

  let mut success = false;
  let mut message = String::from("Iteration limit reached");

  for outer in 0..options.max_outer_iters {
    let problem = Subproblem {
      objective: &objective,
      constraints,
      bounds,
      lambda: &lambda,
      nu: &nu,
      rho,
      fd_step: options.fd_step,
    };

    let x_prev = x.clone();
    match solve_subproblem(problem, x.clone(), options) {
      Ok((x_new, iters)) => {
        iterations += iters;
        failures = 0;
        x = x_new;
      }
      Err(err) => {
        failures += 1;
        last_error = err.to_string();
        debug!(outer, error = %last_error, "subproblem failed");

        if !objective(&x).is_finite() {
          message = format!("Objective is not finite at the current iterate: {last_error}");
          break;
        }
        if failures >= options.max_inner_failures {
          message = format!("Subproblem failed repeatedly: {last_error}");
          break;
        }
      }
    }

    let (eq, ineq) = residuals(constraints, bounds, &x);
    let violation = max_violation(&eq, &ineq);
    let f = objective(&x);
    let step = x
      .iter()
      .zip(&x_prev)
      .fold(0.0_f64, |acc, (a, b)| acc.max((a - b).abs()));

    for (l, h) in lambda.iter_mut().zip(&eq) {
      *l += rho * h;
    }
    for (v, g) in nu.iter_mut().zip(&ineq) {
      *v = (*v - rho * g).max(0.0);
    }

    debug!(outer, rho, violation, step, objective = f, "augmented lagrangian step");

    let objective_stalled = (f - f_prev).abs() <= options.objective_tol * f.abs().max(1.0);
    let settled = step <= options.step_tol || objective_stalled;
    let feasible = violation <= options.constraint_tol
      || (violation <= options.stalled_constraint_tol
        && rho >= options.max_penalty
        && violation > 0.25 * prev_violation);
    if failures == 0 && feasible && settled {
      success = true;
      message = String::from("Optimization terminated successfully");
      break;
    }

    if violation > 0.25 * prev_violation {
      rho = (rho * options.penalty_growth).min(options.max_penalty);
    }
    prev_violation = violation;
    f_prev = f;
  }

  if !success && failures > 0 && message == "Iteration limit reached" {
    message = format!("Iteration limit reached; last subproblem error: {last_error}");
  }

  clip_to_bounds(&mut x, bounds);
  let (eq, ineq) = residuals(constraints, bounds, &x);
  let objective_value = objective(&x);

  OptimizationResult {
    weights: x,
    objective: objective_value,
    success: success && objective_value.is_finite(),
    message,
    iterations,
    max_violation: max_violation(&eq, &ineq),
  }
}
