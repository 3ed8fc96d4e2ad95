//! # Return Moments
//!
//! $$
//! m_P=p_0\odot e^{m_{\log}+\frac12\operatorname{diag}S_{\log}},\qquad
//! S_P=(m_P m_P^\top)\odot\big(e^{S_{\log}}-1\big)
//! $$
//!
//! Annualized log-return statistics and their lognormal conversion to simple-return mean and
//! covariance.

use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;
use ndarray::Axis;
use ndarray_stats::CorrelationExt;
use tracing::debug;

use super::calendar::PriceFrame;

/// Weekly statistics are scaled by this to annualize them.
pub const WEEKS_PER_YEAR: f64 = 52.0;

/// Annualized expected returns and covariances, in log and simple space.
#[derive(Clone, Debug, PartialEq)]
pub struct ReturnMoments {
  /// Annualized mean of weekly log returns.
  pub m_log: Array1<f64>,
  /// Annualized covariance of weekly log returns.
  pub s_log: Array2<f64>,
  /// Annualized simple expected returns.
  pub m: Array1<f64>,
  /// Annualized simple-return covariance.
  pub s: Array2<f64>,
}

/// `ln p_t - ln p_{t-1}` per asset. The first row is dropped and `NaN` becomes 0.
pub fn weekly_log_returns(frame: &PriceFrame) -> Array2<f64> {
  let rows = frame.prices.nrows();
  if rows < 2 {
    return Array2::zeros((0, frame.prices.ncols()));
  }

  let logs = frame.prices.mapv(f64::ln);
  let diff = &logs.slice(ndarray::s![1.., ..]) - &logs.slice(ndarray::s![..rows - 1, ..]);
  diff.mapv(|r| if r.is_nan() { 0.0 } else { r })
}

fn outer(a: ArrayView1<f64>, b: ArrayView1<f64>) -> Array2<f64> {
  &a.insert_axis(Axis(1)) * &b.insert_axis(Axis(0))
}

/// Convert lognormal moments of `ln(P_T / p0)` into simple-return mean and covariance.
pub fn lognormal_to_simple(
  m_log: &Array1<f64>,
  s_log: &Array2<f64>,
  p0: &Array1<f64>,
) -> (Array1<f64>, Array2<f64>) {
  let m_p = p0 * &(m_log + &(0.5 * &s_log.diag())).mapv(f64::exp);
  let s_p = outer(m_p.view(), m_p.view()) * s_log.mapv(|v| v.exp() - 1.0);

  let m = &m_p / p0 - 1.0;
  let s = s_p / outer(p0.view(), p0.view());
  (m, s)
}

/// Annualized moments from weekly closes; the first weekly row is the initial price `p0`.
pub fn estimate_moments(weekly: &PriceFrame) -> Result<ReturnMoments> {
  let returns = weekly_log_returns(weekly);
  if returns.nrows() < 2 {
    bail!(
      "need at least two weekly returns to estimate a covariance, got {}",
      returns.nrows()
    );
  }

  let m_weekly = returns
    .mean_axis(Axis(0))
    .context("no weekly returns to average")?;
  let s_weekly = returns.t().cov(1.0)?;

  let m_log = m_weekly * WEEKS_PER_YEAR;
  let s_log = s_weekly * WEEKS_PER_YEAR;

  let p0 = weekly.prices.row(0).to_owned();
  let (m, s) = lognormal_to_simple(&m_log, &s_log, &p0);
  debug!(assets = m.len(), weeks = returns.nrows(), "estimated return moments");

  Ok(ReturnMoments { m_log, s_log, m, s })
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use chrono::NaiveDate;
  use ndarray::array;

  use super::*;

  fn weekly_frame(prices: Array2<f64>) -> PriceFrame {
    let start = NaiveDate::from_ymd_opt(2021, 1, 3).unwrap();
    PriceFrame {
      dates: (0..prices.nrows())
        .map(|i| start + chrono::Days::new(7 * i as u64))
        .collect(),
      names: (0..prices.ncols()).map(|i| format!("A{i}")).collect(),
      prices,
    }
  }

  #[test]
  fn log_returns_drop_first_row_and_zero_nan() {
    let frame = weekly_frame(array![[100.0, 10.0], [110.0, -1.0], [99.0, 12.0]]);
    let r = weekly_log_returns(&frame);

    assert_eq!(r.dim(), (2, 2));
    assert_abs_diff_eq!(r[[0, 0]], (110.0_f64 / 100.0).ln(), epsilon = 1e-14);
    assert_abs_diff_eq!(r[[1, 0]], (99.0_f64 / 110.0).ln(), epsilon = 1e-14);
    assert_eq!(r[[0, 1]], 0.0);
    assert_eq!(r[[1, 1]], 0.0);
  }

  #[test]
  fn annualizes_weekly_mean_and_covariance() {
    let p = |x: f64| 100.0 * x.exp();
    let frame = weekly_frame(array![[p(0.0)], [p(0.01)], [p(0.03)], [p(0.02)]]);
    let moments = estimate_moments(&frame).unwrap();

    // Weekly log returns 0.01, 0.02, -0.01.
    let mean = (0.01 + 0.02 - 0.01) / 3.0;
    let var = [0.01, 0.02, -0.01]
      .iter()
      .map(|r: &f64| (r - mean).powi(2))
      .sum::<f64>()
      / 2.0;

    assert_abs_diff_eq!(moments.m_log[0], 52.0 * mean, epsilon = 1e-12);
    assert_abs_diff_eq!(moments.s_log[[0, 0]], 52.0 * var, epsilon = 1e-12);
    assert_abs_diff_eq!(
      moments.m[0],
      (52.0 * mean + 0.5 * 52.0 * var).exp() - 1.0,
      epsilon = 1e-12
    );
  }

  #[test]
  fn lognormal_conversion_matches_closed_form_and_ignores_price_level() {
    let m_log = array![0.05, 0.10];
    let s_log = array![[0.04, 0.01], [0.01, 0.09]];

    let (m, s) = lognormal_to_simple(&m_log, &s_log, &array![1.0, 1.0]);
    let (m_scaled, s_scaled) = lognormal_to_simple(&m_log, &s_log, &array![250.0, 3.5]);

    for i in 0..2 {
      let expected = (m_log[i] + 0.5 * s_log[[i, i]]).exp() - 1.0;
      assert_abs_diff_eq!(m[i], expected, epsilon = 1e-14);
      assert_abs_diff_eq!(m_scaled[i], m[i], epsilon = 1e-12);
      for j in 0..2 {
        let expected = (1.0 + m[i]) * (1.0 + m[j]) * (s_log[[i, j]].exp() - 1.0);
        assert_abs_diff_eq!(s[[i, j]], expected, epsilon = 1e-14);
        assert_abs_diff_eq!(s_scaled[[i, j]], s[[i, j]], epsilon = 1e-12);
      }
    }
  }

  #[test]
  fn too_few_weeks_is_an_error() {
    let frame = weekly_frame(array![[100.0], [101.0]]);
    assert!(estimate_moments(&frame).is_err());
  }
}
