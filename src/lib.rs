//! # frontier-rs
//!
//! $$
//! \min_{\mathbf{w}} \sqrt{\mathbf{w}^\top \Sigma \mathbf{w}}
//! \quad \text{s.t.} \quad \mu^\top \mathbf{w} = r^\*,\ \mathbf{1}^\top \mathbf{w} = 1
//! $$
//!
//! Mean-variance portfolio optimization. [`portfolio`] traces the efficient frontier and
//! finds max-Sharpe / max-utility portfolios; [`data`] turns raw daily price history into the
//! annualized expected returns and covariance those solvers consume.

pub mod data;
pub mod portfolio;
