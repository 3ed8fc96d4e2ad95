//! # Portfolio
//!
//! $$
//! \sigma_p^2 = \mathbf{w}^\top \Sigma \mathbf{w}
//! $$
//!
//! Efficient-frontier sweep and risk-adjusted portfolio optimization.

pub mod constraints;
pub mod engine;
pub mod frontier;
pub mod objectives;
pub mod optimizers;
pub mod solver;
pub mod types;

pub use constraints::build_constraints;
pub use constraints::Constraint;
pub use constraints::WeightBounds;
pub use engine::PortfolioEngine;
pub use engine::PortfolioEngineConfig;
pub use frontier::converged;
pub use frontier::efficient_frontier;
pub use frontier::efficient_frontier_par;
pub use frontier::target_return_grid;
pub use objectives::negative_sharpe_ratio;
pub use objectives::negative_utility;
pub use objectives::portfolio_return;
pub use objectives::portfolio_volatility;
pub use objectives::utility;
pub use objectives::Objective;
pub use optimizers::equal_weights;
pub use optimizers::max_sharpe_portfolio;
pub use optimizers::max_utility_portfolio;
pub use optimizers::min_volatility_portfolio;
pub use optimizers::optimal_portfolio;
pub use optimizers::validate_inputs;
pub use solver::minimize;
pub use solver::SolverOptions;
pub use types::OptimizationResult;
pub use types::PortfolioResult;
