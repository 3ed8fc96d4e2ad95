//! # Data
//!
//! $$
//! \hat\mu_{\log}=52\,\overline{r}^{(w)},\qquad \hat\Sigma_{\log}=52\,\widehat{\operatorname{Cov}}(r^{(w)})
//! $$
//!
//! Return/risk estimation from raw daily price history: load, align calendars, resample to
//! weekly closes, take log returns, annualize and convert to simple-return moments.

pub mod calendar;
pub mod moments;
pub mod prices;
pub mod store;

pub use calendar::align_calendar;
pub use calendar::resample_weekly;
pub use calendar::CalendarSpan;
pub use calendar::PriceFrame;
pub use moments::estimate_moments;
pub use moments::lognormal_to_simple;
pub use moments::weekly_log_returns;
pub use moments::ReturnMoments;
pub use prices::load_price_csv;
pub use prices::load_price_directory;
pub use prices::PriceSeries;
pub use store::write_price_frame_csv;

use anyhow::Result;
use tracing::info;

/// Full preprocessing pipeline: daily aligned closes plus the annualized moments.
pub fn estimate_from_prices(series: &[PriceSeries], span: CalendarSpan) -> Result<(PriceFrame, ReturnMoments)> {
  let daily = align_calendar(series, span)?;
  let weekly = resample_weekly(&daily);
  info!(
    assets = daily.names.len(),
    days = daily.dates.len(),
    weeks = weekly.dates.len(),
    "resampled price history to weekly closes"
  );

  let moments = estimate_moments(&weekly)?;
  Ok((daily, moments))
}
