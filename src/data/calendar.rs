//! # Calendar Alignment
//!
//! $$
//! P^{(w)}_k = P_{\max\{t\,:\,t\in\text{week }k\}}
//! $$
//!
//! Reindexes misaligned price histories onto one business-day calendar and resamples them to
//! weekly closes.

use std::collections::HashMap;

use anyhow::bail;
use anyhow::Result;
use chrono::Datelike;
use chrono::Days;
use chrono::NaiveDate;
use chrono::Weekday;
use ndarray::Array2;
use ndarray::Axis;
use tracing::debug;

use super::prices::PriceSeries;

/// How the common date range is chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CalendarSpan {
  /// From the latest first observation to the earliest last observation.
  #[default]
  Intersection,
  /// From the first date of the series with the fewest observations to the last date of the
  /// series with the most observations.
  ShortestHistory,
}

/// Aligned close prices: one row per date, one column per asset.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceFrame {
  /// Row labels, ascending.
  pub dates: Vec<NaiveDate>,
  /// Asset names, one per column.
  pub names: Vec<String>,
  /// Close prices, `dates.len()` x `names.len()`.
  pub prices: Array2<f64>,
}

impl PriceFrame {
  /// Number of asset columns.
  pub fn n_assets(&self) -> usize {
    self.names.len()
  }

  /// Number of dated rows.
  pub fn n_rows(&self) -> usize {
    self.dates.len()
  }
}

fn is_business_day(date: NaiveDate) -> bool {
  !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Mon-Fri dates in `[start, end]`.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
  let mut days = Vec::new();
  let mut day = start;
  while day <= end {
    if is_business_day(day) {
      days.push(day);
    }
    match day.succ_opt() {
      Some(next) => day = next,
      None => break,
    }
  }
  days
}

fn span_limits(series: &[PriceSeries], span: CalendarSpan) -> Result<(NaiveDate, NaiveDate)> {
  let mut firsts = Vec::with_capacity(series.len());
  let mut lasts = Vec::with_capacity(series.len());
  for s in series {
    match (s.first_date(), s.last_date()) {
      (Some(first), Some(last)) => {
        firsts.push(first);
        lasts.push(last);
      }
      _ => bail!("price series `{}` has no observations", s.name),
    }
  }

  let limits = match span {
    CalendarSpan::Intersection => (
      firsts.iter().copied().max(),
      lasts.iter().copied().min(),
    ),
    CalendarSpan::ShortestHistory => {
      // First series wins ties, in both directions.
      let shortest = (0..series.len()).min_by_key(|&i| series[i].len());
      let longest = (0..series.len()).rev().max_by_key(|&i| series[i].len());
      (shortest.map(|i| firsts[i]), longest.map(|i| lasts[i]))
    }
  };

  match limits {
    (Some(start), Some(end)) => Ok((start, end)),
    _ => bail!("no price series to align"),
  }
}

/// Reindex every series onto the business days of the chosen span.
///
/// Only observations that fall on a business day inside the span are used. Gaps are
/// forward-filled, then any leading gap is back-filled from the first available close.
pub fn align_calendar(series: &[PriceSeries], span: CalendarSpan) -> Result<PriceFrame> {
  if series.is_empty() {
    bail!("no price series to align");
  }

  let (start, end) = span_limits(series, span)?;
  if start > end {
    bail!("price series do not share a date range ({start} > {end})");
  }

  let dates = business_days(start, end);
  if dates.is_empty() {
    bail!("no business days between {start} and {end}");
  }

  let mut prices = Array2::<f64>::from_elem((dates.len(), series.len()), f64::NAN);
  for (col, s) in series.iter().enumerate() {
    let by_date: HashMap<NaiveDate, f64> = s.observations.iter().copied().collect();

    let mut last = None;
    for (row, date) in dates.iter().enumerate() {
      if let Some(&price) = by_date.get(date).filter(|p| !p.is_nan()) {
        last = Some(price);
      }
      if let Some(price) = last {
        prices[[row, col]] = price;
      }
    }

    let mut column = prices.column_mut(col);
    let Some(first_valid) = column.iter().copied().find(|p| !p.is_nan()) else {
      bail!("price series `{}` has no observations between {start} and {end}", s.name);
    };
    for p in column.iter_mut() {
      if p.is_nan() {
        *p = first_valid;
      } else {
        break;
      }
    }
  }

  debug!(%start, %end, rows = dates.len(), assets = series.len(), "aligned price calendar");

  Ok(PriceFrame {
    dates,
    names: series.iter().map(|s| s.name.clone()).collect(),
    prices,
  })
}

/// Sunday that closes the week containing `date`.
fn week_end(date: NaiveDate) -> NaiveDate {
  let offset = 6 - date.weekday().num_days_from_monday();
  date.checked_add_days(Days::new(offset as u64)).unwrap_or(date)
}

/// Last row of every Monday-Sunday week, labelled by the week's Sunday.
pub fn resample_weekly(frame: &PriceFrame) -> PriceFrame {
  let mut dates = Vec::new();
  let mut rows = Vec::new();

  for (row, &date) in frame.dates.iter().enumerate() {
    let label = week_end(date);
    if dates.last() == Some(&label) {
      if let Some(last) = rows.last_mut() {
        *last = row;
      }
    } else {
      dates.push(label);
      rows.push(row);
    }
  }

  PriceFrame {
    dates,
    names: frame.names.clone(),
    prices: frame.prices.select(Axis(0), &rows),
  }
}

#[cfg(test)]
mod tests {
  use ndarray::array;

  use super::*;

  fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
  }

  #[test]
  fn business_days_skip_weekends() {
    // Fri 2021-01-01 .. Tue 2021-01-05
    let days = business_days(d(2021, 1, 1), d(2021, 1, 5));
    assert_eq!(days, vec![d(2021, 1, 1), d(2021, 1, 4), d(2021, 1, 5)]);
  }

  #[test]
  fn intersection_span_forward_fills_gaps() {
    let a = PriceSeries::new(
      "A",
      vec![(d(2021, 1, 4), 10.0), (d(2021, 1, 5), 11.0), (d(2021, 1, 7), 12.0), (d(2021, 1, 8), 13.0)],
    );
    let b = PriceSeries::new("B", vec![(d(2021, 1, 5), 20.0), (d(2021, 1, 8), 21.0), (d(2021, 1, 11), 22.0)]);

    let frame = align_calendar(&[a, b], CalendarSpan::Intersection).unwrap();
    assert_eq!(frame.dates, vec![d(2021, 1, 5), d(2021, 1, 6), d(2021, 1, 7), d(2021, 1, 8)]);
    assert_eq!(frame.names, vec!["A".to_string(), "B".to_string()]);
    assert_eq!(frame.prices.column(0).to_vec(), vec![11.0, 11.0, 12.0, 13.0]);
    assert_eq!(frame.prices.column(1).to_vec(), vec![20.0, 20.0, 20.0, 21.0]);
  }

  #[test]
  fn shortest_history_span_back_fills_leading_gaps() {
    let short = PriceSeries::new("SHORT", vec![(d(2021, 1, 4), 50.0), (d(2021, 1, 6), 70.0)]);
    let long = PriceSeries::new(
      "LONG",
      vec![(d(2021, 1, 5), 2.0), (d(2021, 1, 6), 3.0), (d(2021, 1, 7), 4.0), (d(2021, 1, 8), 5.0)],
    );

    let frame = align_calendar(&[short, long], CalendarSpan::ShortestHistory).unwrap();
    assert_eq!(frame.dates.first(), Some(&d(2021, 1, 4)));
    assert_eq!(frame.dates.last(), Some(&d(2021, 1, 8)));
    assert_eq!(frame.prices.column(0).to_vec(), vec![50.0, 50.0, 70.0, 70.0, 70.0]);
    assert_eq!(frame.prices.column(1).to_vec(), vec![2.0, 2.0, 3.0, 4.0, 5.0]);
  }

  #[test]
  fn weekend_observations_are_not_carried() {
    // Saturday close is off-calendar; Monday carries Friday's close.
    let a = PriceSeries::new("A", vec![(d(2021, 1, 8), 1.0), (d(2021, 1, 9), 5.0), (d(2021, 1, 12), 2.0)]);
    let frame = align_calendar(&[a], CalendarSpan::Intersection).unwrap();
    assert_eq!(frame.prices.column(0).to_vec(), vec![1.0, 1.0, 2.0]);
  }

  #[test]
  fn disjoint_histories_are_rejected() {
    let a = PriceSeries::new("A", vec![(d(2021, 1, 4), 1.0)]);
    let b = PriceSeries::new("B", vec![(d(2021, 2, 1), 1.0)]);
    assert!(align_calendar(&[a, b], CalendarSpan::Intersection).is_err());
    assert!(align_calendar(&[], CalendarSpan::Intersection).is_err());
    assert!(align_calendar(&[PriceSeries::new("E", vec![])], CalendarSpan::Intersection).is_err());
  }

  #[test]
  fn weekly_resample_keeps_last_close_of_each_week() {
    let frame = PriceFrame {
      dates: vec![d(2021, 1, 7), d(2021, 1, 8), d(2021, 1, 11), d(2021, 1, 13), d(2021, 1, 18)],
      names: vec!["A".into()],
      prices: array![[1.0], [2.0], [3.0], [4.0], [5.0]],
    };

    let weekly = resample_weekly(&frame);
    assert_eq!(weekly.dates, vec![d(2021, 1, 10), d(2021, 1, 17), d(2021, 1, 24)]);
    assert_eq!(weekly.prices.column(0).to_vec(), vec![2.0, 4.0, 5.0]);
  }
}
