//! # Price Series
//!
//! $$
//! \{(t_k, P_{t_k})\}_{k=1}^{n}
//! $$
//!
//! Raw per-asset close histories and CSV loading.

use std::fs;
use std::path::Path;

use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use chrono::DateTime;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use csv::ReaderBuilder;
use tracing::debug;
use tracing::info;

/// Close prices of one asset, sorted by date.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceSeries {
  /// Asset name.
  pub name: String,
  /// `(date, close)` pairs; a missing close is `NaN`.
  pub observations: Vec<(NaiveDate, f64)>,
}

impl PriceSeries {
  /// Build a series, sorting observations by date.
  pub fn new(name: impl Into<String>, mut observations: Vec<(NaiveDate, f64)>) -> Self {
    observations.sort_by_key(|(date, _)| *date);
    Self {
      name: name.into(),
      observations,
    }
  }

  /// Date of the earliest observation.
  pub fn first_date(&self) -> Option<NaiveDate> {
    self.observations.first().map(|(d, _)| *d)
  }

  /// Date of the latest observation.
  pub fn last_date(&self) -> Option<NaiveDate> {
    self.observations.last().map(|(d, _)| *d)
  }

  /// Number of observations.
  pub fn len(&self) -> usize {
    self.observations.len()
  }

  /// Whether the series has no observations.
  pub fn is_empty(&self) -> bool {
    self.observations.is_empty()
  }
}

/// Parse a `time` cell: unix seconds, `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` or RFC 3339.
pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate> {
  let raw = raw.trim();

  if let Ok(secs) = raw.parse::<i64>() {
    return DateTime::from_timestamp(secs, 0)
      .map(|dt| dt.date_naive())
      .with_context(|| format!("timestamp out of range: {raw}"));
  }
  if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
    return Ok(date);
  }
  if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
    return Ok(dt.date());
  }
  if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
    return Ok(dt.date_naive());
  }

  bail!("unrecognised date: {raw}")
}

/// Asset name from a data-vendor file name such as `XCSE_DLY_NOVO_B, 1D.csv` (`NOVO`).
/// Falls back to the file stem.
pub(crate) fn asset_name(path: &Path) -> String {
  let stem = path
    .file_stem()
    .map(|s| s.to_string_lossy().into_owned())
    .unwrap_or_default();
  let head = stem.split(',').next().unwrap_or(&stem);

  head
    .split('_')
    .nth(2)
    .filter(|s| !s.is_empty())
    .map(str::to_string)
    .unwrap_or(stem)
}

/// Load one asset's closes from a CSV with `time` and `close` columns.
pub fn load_price_csv(path: impl AsRef<Path>) -> Result<PriceSeries> {
  let path = path.as_ref();
  let mut reader = ReaderBuilder::new()
    .has_headers(true)
    .flexible(true)
    .from_path(path)
    .with_context(|| format!("failed to open {}", path.display()))?;

  let headers = reader.headers()?.clone();
  let column = |name: &str| {
    headers
      .iter()
      .position(|h| h.trim().eq_ignore_ascii_case(name))
      .with_context(|| format!("{} has no `{name}` column", path.display()))
  };
  let time_idx = column("time")?;
  let close_idx = column("close")?;

  let mut observations = Vec::new();
  for (line, record) in reader.records().enumerate() {
    let record = record?;
    let (Some(time), Some(close)) = (record.get(time_idx), record.get(close_idx)) else {
      bail!("{}: row {} is missing fields", path.display(), line + 1);
    };
    let date = parse_date(time).with_context(|| format!("{}: row {}", path.display(), line + 1))?;
    let close = if close.trim().is_empty() {
      f64::NAN
    } else {
      close
        .trim()
        .parse::<f64>()
        .with_context(|| format!("{}: row {}: bad close `{close}`", path.display(), line + 1))?
    };
    observations.push((date, close));
  }

  let series = PriceSeries::new(asset_name(path), observations);
  debug!(asset = %series.name, rows = series.len(), "loaded price file");
  Ok(series)
}

/// Load every file in `dir` as a price series, ordered by file name.
pub fn load_price_directory(dir: impl AsRef<Path>) -> Result<Vec<PriceSeries>> {
  let dir = dir.as_ref();
  let mut paths = fs::read_dir(dir)
    .with_context(|| format!("failed to read {}", dir.display()))?
    .filter_map(|entry| entry.ok().map(|e| e.path()))
    .filter(|p| p.is_file())
    .collect::<Vec<_>>();
  paths.sort();

  let series = paths.iter().map(load_price_csv).collect::<Result<Vec<_>>>()?;
  info!(dir = %dir.display(), assets = series.len(), "loaded price directory");
  Ok(series)
}
