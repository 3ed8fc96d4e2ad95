//! # Store
//!
//! Persistence of estimated moments as `.npy` arrays and of aligned closes as CSV.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::Context;
use anyhow::Result;
use csv::WriterBuilder;
use ndarray::Array1;
use ndarray::Array2;
use ndarray_npy::ReadNpyExt;
use ndarray_npy::WriteNpyExt;
use tracing::info;

use super::calendar::PriceFrame;
use super::moments::ReturnMoments;

pub const M_LOG_FILE: &str = "m_log.npy";
pub const S_LOG_FILE: &str = "S_log.npy";
pub const M_FILE: &str = "m.npy";
pub const S_FILE: &str = "S.npy";

fn read_array<A: ReadNpyExt>(path: &Path) -> Result<A> {
  let file = File::open(path).with_context(|| format!("failed to open {:?}", path))?;
  A::read_npy(file).with_context(|| format!("failed to decode npy data from {:?}", path))
}

fn write_array<A: WriteNpyExt>(array: &A, path: &Path) -> Result<()> {
  let file = File::create(path).with_context(|| format!("failed to create {:?}", path))?;
  array
    .write_npy(BufWriter::new(file))
    .with_context(|| format!("failed to write npy data to {:?}", path))
}

impl ReturnMoments {
  /// Write `m_log.npy`, `S_log.npy`, `m.npy` and `S.npy` into `dir`.
  pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    write_array(&self.m_log, &dir.join(M_LOG_FILE))?;
    write_array(&self.s_log, &dir.join(S_LOG_FILE))?;
    write_array(&self.m, &dir.join(M_FILE))?;
    write_array(&self.s, &dir.join(S_FILE))?;
    info!(dir = %dir.display(), assets = self.m.len(), "saved return moments");
    Ok(())
  }

  /// Read the four arrays written by [`ReturnMoments::save`].
  pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
    let dir = dir.as_ref();
    Ok(Self {
      m_log: read_array::<Array1<f64>>(&dir.join(M_LOG_FILE))?,
      s_log: read_array::<Array2<f64>>(&dir.join(S_LOG_FILE))?,
      m: read_array::<Array1<f64>>(&dir.join(M_FILE))?,
      s: read_array::<Array2<f64>>(&dir.join(S_FILE))?,
    })
  }
}

/// Write aligned closes as CSV: a `time` column followed by one column per asset.
pub fn write_price_frame_csv(frame: &PriceFrame, path: impl AsRef<Path>) -> Result<()> {
  let path = path.as_ref();
  let mut writer = WriterBuilder::new()
    .from_path(path)
    .with_context(|| format!("failed to create {}", path.display()))?;

  let mut header = vec!["time".to_string()];
  header.extend(frame.names.iter().cloned());
  writer.write_record(&header)?;

  for (date, row) in frame.dates.iter().zip(frame.prices.rows()) {
    let mut record = vec![date.format("%Y-%m-%d").to_string()];
    record.extend(row.iter().map(|p| p.to_string()));
    writer.write_record(&record)?;
  }
  writer.flush()?;

  info!(path = %path.display(), rows = frame.n_rows(), "wrote aligned prices");
  Ok(())
}

#[cfg(test)]
mod tests {
  use std::fs;

  use chrono::NaiveDate;
  use ndarray::array;

  use super::*;

  #[test]
  fn moments_round_trip_through_npy_files() {
    let dir = tempfile::tempdir().unwrap();
    let moments = ReturnMoments {
      m_log: array![0.051, -0.012],
      s_log: array![[0.04, 0.003], [0.003, 0.0225]],
      m: array![0.0736, 0.0],
      s: array![[0.0439, 0.0031], [0.0031, 0.0229]],
    };

    moments.save(dir.path()).unwrap();
    for name in [M_LOG_FILE, S_LOG_FILE, M_FILE, S_FILE] {
      assert!(dir.path().join(name).is_file(), "missing {name}");
    }
    assert_eq!(ReturnMoments::load(dir.path()).unwrap(), moments);
  }

  #[test]
  fn loading_from_empty_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    assert!(ReturnMoments::load(dir.path()).is_err());
  }

  #[test]
  fn writes_price_frame_with_date_column() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("closes.csv");
    let frame = PriceFrame {
      dates: vec![
        NaiveDate::from_ymd_opt(2021, 1, 4).unwrap(),
        NaiveDate::from_ymd_opt(2021, 1, 5).unwrap(),
      ],
      names: vec!["NOVO".into(), "DSV".into()],
      prices: array![[100.5, 20.0], [101.0, 21.25]],
    };

    write_price_frame_csv(&frame, &path).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines, vec!["time,NOVO,DSV", "2021-01-04,100.5,20", "2021-01-05,101,21.25"]);
  }
}
