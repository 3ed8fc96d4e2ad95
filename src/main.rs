//! CLI entry point: preprocess raw price history into annualized return moments.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap::ValueEnum;
use frontier_rs::data::estimate_from_prices;
use frontier_rs::data::load_price_directory;
use frontier_rs::data::write_price_frame_csv;
use frontier_rs::data::CalendarSpan;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Span {
  Intersection,
  ShortestHistory,
}

impl From<Span> for CalendarSpan {
  fn from(span: Span) -> Self {
    match span {
      Span::Intersection => CalendarSpan::Intersection,
      Span::ShortestHistory => CalendarSpan::ShortestHistory,
    }
  }
}

#[derive(Parser, Debug)]
#[command(name = "frontier")]
#[command(about = "Estimate annualized return moments from daily price files")]
#[command(version)]
struct Cli {
  /// Nation code of the price data, e.g. DK
  #[arg(short, long)]
  nation: String,

  /// Instrument type, e.g. stock
  #[arg(short, long)]
  instrument: String,

  /// Directory holding one sub-directory per nation
  #[arg(long, default_value = "../data")]
  data_root: PathBuf,

  /// How the common date range of all assets is chosen
  #[arg(long, value_enum, default_value_t = Span::Intersection)]
  span: Span,
}

fn preprocess_danish_stocks(root: &Path, span: CalendarSpan) -> Result<()> {
  let nation_dir = root.join("DK");
  let out_dir = nation_dir.join("preprocessed_data");
  let moments_dir = out_dir.join("stocks");

  let series = load_price_directory(nation_dir.join("stocks"))?;
  let (daily, moments) = estimate_from_prices(&series, span)?;

  fs::create_dir_all(&moments_dir)
    .with_context(|| format!("failed to create {}", moments_dir.display()))?;
  moments.save(&moments_dir)?;
  write_price_frame_csv(&daily, out_dir.join("danish_closed_stocks.csv"))?;

  info!(assets = daily.n_assets(), out = %out_dir.display(), "preprocessing finished");
  Ok(())
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let cli = Cli::parse();

  match (cli.nation.as_str(), cli.instrument.as_str()) {
    ("DK", "stock") => preprocess_danish_stocks(&cli.data_root, cli.span.into()),
    (nation, instrument) => {
      info!(nation, instrument, "nothing to preprocess for this nation/instrument");
      Ok(())
    }
  }
}
