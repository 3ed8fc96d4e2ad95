use criterion::black_box;
use criterion::criterion_group;
use criterion::criterion_main;
use criterion::BenchmarkId;
use criterion::Criterion;
use frontier_rs::portfolio::efficient_frontier;
use frontier_rs::portfolio::efficient_frontier_par;
use frontier_rs::portfolio::target_return_grid;
use frontier_rs::portfolio::SolverOptions;
use ndarray::Array1;
use ndarray::Array2;

/// Uncorrelated assets with rising return and variance.
fn universe(n: usize) -> (Array1<f64>, Array2<f64>) {
  let mu = Array1::from_shape_fn(n, |i| 0.04 + 0.01 * i as f64);
  let cov = Array2::from_shape_fn((n, n), |(i, j)| {
    if i == j {
      0.01 + 0.005 * i as f64
    } else {
      0.0
    }
  });
  (mu, cov)
}

fn bench_frontier_sweep(c: &mut Criterion) {
  let mut group = c.benchmark_group("frontier_sweep");
  group.sample_size(10);
  let options = SolverOptions::default();

  for &n in &[2usize, 5, 10] {
    let (mu, cov) = universe(n);
    let bounds = vec![(0.0, 1.0); n];
    let lo = mu.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = mu.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let targets = target_return_grid(lo, hi, 20);

    group.bench_with_input(BenchmarkId::new("sequential", n), &n, |b, _| {
      b.iter(|| black_box(efficient_frontier(&mu, &cov, &targets, &bounds, false, &options)))
    });

    group.bench_with_input(BenchmarkId::new("parallel", n), &n, |b, _| {
      b.iter(|| black_box(efficient_frontier_par(&mu, &cov, &targets, &bounds, false, &options)))
    });
  }

  group.finish();
}

criterion_group!(benches, bench_frontier_sweep);
criterion_main!(benches);
