//! Projection throughput benchmarks.
//!
//! ## Running the benchmarks
//!
//! ```bash
//! cargo bench -p aerochart-proj
//! ```
//!
//! ## Benchmarks included
//!
//! - `project/<kind>` - lat/lon to pixel
//! - `unproject/<kind>` - pixel to lat/lon (the conformal conic inverse iterates)
//! - `is_charted/<kind>` - full charted-area test

use aerochart_proj::{Chart, ChartOverrides, Pixel};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

const CHARTS: &[(&str, &str)] = &[
    (
        "lambert",
        "38.5,-73.5,33,45,16645,12349,6378137,6356752.314245,42.334,0,0,-42.334,\
         -352324.715,261391.283,20190425,20191017,New York SEC 103",
    ),
    (
        "polar",
        "psp:88,-36,80,24,4337,87,5737,199,1118,4690,8090,5279,\
         9254,6693,19690603,99999999,ONC A-1 19690603",
    ),
    ("box", "box:45,-72,44,-70,2000,1500,20240101,0,Test Box 1"),
];

fn charts() -> Vec<(&'static str, Chart)> {
    let overrides = ChartOverrides::new();
    CHARTS
        .iter()
        .map(|(kind, line)| (*kind, Chart::from_line(line, &overrides).expect("valid chart line")))
        .collect()
}

/// Pixels spread over the chart in a regular grid.
fn sample_pixels(chart: &Chart) -> Vec<Pixel> {
    let (w, h) = chart.dimensions();
    let mut out = Vec::with_capacity(100);
    for i in 0..10 {
        for j in 0..10 {
            out.push(Pixel::new(w as f64 * (i as f64 + 0.5) / 10.0, h as f64 * (j as f64 + 0.5) / 10.0));
        }
    }
    out
}

fn bench_project(c: &mut Criterion) {
    let mut group = c.benchmark_group("project");
    for (kind, chart) in charts() {
        let coords: Vec<_> = sample_pixels(&chart)
            .into_iter()
            .map(|p| chart.unproject_from_pixel(p))
            .collect();
        group.throughput(Throughput::Elements(coords.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(kind), &coords, |b, coords| {
            b.iter(|| {
                for ll in coords {
                    black_box(chart.project_to_pixel(ll.lat, ll.lon));
                }
            });
        });
    }
    group.finish();
}

fn bench_unproject(c: &mut Criterion) {
    let mut group = c.benchmark_group("unproject");
    for (kind, chart) in charts() {
        let pixels = sample_pixels(&chart);
        group.throughput(Throughput::Elements(pixels.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(kind), &pixels, |b, pixels| {
            b.iter(|| {
                for p in pixels {
                    black_box(chart.unproject_from_pixel(*p));
                }
            });
        });
    }
    group.finish();
}

fn bench_is_charted(c: &mut Criterion) {
    let mut group = c.benchmark_group("is_charted");
    for (kind, chart) in charts() {
        let pixels = sample_pixels(&chart);
        group.throughput(Throughput::Elements(pixels.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(kind), &pixels, |b, pixels| {
            b.iter(|| {
                for p in pixels {
                    black_box(chart.pixel_is_charted(p.x, p.y));
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_project, bench_unproject, bench_is_charted);
criterion_main!(benches);
