//! Benchmarks for the renderer crate - relief shading, frame composition
//! and PNG encoding.
//!
//! Run with: cargo bench --package renderer --bench render_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;

use flood_engine::{compute_depth, mask_dry, ElevationGrid};
use renderer::hillshade::hillshade;
use renderer::png::create_png;
use renderer::{HillshadeBackground, HillshadeParams, MapRenderer, RenderConfig};
use test_utils::create_bowl_dem;

fn bowl(size: usize) -> ElevationGrid {
    let dem = create_bowl_dem(size, 30.0, 100.0, 50.0);
    ElevationGrid::new(dem.data, dem.width, dem.height, dem.transform, dem.crs, None).unwrap()
}

/// Generate random RGBA pixel data for PNG encoding benchmarks.
fn generate_rgba_data(width: usize, height: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    let mut data = vec![0u8; width * height * 4];
    for chunk in data.chunks_mut(4) {
        chunk[0] = rng.gen();
        chunk[1] = rng.gen();
        chunk[2] = rng.gen();
        chunk[3] = 255;
    }
    data
}

fn bench_hillshade(c: &mut Criterion) {
    let mut group = c.benchmark_group("hillshade");
    let params = HillshadeParams::default();
    for size in [256usize, 1024] {
        let grid = bowl(size);
        group.throughput(Throughput::Elements((size * size) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &grid, |b, grid| {
            b.iter(|| hillshade(black_box(grid), &params))
        });
    }
    group.finish();
}

fn bench_render_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_frame");
    group.sample_size(20);
    for size in [256usize, 1024] {
        let grid = bowl(size);
        let config = RenderConfig::default();
        let background = HillshadeBackground::new(&grid, &config.hillshade).unwrap();
        let renderer = MapRenderer::new(config, &background, Vec::new(), grid.bounds()).unwrap();
        let masked = mask_dry(&compute_depth(&grid, 25.0).unwrap());

        group.bench_with_input(BenchmarkId::new("1000x1000", size), &masked, |b, masked| {
            b.iter(|| renderer.render_frame(black_box(masked), 25.0, 25.0).unwrap())
        });
    }
    group.finish();
}

fn bench_png_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("png_encode");
    for (w, h) in [(256usize, 256usize), (1000, 1000)] {
        let pixels = generate_rgba_data(w, h);
        group.throughput(Throughput::Bytes(pixels.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(format!("{}x{}", w, h)), &pixels, |b, px| {
            b.iter(|| create_png(black_box(px), w, h).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_hillshade, bench_render_frame, bench_png_encode);
criterion_main!(benches);
