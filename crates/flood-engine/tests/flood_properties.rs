//! Behavioural properties of the flat-fill model.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use flood_common::{AffineTransform, FloodError};
use flood_engine::{
    compute_depth, integrate_sentinel_grid, integrate_volume, mask_dry, DepthEngine, ElevationGrid,
    FloodSequence, Frame, FloodResult, NeumaierSum,
};
use test_utils::{
    assert_rel_eq, bowl_3x3, create_bowl_dem, create_random_dem, create_valley_dem, degenerate_transform, SyntheticDem,
    BOWL_3X3_LEVEL, BOWL_3X3_VOLUME,
};

fn grid(dem: &SyntheticDem) -> ElevationGrid {
    ElevationGrid::new(dem.data.clone(), dem.width, dem.height, dem.transform, dem.crs, None).unwrap()
}

fn volume_at(grid: &ElevationGrid, level: f64) -> f64 {
    integrate_volume(&mask_dry(&compute_depth(grid, level).unwrap()))
        .unwrap()
        .cubic_units
}

#[test]
fn test_bowl_end_to_end() {
    let dem = grid(&bowl_3x3());
    let masked = mask_dry(&compute_depth(&dem, BOWL_3X3_LEVEL).unwrap());
    assert_eq!(masked.wet_count(), 1);
    assert_eq!(masked.max_depth(), 3.0);
    let volume = integrate_volume(&masked).unwrap();
    assert_eq!(volume.cubic_units, BOWL_3X3_VOLUME);
    assert_eq!(volume.cell_area, 4.0);
}

#[test]
fn test_non_positive_level_has_zero_volume() {
    let dem = grid(&create_random_dem(16, 16, 11, 100.0, 200.0));
    for level in [0.0, -0.5, -50.0] {
        assert_eq!(volume_at(&dem, level), 0.0);
    }
}

#[test]
fn test_volume_monotonic_in_level() {
    let mut rng = StdRng::seed_from_u64(42);
    for seed in 0..5 {
        let dem = grid(&create_random_dem(24, 18, seed, -20.0, 80.0));
        let mut levels: Vec<f64> = (0..20).map(|_| rng.gen_range(0.0..120.0)).collect();
        levels.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let volumes: Vec<f64> = levels.iter().map(|l| volume_at(&dem, *l)).collect();
        for pair in volumes.windows(2) {
            assert!(pair[1] >= pair[0], "volume decreased: {:?}", pair);
        }
    }
}

#[test]
fn test_valley_impounds_from_lowest_row() {
    let dem = grid(&create_valley_dem(5, 4, 10.0));
    let masked = mask_dry(&compute_depth(&dem, 1.0).unwrap());
    // Thalweg rises 0.5 per row northwards, banks 2.0 per column
    assert_eq!(masked.wet_count(), 2);
    assert_eq!(masked.get(2, 3).and_then(|c| c.depth()), Some(1.0));
    assert_eq!(masked.get(2, 2).and_then(|c| c.depth()), Some(0.5));
    assert_eq!(integrate_volume(&masked).unwrap().cubic_units, 150.0);
}

#[test]
fn test_cell_depth_never_decreases_with_level() {
    let mut rng = StdRng::seed_from_u64(7);
    for seed in 0..5 {
        let dem = grid(&create_random_dem(20, 15, 100 + seed, -30.0, 60.0));
        for _ in 0..10 {
            let mut pair = [rng.gen_range(-10.0..100.0), rng.gen_range(-10.0..100.0)];
            pair.sort_by(|a: &f64, b| a.partial_cmp(b).unwrap());
            let low = compute_depth(&dem, pair[0]).unwrap();
            let high = compute_depth(&dem, pair[1]).unwrap();
            for (i, (a, b)) in low.data().iter().zip(high.data()).enumerate() {
                assert!(a <= b, "cell {} got shallower: {} at {} vs {} at {}", i, a, pair[0], b, pair[1]);
            }
        }
    }
}

#[test]
fn test_depth_invariant_under_vertical_translation() {
    // Integer-valued terrain keeps the shifted grid exactly representable
    let base = create_bowl_dem(9, 5.0, 0.0, 16.0);
    let base = SyntheticDem {
        data: base.data.iter().map(|v| v.round()).collect(),
        ..base
    };
    let shifted = base.shifted(1200.0);
    let a = compute_depth(&grid(&base), 7.0).unwrap();
    let b = compute_depth(&grid(&shifted), 7.0).unwrap();
    assert_eq!(a.data(), b.data());
}

#[test]
fn test_volume_independent_of_traversal_order() {
    let dem = grid(&create_random_dem(64, 64, 3, 0.0, 50.0));
    let filled = mask_dry(&compute_depth(&dem, 30.0).unwrap()).filled(-9999.0);
    let t = *dem.transform();
    let forward = integrate_sentinel_grid(&filled, -9999.0, &t).unwrap().cubic_units;

    let mut shuffled = filled.clone();
    shuffled.shuffle(&mut StdRng::seed_from_u64(99));
    let permuted = integrate_sentinel_grid(&shuffled, -9999.0, &t).unwrap().cubic_units;

    let reversed: NeumaierSum = filled
        .iter()
        .rev()
        .filter(|v| **v != -9999.0)
        .map(|v| *v as f64)
        .collect();

    assert_rel_eq!(forward, permuted, 1e-9);
    assert_rel_eq!(forward, reversed.total() * 900.0, 1e-9);
}

#[test]
fn test_animation_levels_and_first_frame_dry() {
    let dem = grid(&bowl_3x3());
    let engine = DepthEngine::default();
    let seq = FloodSequence::new(1.0, 2.0).unwrap();
    let frames: Vec<Frame> = seq.frames(&engine, &dem).collect::<FloodResult<_>>().unwrap();

    let levels: Vec<f64> = frames.iter().map(|f| f.water_elevation).collect();
    assert_eq!(levels, vec![0.0, 1.0, 2.0]);
    assert_eq!(frames[0].masked().wet_count(), 0);
    assert_eq!(frames[2].masked().max_depth(), 2.0);
}

#[test]
fn test_degenerate_transform_fails_volume() {
    let dem = ElevationGrid::new(
        bowl_3x3().data,
        3,
        3,
        degenerate_transform(),
        flood_common::Crs::unknown(),
        None,
    )
    .unwrap();
    // Depth is still computable; only integration needs a cell area
    let masked = mask_dry(&compute_depth(&dem, 3.0).unwrap());
    let err = integrate_volume(&masked).unwrap_err();
    assert!(matches!(err, FloodError::InvalidGeometry { .. }));
}

#[test]
fn test_negative_pixel_height_uses_absolute_value() {
    let flipped = AffineTransform::new(2.0, 0.0, 0.0, 0.0, 2.0, 0.0);
    let dem = ElevationGrid::new(
        bowl_3x3().data,
        3,
        3,
        flipped,
        flood_common::Crs::unknown(),
        None,
    )
    .unwrap();
    assert_eq!(volume_at(&dem, BOWL_3X3_LEVEL), BOWL_3X3_VOLUME);
}
