use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use flood_common::{Crs, FloodError};
use projection::{BuiltinReprojector, Reprojector};
use raster_store::{vector::parse_geojson, Geometry, LayerStyle, VectorLayer};
use test_utils::{assert_approx_eq, assert_coords_approx_eq, DAM_GEOJSON, RIVER_GEOJSON};

fn layer(text: &str, style: LayerStyle) -> VectorLayer {
    let (geometries, crs) = parse_geojson(text).unwrap();
    VectorLayer {
        name: style.label.clone(),
        geometries,
        crs,
        style,
    }
}

#[test]
fn test_river_into_utm() {
    let river = layer(RIVER_GEOJSON, LayerStyle::river());
    assert_eq!(river.crs, Crs::wgs84());

    let utm = BuiltinReprojector::new()
        .reproject_layer(&river, &Crs::epsg(32633))
        .unwrap();
    assert_eq!(utm.crs, Crs::epsg(32633));
    assert_eq!(utm.style, LayerStyle::river());
    match &utm.geometries[0] {
        Geometry::LineString(pts) => {
            assert_eq!(pts.len(), 3);
            assert_approx_eq!(pts[0].0, 500_000.0, 1e-6);
            assert_approx_eq!(pts[0].1, 4_649_776.225, 1e-2);
        }
        other => panic!("unexpected geometry {:?}", other),
    }
}

#[test]
fn test_same_crs_is_untouched() {
    let dam = layer(DAM_GEOJSON, LayerStyle::dam());
    let out = BuiltinReprojector::new()
        .reproject_layer(&dam, &Crs::epsg(32633))
        .unwrap();
    assert_eq!(out, dam);
}

#[test]
fn test_unknown_target_is_geometry_mismatch() {
    let river = layer(RIVER_GEOJSON, LayerStyle::river());
    let err = BuiltinReprojector::new()
        .reproject_layer(&river, &Crs::epsg(2193))
        .unwrap_err();
    assert!(matches!(err, FloodError::GeometryMismatch { .. }));
}

#[test]
fn test_random_roundtrips_through_every_system() {
    let r = BuiltinReprojector::new();
    let wgs84 = Crs::wgs84();
    let mut rng = StdRng::seed_from_u64(2024);
    for _ in 0..200 {
        let zone: u32 = rng.gen_range(1..=60);
        let north = rng.gen_bool(0.5);
        let central = (zone as f64 - 1.0) * 6.0 - 177.0;
        let lon = central + rng.gen_range(-3.0..3.0);
        let lat = if north { rng.gen_range(0.0..80.0) } else { rng.gen_range(-80.0..0.0) };
        let utm = Crs::epsg(if north { 32600 + zone } else { 32700 + zone });

        for target in [utm, Crs::epsg(3857)] {
            let (x, y) = r.transform_point(&wgs84, &target, lon, lat).unwrap();
            let (lon2, lat2) = r.transform_point(&target, &wgs84, x, y).unwrap();
            assert_coords_approx_eq!((lon2, lat2), (lon, lat), 1e-7);
        }
    }
}
