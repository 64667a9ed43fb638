//! Tests for affine transforms and extents, mirroring how rasters are
//! georeferenced in the flood pipeline.

use flood_common::{AffineTransform, BoundingBox, Crs, FloodError, Stage};

#[test]
fn test_rasterio_style_coefficients() {
    // | a b c |   | 30  0  300000 |
    // | d e f | = |  0 -30 9000000|
    let t = AffineTransform::new(30.0, 0.0, 300_000.0, 0.0, -30.0, 9_000_000.0);
    assert_eq!(t.to_array(), [30.0, 0.0, 300_000.0, 0.0, -30.0, 9_000_000.0]);
    assert!(t.is_rectilinear());
    assert_eq!(t.cell_area().unwrap(), 900.0);
}

#[test]
fn test_bounds_of_south_up_grid() {
    // Positive e means row 0 is the southern edge.
    let t = AffineTransform::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0);
    assert_eq!(t.bounds(4, 2), BoundingBox::new(0.0, 0.0, 4.0, 2.0));
    assert_eq!(t.cell_area().unwrap(), 1.0);
}

#[test]
fn test_negative_pixel_width_still_has_positive_area() {
    let t = AffineTransform::new(-2.0, 0.0, 0.0, 0.0, -3.0, 0.0);
    assert_eq!(t.cell_area().unwrap(), 6.0);
}

#[test]
fn test_zero_height_is_invalid_geometry_at_report_stage() {
    let t = AffineTransform::new(2.0, 0.0, 0.0, 0.0, 0.0, 0.0);
    match t.cell_area() {
        Err(FloodError::InvalidGeometry { stage, .. }) => assert_eq!(stage, Stage::Report),
        other => panic!("expected InvalidGeometry, got {:?}", other),
    }
}

#[test]
fn test_inverse_maps_cell_centre_back() {
    let t = AffineTransform::north_up(500_000.0, 8_600_000.0, 12.5, 12.5);
    let inv = t.inverse().unwrap();
    let (x, y) = t.cell_center(10, 20);
    let (col, row) = inv.apply(x, y);
    assert!((col - 10.5).abs() < 1e-9);
    assert!((row - 20.5).abs() < 1e-9);
}

#[test]
fn test_crs_utm_south_from_epsg() {
    let crs = Crs::epsg(32718);
    assert!(crs.is_known());
    assert!(!crs.is_geographic());
    assert_eq!(crs.to_string(), "EPSG:32718");
}
