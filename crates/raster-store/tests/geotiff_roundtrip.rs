//! Export/re-read behaviour of depth rasters.

use std::fs::File;

use tiff::encoder::{colortype, TiffEncoder};

use flood_common::{AffineTransform, Crs, FloodError, Stage};
use flood_engine::{compute_depth, integrate_volume, mask_dry, ElevationGrid};
use raster_store::{integrate_exported_volume, read_dem, read_geotiff, write_depth, GeoRaster};
use test_utils::{bowl_3x3, create_bowl_dem, ScratchDir, BOWL_3X3_LEVEL, BOWL_3X3_VOLUME};

fn grid_from(dem: test_utils::SyntheticDem) -> ElevationGrid {
    ElevationGrid::new(dem.data, dem.width, dem.height, dem.transform, dem.crs, None).unwrap()
}

#[test]
fn test_bowl_volume_survives_export() {
    let scratch = ScratchDir::new();
    let path = scratch.file("depth.tif");
    let masked = mask_dry(&compute_depth(&grid_from(bowl_3x3()), BOWL_3X3_LEVEL).unwrap());

    write_depth(&path, &masked, -9999.0).unwrap();
    let volume = integrate_exported_volume(&path).unwrap();

    assert_eq!(volume.cubic_units, BOWL_3X3_VOLUME);
    assert_eq!(volume.wet_cells, 1);
    assert_eq!((volume.cell_width, volume.cell_height), (2.0, 2.0));
}

#[test]
fn test_export_preserves_shape_transform_crs() {
    let scratch = ScratchDir::new();
    let path = scratch.file("nested/out/depth.tif");
    let dem = grid_from(create_bowl_dem(17, 25.0, 310.0, 40.0));
    let masked = mask_dry(&compute_depth(&dem, 12.5).unwrap());

    write_depth(&path, &masked, -9999.0).unwrap();
    let raster = read_geotiff(&path).unwrap();

    assert_eq!((raster.width, raster.height), (17, 17));
    assert_eq!(raster.transform, *dem.transform());
    assert_eq!(raster.crs, Crs::epsg(32633));
    assert_eq!(raster.nodata, Some(-9999.0));
    assert_eq!(raster.data, masked.filled(-9999.0));

    // In-memory and persisted volumes agree exactly for f32 depths
    let in_memory = integrate_volume(&masked).unwrap();
    assert_eq!(integrate_exported_volume(&path).unwrap(), in_memory);
}

#[test]
fn test_dem_roundtrip_with_nodata() {
    let scratch = ScratchDir::new();
    let path = scratch.file("dem.tif");
    GeoRaster {
        data: vec![-9999.0, 4.0, 2.0, 6.0],
        width: 2,
        height: 2,
        transform: AffineTransform::north_up(10.0, 20.0, 1.0, 1.0),
        crs: Crs::epsg(4326),
        nodata: Some(-9999.0),
    }
    .write(&path)
    .unwrap();

    let grid = read_dem(&path).unwrap();
    assert_eq!(grid.min_elevation(), Some(2.0));
    assert_eq!(grid.valid_cell_count(), 3);
    assert_eq!(*grid.crs(), Crs::wgs84());
}

#[test]
fn test_missing_export_is_persistence_error() {
    let scratch = ScratchDir::new();
    let err = integrate_exported_volume(scratch.file("absent.tif")).unwrap_err();
    assert!(matches!(err, FloodError::Persistence { .. }));
    assert_eq!(err.stage(), Stage::Report);
}

#[test]
fn test_export_without_nodata_tag_is_persistence_error() {
    let scratch = ScratchDir::new();
    let path = scratch.file("plain.tif");
    GeoRaster {
        data: vec![1.0; 4],
        width: 2,
        height: 2,
        transform: AffineTransform::north_up(0.0, 2.0, 1.0, 1.0),
        crs: Crs::epsg(32633),
        nodata: None,
    }
    .write(&path)
    .unwrap();

    let err = integrate_exported_volume(&path).unwrap_err();
    assert!(matches!(err, FloodError::Persistence { .. }));
}

#[test]
fn test_dem_without_georeference_is_input_error() {
    let scratch = ScratchDir::new();
    let path = scratch.file("bare.tif");
    let mut encoder = TiffEncoder::new(File::create(&path).unwrap()).unwrap();
    encoder
        .write_image::<colortype::Gray32Float>(2, 2, &[1.0, 2.0, 3.0, 4.0])
        .unwrap();

    let err = read_dem(&path).unwrap_err();
    assert!(matches!(err, FloodError::Input { .. }));
    assert!(err.to_string().contains("bare.tif"));
}

#[test]
fn test_unwritable_destination_is_persistence_error() {
    let scratch = ScratchDir::new();
    // A directory cannot be opened as a file
    let masked = mask_dry(&compute_depth(&grid_from(bowl_3x3()), 1.0).unwrap());
    let err = write_depth(scratch.path(), &masked, -9999.0).unwrap_err();
    assert!(matches!(err, FloodError::Persistence { stage: Stage::Export, .. }));
}
