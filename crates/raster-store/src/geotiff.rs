//! Single-band GeoTIFF reading and writing.
//!
//! Georeferencing follows GeoTIFF 1.0: the affine transform comes from
//! `ModelTransformationTag` when present, otherwise from
//! `ModelPixelScaleTag` + `ModelTiepointTag`. The CRS is the EPSG code in
//! the `GeoKeyDirectoryTag`; nodata is GDAL's ASCII `GDAL_NODATA` tag.

use std::fs::{self, File};
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;
use tracing::{debug, info, warn};

use flood_common::{AffineTransform, Crs, FloodResult, Stage};
use flood_engine::{integrate_sentinel_grid, ElevationGrid, MaskedDepthGrid, Volume};

use crate::error::{StoreError, StoreResult};

const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
const TAG_MODEL_TIEPOINT: u16 = 33922;
const TAG_MODEL_TRANSFORMATION: u16 = 34264;
const TAG_GEO_KEY_DIRECTORY: u16 = 34735;
const TAG_GDAL_NODATA: u16 = 42113;

const KEY_GT_MODEL_TYPE: u16 = 1024;
const KEY_GT_RASTER_TYPE: u16 = 1025;
const KEY_GEOGRAPHIC_TYPE: u16 = 2048;
const KEY_PROJECTED_CS_TYPE: u16 = 3072;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;
const USER_DEFINED: u16 = 32767;

fn tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

/// First band of a GeoTIFF with its georeferencing.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoRaster {
    pub data: Vec<f32>,
    pub width: usize,
    pub height: usize,
    pub transform: AffineTransform,
    pub crs: Crs,
    pub nodata: Option<f32>,
}

impl GeoRaster {
    /// Write as a single-band f32 GeoTIFF.
    pub fn write(&self, path: impl AsRef<Path>) -> StoreResult<()> {
        write_band(
            path.as_ref(),
            &self.data,
            self.width,
            self.height,
            &self.transform,
            &self.crs,
            self.nodata,
        )
    }

    pub fn into_elevation_grid(self) -> FloodResult<ElevationGrid> {
        ElevationGrid::new(
            self.data,
            self.width,
            self.height,
            self.transform,
            self.crs,
            self.nodata,
        )
    }
}

pub(crate) fn open_decoder(path: &Path) -> StoreResult<Decoder<BufReader<File>>> {
    let file = File::open(path)?;
    Ok(Decoder::new(BufReader::new(file))?.with_limits(Limits::unlimited()))
}

fn find_f64s<R: Read + Seek>(decoder: &mut Decoder<R>, code: u16) -> StoreResult<Option<Vec<f64>>> {
    match decoder.find_tag(tag(code))? {
        Some(value) => Ok(Some(value.into_f64_vec()?)),
        None => Ok(None),
    }
}

/// Affine transform, CRS and nodata of the current image.
pub(crate) fn read_georeference<R: Read + Seek>(
    decoder: &mut Decoder<R>,
) -> StoreResult<(AffineTransform, Crs, Option<f32>)> {
    let matrix = find_f64s(decoder, TAG_MODEL_TRANSFORMATION)?;
    let scale = find_f64s(decoder, TAG_MODEL_PIXEL_SCALE)?;
    let tiepoint = find_f64s(decoder, TAG_MODEL_TIEPOINT)?;
    let transform = parse_transform(matrix, scale, tiepoint)?;

    let crs = match decoder.find_tag(tag(TAG_GEO_KEY_DIRECTORY))? {
        Some(value) => parse_geokeys(&value.into_u16_vec()?),
        None => Crs::unknown(),
    };

    let nodata = match decoder.find_tag(tag(TAG_GDAL_NODATA))? {
        Some(value) => Some(parse_nodata(&value.into_string()?)?),
        None => None,
    };

    Ok((transform, crs, nodata))
}

fn parse_transform(
    matrix: Option<Vec<f64>>,
    scale: Option<Vec<f64>>,
    tiepoint: Option<Vec<f64>>,
) -> StoreResult<AffineTransform> {
    if let Some(m) = matrix {
        if m.len() < 8 {
            return Err(StoreError::InvalidMetadata(format!(
                "ModelTransformationTag has {} values, expected 16",
                m.len()
            )));
        }
        return Ok(AffineTransform::new(m[0], m[1], m[3], m[4], m[5], m[7]));
    }

    match (scale, tiepoint) {
        (Some(s), Some(t)) if s.len() >= 2 && t.len() >= 6 => {
            let (sx, sy) = (s[0], s[1]);
            let (i, j, x, y) = (t[0], t[1], t[3], t[4]);
            Ok(AffineTransform::new(sx, 0.0, x - i * sx, 0.0, -sy, y + j * sy))
        }
        (Some(_), Some(_)) => Err(StoreError::InvalidMetadata(
            "ModelPixelScaleTag or ModelTiepointTag is truncated".to_string(),
        )),
        _ => Err(StoreError::MissingGeoreference(
            "no ModelTransformationTag and no ModelPixelScaleTag/ModelTiepointTag pair".to_string(),
        )),
    }
}

/// EPSG code from an inline GeoKey directory.
fn parse_geokeys(keys: &[u16]) -> Crs {
    if keys.len() < 4 {
        return Crs::unknown();
    }
    let count = keys[3] as usize;
    let mut projected = None;
    let mut geographic = None;
    for entry in keys[4..].chunks_exact(4).take(count) {
        let (id, location, value) = (entry[0], entry[1], entry[3]);
        if location != 0 {
            continue;
        }
        match id {
            KEY_PROJECTED_CS_TYPE => projected = Some(value),
            KEY_GEOGRAPHIC_TYPE => geographic = Some(value),
            _ => {}
        }
    }

    match (projected, geographic) {
        (Some(code), _) if code != USER_DEFINED => Crs::epsg(code as u32),
        (_, Some(code)) if code != USER_DEFINED => Crs::epsg(code as u32),
        _ => Crs::unknown(),
    }
}

fn geokey_directory(crs: &Crs) -> Option<Vec<u16>> {
    let code = u16::try_from(crs.code.epsg()?).ok()?;
    let (model_type, key) = if crs.is_geographic() {
        (MODEL_TYPE_GEOGRAPHIC, KEY_GEOGRAPHIC_TYPE)
    } else {
        (MODEL_TYPE_PROJECTED, KEY_PROJECTED_CS_TYPE)
    };
    Some(vec![
        1, 1, 0, 3,
        KEY_GT_MODEL_TYPE, 0, 1, model_type,
        KEY_GT_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA,
        key, 0, 1, code,
    ])
}

fn parse_nodata(raw: &str) -> StoreResult<f32> {
    let trimmed = raw.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    trimmed
        .parse::<f64>()
        .map(|v| v as f32)
        .map_err(|_| StoreError::InvalidMetadata(format!("GDAL_NODATA '{}' is not a number", trimmed)))
}

/// Decode the first band of the current image as f32.
pub(crate) fn decode_first_band<R: Read + Seek>(
    decoder: &mut Decoder<R>,
) -> StoreResult<(Vec<f32>, usize, usize)> {
    let (w, h) = decoder.dimensions()?;
    let (width, height) = (w as usize, h as usize);
    let pixels = width * height;

    let values: Vec<f32> = match decoder.read_image()? {
        DecodingResult::U8(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::F32(v) => v,
        DecodingResult::F64(v) => v.into_iter().map(|x| x as f32).collect(),
        _ => {
            return Err(StoreError::UnsupportedFormat(
                "64-bit integer samples".to_string(),
            ))
        }
    };

    if pixels == 0 || values.len() % pixels != 0 {
        return Err(StoreError::InvalidMetadata(format!(
            "{} samples do not fill a {}x{} image",
            values.len(),
            width,
            height
        )));
    }
    let samples = values.len() / pixels;
    let band = if samples == 1 {
        values
    } else {
        debug!(samples, "Multi-band raster, keeping band 1");
        values.into_iter().step_by(samples).collect()
    };
    Ok((band, width, height))
}

/// Read the first band and georeferencing of a GeoTIFF.
pub fn read_geotiff(path: impl AsRef<Path>) -> StoreResult<GeoRaster> {
    let path = path.as_ref();
    let mut decoder = open_decoder(path)?;
    let (transform, crs, nodata) = read_georeference(&mut decoder)?;
    let (data, width, height) = decode_first_band(&mut decoder)?;
    debug!(
        path = %path.display(),
        width,
        height,
        crs = %crs,
        nodata = ?nodata,
        "Read GeoTIFF"
    );
    Ok(GeoRaster {
        data,
        width,
        height,
        transform,
        crs,
        nodata,
    })
}

/// Load a digital elevation model.
pub fn read_dem(path: impl AsRef<Path>) -> FloodResult<ElevationGrid> {
    let path = path.as_ref();
    let raster = read_geotiff(path).map_err(|e| e.into_input(path))?;
    if !raster.crs.is_known() {
        warn!(path = %path.display(), "Elevation model has no EPSG code; volume units are unknown");
    }
    let grid = raster.into_elevation_grid()?;
    info!(
        path = %path.display(),
        width = grid.width(),
        height = grid.height(),
        crs = %grid.crs(),
        valid_cells = grid.valid_cell_count(),
        "Loaded elevation model"
    );
    Ok(grid)
}

fn write_band(
    path: &Path,
    data: &[f32],
    width: usize,
    height: usize,
    transform: &AffineTransform,
    crs: &Crs,
    nodata: Option<f32>,
) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    let mut encoder = TiffEncoder::new(file)?;
    let mut image = encoder.new_image::<colortype::Gray32Float>(width as u32, height as u32)?;
    {
        let dir = image.encoder();
        if transform.is_rectilinear() {
            dir.write_tag(tag(TAG_MODEL_PIXEL_SCALE), &[transform.a, -transform.e, 0.0][..])?;
            dir.write_tag(
                tag(TAG_MODEL_TIEPOINT),
                &[0.0, 0.0, 0.0, transform.c, transform.f, 0.0][..],
            )?;
        } else {
            let matrix = [
                transform.a, transform.b, 0.0, transform.c,
                transform.d, transform.e, 0.0, transform.f,
                0.0, 0.0, 0.0, 0.0,
                0.0, 0.0, 0.0, 1.0,
            ];
            dir.write_tag(tag(TAG_MODEL_TRANSFORMATION), &matrix[..])?;
        }

        match geokey_directory(crs) {
            Some(keys) => dir.write_tag(tag(TAG_GEO_KEY_DIRECTORY), &keys[..])?,
            None => warn!(path = %path.display(), crs = %crs, "CRS not written to GeoTIFF"),
        }

        if let Some(nodata) = nodata {
            let nodata_text = format!("{}", nodata);
            dir.write_tag(tag(TAG_GDAL_NODATA), nodata_text.as_str())?;
        }
    }
    image.write_data(data)?;
    Ok(())
}

/// Export a masked depth grid as a single-band f32 GeoTIFF.
///
/// Dry and missing cells are written as `nodata`, which is also recorded
/// in the `GDAL_NODATA` tag. Errors surface as `Persistence` at the export
/// stage.
pub fn write_depth(path: impl AsRef<Path>, masked: &MaskedDepthGrid, nodata: f32) -> FloodResult<()> {
    let path = path.as_ref();
    write_band(
        path,
        &masked.filled(nodata),
        masked.width(),
        masked.height(),
        masked.transform(),
        masked.crs(),
        Some(nodata),
    )
    .map_err(|e| e.into_persistence(Stage::Export, path))?;

    info!(
        path = %path.display(),
        water_elevation = masked.water_elevation(),
        wet_cells = masked.wet_count(),
        "Exported depth raster"
    );
    Ok(())
}

/// Integrate the stored volume of an exported depth raster.
///
/// The file is re-read so the reported number reflects what was persisted.
/// A missing or unreadable file, or one without a nodata tag, fails with
/// `Persistence`.
pub fn integrate_exported_volume(path: impl AsRef<Path>) -> FloodResult<Volume> {
    let path = path.as_ref();
    let raster = read_geotiff(path).map_err(|e| e.into_persistence(Stage::Report, path))?;
    let nodata = raster
        .nodata
        .ok_or_else(|| StoreError::MissingNodata.into_persistence(Stage::Report, path))?;

    if raster.crs.is_geographic() {
        warn!(
            path = %path.display(),
            crs = %raster.crs,
            "Depth raster is in a geographic CRS; volume is in degree-squared meters"
        );
    }

    let volume = integrate_sentinel_grid(&raster.data, nodata, &raster.transform)?;
    info!(
        path = %path.display(),
        volume = volume.cubic_units,
        wet_cells = volume.wet_cells,
        cell_width = volume.cell_width,
        cell_height = volume.cell_height,
        "Integrated exported volume"
    );
    Ok(volume)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_from_scale_and_tiepoint() {
        let t = parse_transform(
            None,
            Some(vec![30.0, 30.0, 0.0]),
            Some(vec![0.0, 0.0, 0.0, 500000.0, 4650000.0, 0.0]),
        )
        .unwrap();
        assert_eq!(t, AffineTransform::north_up(500000.0, 4650000.0, 30.0, 30.0));
    }

    #[test]
    fn test_transform_from_offset_tiepoint() {
        let t = parse_transform(
            None,
            Some(vec![2.0, 2.0, 0.0]),
            Some(vec![1.0, 1.0, 0.0, 102.0, 198.0, 0.0]),
        )
        .unwrap();
        assert_eq!(t.c, 100.0);
        assert_eq!(t.f, 200.0);
    }

    #[test]
    fn test_transform_matrix_wins() {
        let m = vec![
            1.0, 0.5, 0.0, 10.0, 0.25, -1.0, 0.0, 20.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0,
        ];
        let t = parse_transform(Some(m), Some(vec![9.0, 9.0, 0.0]), None).unwrap();
        assert_eq!(t, AffineTransform::new(1.0, 0.5, 10.0, 0.25, -1.0, 20.0));
    }

    #[test]
    fn test_missing_georeference() {
        let err = parse_transform(None, Some(vec![1.0, 1.0, 0.0]), None).unwrap_err();
        assert!(matches!(err, StoreError::MissingGeoreference(_)));
    }

    #[test]
    fn test_geokeys_roundtrip() {
        for code in [32633u32, 4326, 3857, 32718] {
            let crs = Crs::epsg(code);
            let keys = geokey_directory(&crs).unwrap();
            assert_eq!(parse_geokeys(&keys), crs);
        }
    }

    #[test]
    fn test_geokeys_user_defined_is_unknown() {
        let keys = [1, 1, 0, 1, KEY_PROJECTED_CS_TYPE, 0, 1, USER_DEFINED];
        assert_eq!(parse_geokeys(&keys), Crs::unknown());
        assert!(geokey_directory(&Crs::unknown()).is_none());
    }

    #[test]
    fn test_parse_nodata() {
        assert_eq!(parse_nodata("-9999").unwrap(), -9999.0);
        assert_eq!(parse_nodata("-9999 \0").unwrap(), -9999.0);
        assert!(parse_nodata("nan").unwrap().is_nan());
        assert!(parse_nodata("none").is_err());
    }
}
