//! Georeferenced RGB imagery used as a map background.

use std::path::Path;

use image::RgbImage;
use tiff::decoder::DecodingResult;
use tracing::info;

use flood_common::{AffineTransform, BoundingBox, Crs, FloodResult};

use crate::error::{StoreError, StoreResult};
use crate::geotiff::{open_decoder, read_georeference};

/// An 8-bit RGB raster with its own transform and CRS.
#[derive(Debug, Clone)]
pub struct Imagery {
    pub image: RgbImage,
    pub transform: AffineTransform,
    pub crs: Crs,
}

impl Imagery {
    pub fn bounds(&self) -> BoundingBox {
        self.transform
            .bounds(self.image.width() as usize, self.image.height() as usize)
    }
}

fn to_rgb(samples: Vec<u8>, width: u32, height: u32) -> StoreResult<RgbImage> {
    let pixels = width as usize * height as usize;
    if pixels == 0 || samples.len() % pixels != 0 {
        return Err(StoreError::InvalidMetadata(format!(
            "{} samples do not fill a {}x{} image",
            samples.len(),
            width,
            height
        )));
    }
    let rgb: Vec<u8> = match samples.len() / pixels {
        1 => samples.iter().flat_map(|g| [*g, *g, *g]).collect(),
        2 => samples.chunks_exact(2).flat_map(|ga| [ga[0], ga[0], ga[0]]).collect(),
        3 => samples,
        n => samples
            .chunks_exact(n)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect(),
    };
    RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| StoreError::InvalidMetadata("RGB buffer size mismatch".to_string()))
}

fn read(path: &Path) -> StoreResult<Imagery> {
    let mut decoder = open_decoder(path)?;
    let (transform, crs, _) = read_georeference(&mut decoder)?;
    let (width, height) = decoder.dimensions()?;
    let samples = match decoder.read_image()? {
        DecodingResult::U8(v) => v,
        // Keep the high byte of 16-bit imagery
        DecodingResult::U16(v) => v.into_iter().map(|x| (x >> 8) as u8).collect(),
        _ => {
            return Err(StoreError::UnsupportedFormat(
                "imagery must be 8- or 16-bit unsigned".to_string(),
            ))
        }
    };
    Ok(Imagery {
        image: to_rgb(samples, width, height)?,
        transform,
        crs,
    })
}

/// Load gray, RGB or RGBA GeoTIFF imagery as RGB.
pub fn read_imagery(path: impl AsRef<Path>) -> FloodResult<Imagery> {
    let path = path.as_ref();
    let imagery = read(path).map_err(|e| e.into_input(path))?;
    info!(
        path = %path.display(),
        width = imagery.image.width(),
        height = imagery.image.height(),
        crs = %imagery.crs,
        "Loaded background imagery"
    );
    Ok(imagery)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gray_expands_to_rgb() {
        let img = to_rgb(vec![10, 20], 2, 1).unwrap();
        assert_eq!(img.get_pixel(1, 0).0, [20, 20, 20]);
    }

    #[test]
    fn test_rgba_drops_alpha() {
        let img = to_rgb(vec![1, 2, 3, 255, 4, 5, 6, 0], 2, 1).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [1, 2, 3]);
        assert_eq!(img.get_pixel(1, 0).0, [4, 5, 6]);
    }

    #[test]
    fn test_short_buffer_rejected() {
        assert!(to_rgb(vec![1, 2, 3], 2, 2).is_err());
    }
}
