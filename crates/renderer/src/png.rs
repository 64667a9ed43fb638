//! PNG encoding for RGBA frame buffers.
//!
//! Frames are written as 8-bit RGBA (color type 6) with the "none" scanline
//! filter. Compression level is configurable because static maps favour
//! size while animation previews favour speed.

use std::fs;
use std::io::Write;
use std::path::Path;

use flate2::Compression;
use tracing::debug;

use crate::error::{RenderError, RenderResult};

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Encode RGBA pixel data (4 bytes per pixel) as a PNG byte stream.
pub fn create_png(pixels: &[u8], width: usize, height: usize) -> RenderResult<Vec<u8>> {
    create_png_with(pixels, width, height, Compression::default())
}

pub fn create_png_with(
    pixels: &[u8],
    width: usize,
    height: usize,
    level: Compression,
) -> RenderResult<Vec<u8>> {
    if width == 0 || height == 0 {
        return Err(RenderError::Png(format!(
            "image dimensions must be non-zero, got {}x{}",
            width, height
        )));
    }
    if pixels.len() != width * height * 4 {
        return Err(RenderError::Png(format!(
            "expected {} RGBA bytes for {}x{}, got {}",
            width * height * 4,
            width,
            height,
            pixels.len()
        )));
    }

    let mut png = Vec::with_capacity(pixels.len() / 4);
    png.extend_from_slice(&PNG_SIGNATURE);

    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&(width as u32).to_be_bytes());
    ihdr.extend_from_slice(&(height as u32).to_be_bytes());
    ihdr.push(8); // bit depth
    ihdr.push(6); // color type (RGBA)
    ihdr.push(0); // compression method
    ihdr.push(0); // filter method
    ihdr.push(0); // interlace method
    write_chunk(&mut png, b"IHDR", &ihdr);

    let idat = deflate_idat_rgba(pixels, width, height, level)?;
    write_chunk(&mut png, b"IDAT", &idat);

    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

/// Encode and write a PNG file, creating parent directories.
pub fn save_png(path: impl AsRef<Path>, pixels: &[u8], width: usize, height: usize) -> RenderResult<()> {
    let path = path.as_ref();
    let bytes = create_png(pixels, width, height)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, &bytes)?;
    debug!(path = %path.display(), bytes = bytes.len(), width, height, "Wrote PNG");
    Ok(())
}

fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

fn deflate_idat_rgba(
    pixels: &[u8],
    width: usize,
    height: usize,
    level: Compression,
) -> RenderResult<Vec<u8>> {
    let stride = width * 4;
    let mut uncompressed = Vec::with_capacity(height * (1 + stride));
    for row in pixels.chunks_exact(stride) {
        uncompressed.push(0); // filter type: none
        uncompressed.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), level);
    encoder.write_all(&uncompressed)?;
    Ok(encoder.finish()?)
}
