//! Looping GIF output.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};
use tracing::{debug, info};

use crate::error::RenderError;

/// NeuQuant sampling factor; 10 is the encoder's recommended balance.
const GIF_SPEED: i32 = 10;

/// Stream frames into an infinitely looping GIF at `fps`.
///
/// Frames are encoded in iteration order; the first error stops encoding
/// and is returned. Returns the number of frames written.
pub fn write_gif<I, E>(path: impl AsRef<Path>, fps: u32, frames: I) -> Result<usize, E>
where
    I: IntoIterator<Item = Result<RgbaImage, E>>,
    E: From<RenderError>,
{
    let path = path.as_ref();
    if fps == 0 {
        return Err(RenderError::invalid_setting("fps", "must be at least 1").into());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(RenderError::from)?;
    }
    let file = File::create(path).map_err(RenderError::from)?;
    let mut writer = BufWriter::new(file);
    let delay = Delay::from_numer_denom_ms(1000, fps);

    let mut written = 0usize;
    {
        let mut encoder = GifEncoder::new_with_speed(&mut writer, GIF_SPEED);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(RenderError::from)?;
        for frame in frames {
            encoder
                .encode_frame(Frame::from_parts(frame?, 0, 0, delay))
                .map_err(RenderError::from)?;
            written += 1;
            debug!(frame = written, "Encoded GIF frame");
        }
    }
    writer.flush().map_err(RenderError::from)?;

    if written == 0 {
        return Err(RenderError::Empty("animation has no frames".to_string()).into());
    }
    info!(path = %path.display(), frames = written, fps, "Wrote animation");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::gif::GifDecoder;
    use image::{AnimationDecoder, Rgba};

    #[test]
    fn test_gif_frames_and_delay() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anim.gif");
        let frames = (0..3u8).map(|i| Ok::<_, RenderError>(RgbaImage::from_pixel(4, 4, Rgba([i * 80, 0, 0, 255]))));
        assert_eq!(write_gif(&path, 5, frames).unwrap(), 3);

        let decoder = GifDecoder::new(File::open(&path).unwrap()).unwrap();
        let decoded = decoder.into_frames().collect_frames().unwrap();
        assert_eq!(decoded.len(), 3);
        let (numer, denom) = decoded[0].delay().numer_denom_ms();
        assert_eq!(numer / denom, 200);
    }

    #[test]
    fn test_gif_stops_on_first_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anim.gif");
        let frames = vec![
            Ok(RgbaImage::new(2, 2)),
            Err(RenderError::Png("boom".into())),
            Ok(RgbaImage::new(2, 2)),
        ];
        let err = write_gif(&path, 5, frames).unwrap_err();
        assert!(matches!(err, RenderError::Png(_)));
    }

    #[test]
    fn test_gif_requires_frames() {
        let dir = tempfile::tempdir().unwrap();
        let frames: Vec<Result<RgbaImage, RenderError>> = Vec::new();
        assert!(write_gif(dir.path().join("empty.gif"), 5, frames).is_err());
    }
}
