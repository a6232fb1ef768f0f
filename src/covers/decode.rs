//! Cover decoding using the image crate.
//!
//! Covers are decoded from raw bytes, scaled down to fit a square of the
//! configured size, converted to RGBA and given transparent rounded corners.

use std::io::Cursor;

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, DynamicImage, GenericImageView, ImageFormat, RgbaImage};

use super::CoverError;

/// A decoded cover ready to be uploaded as a texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverImage {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl CoverImage {
    pub fn byte_len(&self) -> usize {
        self.rgba.len()
    }
}

/// Decode image bytes, taking the first frame of animated GIFs.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, CoverError> {
    let format = image::guess_format(bytes).ok();

    if format == Some(ImageFormat::Gif) {
        let decoder = GifDecoder::new(Cursor::new(bytes))?;
        let frame = decoder.into_frames().next().ok_or(CoverError::NoFrames)??;
        return Ok(DynamicImage::ImageRgba8(frame.into_buffer()));
    }

    let image = match format {
        Some(fmt) => image::load_from_memory_with_format(bytes, fmt)?,
        None => image::load_from_memory(bytes)?,
    };
    Ok(image)
}

pub fn decode_cover(bytes: &[u8], size: u32, corner_radius: u32) -> Result<CoverImage, CoverError> {
    let image = decode_image(bytes)?;
    let (width, height) = image.dimensions();
    let image = if width > size || height > size {
        image.thumbnail(size, size)
    } else {
        image
    };

    let mut rgba = image.to_rgba8();
    round_corners(&mut rgba, corner_radius);

    let (width, height) = rgba.dimensions();
    Ok(CoverImage {
        rgba: rgba.into_raw(),
        width,
        height,
    })
}

/// Make everything outside a quarter circle of `radius` in each corner transparent.
///
/// The radius is clamped to half the shorter side; pixels on the arc get
/// partial alpha.
pub fn round_corners(image: &mut RgbaImage, radius: u32) {
    let (width, height) = image.dimensions();
    let radius = radius.min(width / 2).min(height / 2);
    if radius == 0 {
        return;
    }

    let r = radius as f32;
    for y in 0..radius {
        for x in 0..radius {
            let dx = r - (x as f32 + 0.5);
            let dy = r - (y as f32 + 0.5);
            let coverage = (r + 0.5 - (dx * dx + dy * dy).sqrt()).clamp(0.0, 1.0);
            if coverage >= 1.0 {
                continue;
            }
            for (px, py) in [
                (x, y),
                (width - 1 - x, y),
                (x, height - 1 - y),
                (width - 1 - x, height - 1 - y),
            ] {
                let pixel = image.get_pixel_mut(px, py);
                pixel[3] = (pixel[3] as f32 * coverage).round() as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn encode(image: RgbaImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(image)
            .write_to(&mut Cursor::new(&mut bytes), format)
            .unwrap();
        bytes
    }

    fn solid(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([200, 40, 90, 255]))
    }

    #[test]
    fn test_round_corners_clears_corners_only() {
        let mut image = solid(64, 64);
        round_corners(&mut image, 16);

        for (x, y) in [(0, 0), (63, 0), (0, 63), (63, 63)] {
            assert_eq!(image.get_pixel(x, y)[3], 0, "corner ({x}, {y})");
        }
        for (x, y) in [(32, 32), (32, 0), (0, 32), (16, 16), (63, 32)] {
            assert_eq!(image.get_pixel(x, y)[3], 255, "inside ({x}, {y})");
        }
        assert_eq!(image.get_pixel(0, 0).0[..3], [200, 40, 90]);
    }

    #[test]
    fn test_round_corners_zero_radius_is_noop() {
        let mut image = solid(8, 8);
        round_corners(&mut image, 0);
        assert_eq!(image, solid(8, 8));
    }

    #[test]
    fn test_round_corners_clamps_radius() {
        let mut image = solid(10, 4);
        round_corners(&mut image, 100);
        assert!(image.get_pixel(0, 0)[3] < 255);
        assert!(image.get_pixel(9, 3)[3] < 255);
        assert_eq!(image.get_pixel(5, 2)[3], 255);
    }

    #[test]
    fn test_decode_cover_scales_down_preserving_aspect() {
        let bytes = encode(solid(400, 200), ImageFormat::Png);
        let cover = decode_cover(&bytes, 100, 0).unwrap();
        assert_eq!((cover.width, cover.height), (100, 50));
        assert_eq!(cover.byte_len(), 100 * 50 * 4);
    }

    #[test]
    fn test_decode_cover_keeps_small_images() {
        let bytes = encode(solid(40, 30), ImageFormat::Png);
        let cover = decode_cover(&bytes, 256, 8).unwrap();
        assert_eq!((cover.width, cover.height), (40, 30));
        assert_eq!(cover.rgba[3], 0);
    }

    #[test]
    fn test_decode_gif_first_frame() {
        let bytes = encode(solid(12, 12), ImageFormat::Gif);
        let image = decode_image(&bytes).unwrap();
        assert_eq!(image.dimensions(), (12, 12));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = decode_cover(b"<html>not found</html>", 64, 0).unwrap_err();
        assert!(matches!(err, CoverError::Decode(_)));
    }
}
