//! Image cropping
//!
//! Admin surfaces let an operator drag a crop box over a scaled-down
//! preview; the selection arrives in preview coordinates and must be
//! mapped onto the full-resolution source before cropping. Output is
//! always JPEG, re-encoded at a quality high enough to survive a second
//! downstream compression.

use image::codecs::jpeg::JpegEncoder;
use thiserror::Error;

/// JPEG quality for crop output
pub const CROP_JPEG_QUALITY: u8 = 95;

/// Crop selection in preview (displayed) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Size the source was displayed at when the selection was made.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Error)]
pub enum CropError {
    #[error("Failed to decode image: {0}")]
    Decode(image::ImageError),

    #[error("Failed to encode image: {0}")]
    Encode(image::ImageError),

    /// The selection maps to zero source pixels
    #[error("Crop region is empty")]
    EmptyRegion,

    /// Displayed dimensions must be positive to derive a scale
    #[error("Viewport has no area")]
    EmptyViewport,
}

/// Crop `bytes` to `region` and re-encode as JPEG.
///
/// `region` is given in the coordinate space of `displayed`; it is scaled
/// to the source's natural resolution, rounded to whole pixels and clamped
/// to the source bounds before cropping.
pub fn crop_to_jpeg(
    bytes: &[u8],
    region: CropRegion,
    displayed: Viewport,
) -> Result<Vec<u8>, CropError> {
    if displayed.width <= 0.0 || displayed.height <= 0.0 {
        return Err(CropError::EmptyViewport);
    }

    let source = image::load_from_memory(bytes).map_err(CropError::Decode)?;
    let (natural_w, natural_h) = (source.width(), source.height());

    let scale_x = f64::from(natural_w) / displayed.width;
    let scale_y = f64::from(natural_h) / displayed.height;

    let x = scale_clamped(region.x, scale_x, natural_w);
    let y = scale_clamped(region.y, scale_y, natural_h);
    let w = scale_clamped(region.width, scale_x, natural_w - x);
    let h = scale_clamped(region.height, scale_y, natural_h - y);
    if w == 0 || h == 0 {
        return Err(CropError::EmptyRegion);
    }

    let cropped = source.crop_imm(x, y, w, h).to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, CROP_JPEG_QUALITY)
        .encode_image(&cropped)
        .map_err(CropError::Encode)?;
    Ok(out)
}

fn scale_clamped(value: f64, scale: f64, max: u32) -> u32 {
    let scaled = (value * scale).round();
    if scaled <= 0.0 {
        0
    } else {
        (scaled as u32).min(max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};
    use std::io::Cursor;

    fn split_image() -> Vec<u8> {
        // 100x50, left half red, right half blue
        let mut img = RgbImage::new(100, 50);
        for (x, _, pixel) in img.enumerate_pixels_mut() {
            *pixel = if x < 50 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 255])
            };
        }
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn scales_preview_selection_to_natural_pixels() {
        let bytes = split_image();
        // Preview shown at 2x; select the right half in preview coordinates
        let out = crop_to_jpeg(
            &bytes,
            CropRegion {
                x: 100.0,
                y: 0.0,
                width: 100.0,
                height: 100.0,
            },
            Viewport {
                width: 200.0,
                height: 100.0,
            },
        )
        .unwrap();

        let cropped = image::load_from_memory(&out).unwrap().to_rgb8();
        assert_eq!(cropped.dimensions(), (50, 50));
        // JPEG is lossy; check the hue, not exact values
        let center = cropped.get_pixel(25, 25);
        assert!(center[2] > 200 && center[0] < 60, "expected blue, got {center:?}");
    }

    #[test]
    fn region_is_clamped_to_source_bounds() {
        let bytes = split_image();
        let out = crop_to_jpeg(
            &bytes,
            CropRegion {
                x: 80.0,
                y: 40.0,
                width: 500.0,
                height: 500.0,
            },
            Viewport {
                width: 100.0,
                height: 50.0,
            },
        )
        .unwrap();
        let cropped = image::load_from_memory(&out).unwrap();
        assert_eq!((cropped.width(), cropped.height()), (20, 10));
    }

    #[test]
    fn empty_selection_is_rejected() {
        let bytes = split_image();
        let result = crop_to_jpeg(
            &bytes,
            CropRegion {
                x: 10.0,
                y: 10.0,
                width: 0.0,
                height: 20.0,
            },
            Viewport {
                width: 100.0,
                height: 50.0,
            },
        );
        assert!(matches!(result, Err(CropError::EmptyRegion)));
    }

    #[test]
    fn zero_viewport_is_rejected() {
        let result = crop_to_jpeg(
            &[],
            CropRegion {
                x: 0.0,
                y: 0.0,
                width: 10.0,
                height: 10.0,
            },
            Viewport {
                width: 0.0,
                height: 100.0,
            },
        );
        assert!(matches!(result, Err(CropError::EmptyViewport)));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let result = crop_to_jpeg(
            b"not an image",
            CropRegion {
                x: 0.0,
                y: 0.0,
                width: 10.0,
                height: 10.0,
            },
            Viewport {
                width: 10.0,
                height: 10.0,
            },
        );
        assert!(matches!(result, Err(CropError::Decode(_))));
    }
}
