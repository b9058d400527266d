//! Image pipeline
//!
//! The Canon Ivy 2 has a fixed print geometry: the source is fitted
//! (or cropped) into a 1280x1920 canvas, resampled to 640x1616,
//! rotated 180 degrees and re-encoded as JPEG. The Kodak family takes
//! the caller's JPEG verbatim after validation.

use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use tracing::debug;

use zinkprint_core::constants::KODAK_MAX_IMAGE_BYTES;

use crate::error::{Error, Result};

/// Intermediate canvas width
pub const CANVAS_WIDTH: u32 = 1280;

/// Intermediate canvas height
pub const CANVAS_HEIGHT: u32 = 1920;

/// Final print width for the Canon Ivy 2
pub const PRINT_WIDTH: u32 = 640;

/// Final print height for the Canon Ivy 2
pub const PRINT_HEIGHT: u32 = 1616;

const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];

/// Prepare an image for the Canon Ivy 2
///
/// `auto_crop` scales to fill the frame (cropping edges); otherwise
/// the image is fitted with letterboxing. The output length feeds the
/// 32-bit `PrintReady` size field.
pub fn prepare_canon(data: &[u8], auto_crop: bool, quality: u8) -> Result<Bytes> {
    let source = image::load_from_memory(data)
        .map_err(|e| Error::InvalidImage(format!("decode failed: {e}")))?
        .to_rgb8();
    let (width, height) = source.dimensions();

    let scale = if auto_crop {
        f64::max(
            f64::from(CANVAS_WIDTH) / f64::from(width),
            f64::from(CANVAS_HEIGHT) / f64::from(height),
        )
    } else {
        f64::min(
            f64::from(CANVAS_WIDTH) / f64::from(width),
            f64::from(CANVAS_HEIGHT) / f64::from(height),
        )
    };

    let scaled_width = ((f64::from(width) * scale) as u32).max(1);
    let scaled_height = ((f64::from(height) * scale) as u32).max(1);

    let scaled = if (scaled_width, scaled_height) != (width, height) {
        image::imageops::resize(&source, scaled_width, scaled_height, FilterType::Lanczos3)
    } else {
        source
    };

    let mut canvas = RgbImage::new(CANVAS_WIDTH, CANVAS_HEIGHT);
    let x = (i64::from(CANVAS_WIDTH) - i64::from(scaled_width)) / 2;
    let y = (i64::from(CANVAS_HEIGHT) - i64::from(scaled_height)) / 2;
    image::imageops::replace(&mut canvas, &scaled, x, y);

    let print = DynamicImage::ImageRgb8(canvas)
        .resize_exact(PRINT_WIDTH, PRINT_HEIGHT, FilterType::Lanczos3)
        .rotate180()
        .into_rgb8();

    let mut jpeg = Vec::new();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, quality);
    encoder
        .encode_image(&print)
        .map_err(|e| Error::InvalidImage(format!("encode failed: {e}")))?;

    debug!(
        source_width = width,
        source_height = height,
        auto_crop,
        len = jpeg.len(),
        "Prepared print image"
    );

    Ok(Bytes::from(jpeg))
}

/// Validate a Kodak print payload
///
/// The Step family accepts raw JPEG data with no transformation; the
/// buffer must carry the SOI/EOI markers and stay within 2 MiB.
pub fn validate_kodak_jpeg(data: &[u8]) -> Result<()> {
    if data.len() < 4 || data[..2] != JPEG_SOI || data[data.len() - 2..] != JPEG_EOI {
        return Err(Error::InvalidImage(
            "not a JPEG (missing SOI/EOI markers)".into(),
        ));
    }

    if data.len() > KODAK_MAX_IMAGE_BYTES {
        return Err(Error::InvalidImage(format!(
            "JPEG is {} bytes, limit is {KODAK_MAX_IMAGE_BYTES}",
            data.len()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb};

    fn png_bytes(img: &RgbImage) -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img.clone())
            .write_to(
                &mut std::io::Cursor::new(&mut buf),
                image::ImageOutputFormat::Png,
            )
            .unwrap();
        buf
    }

    fn pixel(data: &[u8], x: u32, y: u32) -> Rgb<u8> {
        let img = image::load_from_memory(data).unwrap();
        img.to_rgb8().get_pixel(x, y).to_owned()
    }

    #[test]
    fn test_prepare_outputs_print_geometry() {
        let source = RgbImage::from_pixel(100, 100, Rgb([200, 120, 40]));
        let jpeg = prepare_canon(&png_bytes(&source), true, 100).unwrap();

        assert_eq!(&jpeg[..2], &JPEG_SOI);
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (PRINT_WIDTH, PRINT_HEIGHT));
    }

    #[test]
    fn test_prepare_rotates_180() {
        // Red top half, blue bottom half; after rotation the top is blue
        let mut source = RgbImage::from_pixel(100, 100, Rgb([230, 10, 10]));
        for y in 50..100 {
            for x in 0..100 {
                source.put_pixel(x, y, Rgb([10, 10, 230]));
            }
        }

        let jpeg = prepare_canon(&png_bytes(&source), true, 100).unwrap();

        let top = pixel(&jpeg, PRINT_WIDTH / 2, 40);
        let bottom = pixel(&jpeg, PRINT_WIDTH / 2, PRINT_HEIGHT - 40);

        assert!(top[2] > 150 && top[0] < 100, "top should be blue: {top:?}");
        assert!(
            bottom[0] > 150 && bottom[2] < 100,
            "bottom should be red: {bottom:?}"
        );
    }

    #[test]
    fn test_prepare_letterboxes_without_auto_crop() {
        // A wide white strip fitted into the portrait frame leaves
        // black bars; filling the frame does not
        let source = RgbImage::from_pixel(200, 50, Rgb([255, 255, 255]));
        let bytes = png_bytes(&source);

        let fitted = prepare_canon(&bytes, false, 100).unwrap();
        let bar = pixel(&fitted, PRINT_WIDTH / 2, 10);
        assert!(bar[0] < 40, "expected letterbox bar, got {bar:?}");

        let filled = prepare_canon(&bytes, true, 100).unwrap();
        let center = pixel(&filled, PRINT_WIDTH / 2, 10);
        assert!(center[0] > 200, "expected cropped fill, got {center:?}");
    }

    #[test]
    fn test_prepare_rejects_garbage() {
        let result = prepare_canon(b"not an image", true, 100);
        assert!(matches!(result, Err(Error::InvalidImage(_))));
    }

    #[test]
    fn test_validate_accepts_jpeg() {
        let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
        data.extend_from_slice(&[0u8; 100]);
        data.extend_from_slice(&[0xFF, 0xD9]);
        assert!(validate_kodak_jpeg(&data).is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_markers() {
        assert!(validate_kodak_jpeg(b"").is_err());
        assert!(validate_kodak_jpeg(&[0xFF, 0xD8, 0x00, 0x00]).is_err());
        assert!(validate_kodak_jpeg(&[0x00, 0x00, 0xFF, 0xD9]).is_err());
    }

    #[test]
    fn test_validate_rejects_oversized() {
        let mut data = vec![0u8; KODAK_MAX_IMAGE_BYTES + 2];
        data[..2].copy_from_slice(&JPEG_SOI);
        let len = data.len();
        data[len - 2..].copy_from_slice(&JPEG_EOI);

        let result = validate_kodak_jpeg(&data);
        assert!(matches!(result, Err(Error::InvalidImage(_))));
    }

    #[test]
    fn test_validate_boundary_size() {
        let mut data = vec![0u8; KODAK_MAX_IMAGE_BYTES];
        data[..2].copy_from_slice(&JPEG_SOI);
        let len = data.len();
        data[len - 2..].copy_from_slice(&JPEG_EOI);

        assert!(validate_kodak_jpeg(&data).is_ok());
    }
}
