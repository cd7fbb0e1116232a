//! Uploaded image to frame

use anyhow::{bail, Context, Result};
use image::{metadata::Orientation, DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use lensley_cv::Frame;
use std::io::Cursor;
use std::path::Path;

/// Formats accepted for inference
const ACCEPTED_FORMATS: [ImageFormat; 2] = [ImageFormat::Jpeg, ImageFormat::Png];

/// Check the payload is a JPEG or PNG and decode it into an upright BGR
/// frame. The EXIF orientation tag, when present, is applied.
pub fn decode_frame(payload: &[u8]) -> Result<Frame> {
    let format = image::guess_format(payload).ok();
    if !format.is_some_and(|f| ACCEPTED_FORMATS.contains(&f)) {
        bail!("expected JPEG or PNG frame, got {:?}", format);
    }

    let mut decoder = ImageReader::new(Cursor::new(payload))
        .with_guessed_format()
        .context("could not decode image")?
        .into_decoder()
        .context("could not decode image")?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let mut img = DynamicImage::from_decoder(decoder).context("could not decode image")?;
    img.apply_orientation(orientation);

    Frame::from_rgb_image(&img.to_rgb8())
}

pub fn load_frame<P: AsRef<Path>>(path: P) -> Result<Frame> {
    let path = path.as_ref();
    let payload = std::fs::read(path).with_context(|| format!("Failed to read image: {:?}", path))?;
    decode_frame(&payload).with_context(|| format!("Rejected image: {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(format: ImageFormat) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(8, 6, image::Rgb([10, 200, 30]));
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, format).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_png_is_decoded() -> Result<()> {
        let frame = decode_frame(&encode(ImageFormat::Png))?;
        assert_eq!((frame.width(), frame.height()), (8, 6));
        Ok(())
    }

    #[test]
    fn test_other_formats_are_rejected() {
        let err = decode_frame(&encode(ImageFormat::Bmp)).unwrap_err();
        assert!(err.to_string().contains("expected JPEG or PNG"));
        assert!(decode_frame(b"plain text").is_err());
    }

    #[test]
    fn test_truncated_png_fails_to_decode() {
        let png = encode(ImageFormat::Png);
        let err = decode_frame(&png[..png.len() / 2]).unwrap_err();
        assert!(err.to_string().contains("could not decode"));
    }

    /// APP1 segment holding a big-endian TIFF block with one Orientation entry.
    fn exif_orientation_segment(orientation: u16) -> Vec<u8> {
        let mut tiff = b"MM\x00\x2a\x00\x00\x00\x08".to_vec();
        tiff.extend_from_slice(&1u16.to_be_bytes());
        tiff.extend_from_slice(&0x0112u16.to_be_bytes());
        tiff.extend_from_slice(&3u16.to_be_bytes());
        tiff.extend_from_slice(&1u32.to_be_bytes());
        tiff.extend_from_slice(&orientation.to_be_bytes());
        tiff.extend_from_slice(&[0, 0]);
        tiff.extend_from_slice(&0u32.to_be_bytes());

        let mut payload = b"Exif\x00\x00".to_vec();
        payload.extend_from_slice(&tiff);
        let mut segment = vec![0xFF, 0xE1];
        segment.extend_from_slice(&(payload.len() as u16 + 2).to_be_bytes());
        segment.extend_from_slice(&payload);
        segment
    }

    #[test]
    fn test_exif_rotation_is_applied() -> Result<()> {
        let jpeg = encode(ImageFormat::Jpeg);
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        let mut rotated = jpeg[..2].to_vec();
        rotated.extend_from_slice(&exif_orientation_segment(6));
        rotated.extend_from_slice(&jpeg[2..]);

        let upright = decode_frame(&jpeg)?;
        assert_eq!((upright.width(), upright.height()), (8, 6));
        let frame = decode_frame(&rotated)?;
        assert_eq!((frame.width(), frame.height()), (6, 8));
        Ok(())
    }
}
