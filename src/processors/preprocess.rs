//! Challenge image to model input tensor.
//!
//! The recognition model consumes a single-channel luminance tensor of shape
//! (1, height, width, 1) with values in [0, 1]. The luminance weights below
//! anchor the trained model's expected input distribution and must not be
//! changed independently of the model.

use crate::core::config::ChallengeSpec;
use crate::core::errors::{CaptchaError, CaptchaResult};
use image::GenericImageView;
use ndarray::Array4;

/// ITU-R 601 luminance weight for the red channel.
const LUMA_R: f32 = 0.299;
/// ITU-R 601 luminance weight for the green channel.
const LUMA_G: f32 = 0.587;
/// ITU-R 601 luminance weight for the blue channel.
const LUMA_B: f32 = 0.114;

/// Decodes raw challenge bytes into the model's input tensor.
///
/// No resizing or cropping is performed: the source image must already have
/// the dimensions the model was trained for, anything else is rejected with
/// [`CaptchaError::InputShape`] before any numeric work happens.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    width: u32,
    height: u32,
}

impl ImagePreprocessor {
    /// Creates a preprocessor for the dimensions in `spec`.
    pub fn new(spec: &ChallengeSpec) -> Self {
        Self {
            width: spec.image_width,
            height: spec.image_height,
        }
    }

    /// Converts raw image bytes into a (1, height, width, 1) luminance
    /// tensor normalized to [0, 1].
    ///
    /// # Errors
    ///
    /// * [`CaptchaError::Decode`] if the bytes are not a supported image.
    /// * [`CaptchaError::InputShape`] if the decoded dimensions differ from
    ///   the configured ones.
    pub fn preprocess(&self, raw: &[u8]) -> CaptchaResult<Array4<f32>> {
        let img = image::load_from_memory(raw).map_err(CaptchaError::Decode)?;

        let (actual_width, actual_height) = img.dimensions();
        if (actual_width, actual_height) != (self.width, self.height) {
            return Err(CaptchaError::InputShape {
                expected_width: self.width,
                expected_height: self.height,
                actual_width,
                actual_height,
            });
        }

        let rgb = img.to_rgb8();
        let mut luma = Vec::with_capacity((self.width * self.height) as usize);
        for pixel in rgb.pixels() {
            let [r, g, b] = pixel.0;
            let r = r as f32 / 255.0;
            let g = g as f32 / 255.0;
            let b = b as f32 / 255.0;
            luma.push(LUMA_R * r + LUMA_G * g + LUMA_B * b);
        }

        let tensor = Array4::from_shape_vec(
            (1, self.height as usize, self.width as usize, 1),
            luma,
        )?;
        tracing::debug!(
            "preprocessed challenge image into {:?} tensor",
            tensor.shape()
        );
        Ok(tensor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes(img: RgbImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn reference_preprocessor() -> ImagePreprocessor {
        ImagePreprocessor::new(&ChallengeSpec::default())
    }

    #[test]
    fn max_red_image_becomes_uniform_red_weight() {
        let img = RgbImage::from_pixel(175, 70, Rgb([255, 0, 0]));
        let tensor = reference_preprocessor().preprocess(&png_bytes(img)).unwrap();

        assert_eq!(tensor.shape(), &[1, 70, 175, 1]);
        for &value in tensor.iter() {
            assert!((value - 0.299).abs() < 1e-6, "got {value}");
        }
    }

    #[test]
    fn white_image_becomes_ones() {
        let img = RgbImage::from_pixel(175, 70, Rgb([255, 255, 255]));
        let tensor = reference_preprocessor().preprocess(&png_bytes(img)).unwrap();
        for &value in tensor.iter() {
            assert!((value - 1.0).abs() < 1e-5, "got {value}");
        }
    }

    #[test]
    fn wrong_dimensions_fail_fast() {
        let img = RgbImage::from_pixel(100, 40, Rgb([0, 0, 0]));
        let err = reference_preprocessor()
            .preprocess(&png_bytes(img))
            .unwrap_err();
        match err {
            CaptchaError::InputShape {
                expected_width: 175,
                expected_height: 70,
                actual_width: 100,
                actual_height: 40,
            } => {}
            other => panic!("expected shape error, got {other:?}"),
        }
    }

    #[test]
    fn junk_bytes_fail_with_decode_error() {
        let err = reference_preprocessor()
            .preprocess(b"definitely not an image")
            .unwrap_err();
        assert!(matches!(err, CaptchaError::Decode(_)));
    }
}
