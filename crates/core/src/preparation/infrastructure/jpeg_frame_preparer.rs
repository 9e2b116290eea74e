use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader};

use crate::preparation::domain::frame_preparer::{FramePreparer, PreparationError};
use crate::shared::constants::DEFAULT_JPEG_QUALITY;
use crate::shared::dimensions::ImageDimensions;
use crate::shared::frame::{CapturedPhoto, PreparedFrame};

/// Decodes a captured photo with the `image` crate, downsizes it to the
/// target width and re-encodes it as JPEG.
///
/// EXIF orientation is applied before measuring, so the reported dimensions
/// are the ones the detection service sees after decoding. Photos already
/// narrower than the target are re-encoded at their own size.
pub struct JpegFramePreparer {
    quality: u8,
}

impl JpegFramePreparer {
    pub fn new(quality: u8) -> Result<Self, &'static str> {
        if !(1..=100).contains(&quality) {
            return Err("JPEG quality must be between 1 and 100");
        }
        Ok(Self { quality })
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl Default for JpegFramePreparer {
    fn default() -> Self {
        Self {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

fn decode_oriented(data: &[u8]) -> Result<DynamicImage, PreparationError> {
    let mut decoder = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| PreparationError::Decode(Box::new(e)))?
        .into_decoder()
        .map_err(|e| PreparationError::Decode(Box::new(e)))?;
    let orientation = decoder
        .orientation()
        .unwrap_or(Orientation::NoTransforms);
    let mut img =
        DynamicImage::from_decoder(decoder).map_err(|e| PreparationError::Decode(Box::new(e)))?;
    img.apply_orientation(orientation);
    Ok(img)
}

impl FramePreparer for JpegFramePreparer {
    fn prepare(
        &self,
        photo: &CapturedPhoto,
        target_width: u32,
    ) -> Result<PreparedFrame, PreparationError> {
        if target_width == 0 {
            return Err(PreparationError::InvalidTargetWidth);
        }
        if photo.is_empty() {
            return Err(PreparationError::EmptyCapture);
        }

        let img = decode_oriented(photo.data())?;
        let original = ImageDimensions::new(img.width(), img.height());
        if !original.is_measured() {
            return Err(PreparationError::Decode("photo has no pixels".into()));
        }

        let img = if original.width > target_width {
            let height = original.height_for_width(target_width);
            img.resize_exact(target_width, height, FilterType::Triangle)
        } else {
            img
        };

        // JPEG has no alpha channel
        let rgb = img.to_rgb8();
        let dimensions = ImageDimensions::new(rgb.width(), rgb.height());

        let mut jpeg = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, self.quality);
        encoder
            .encode_image(&rgb)
            .map_err(|e| PreparationError::Encode(Box::new(e)))?;

        log::debug!(
            "Prepared photo #{}: {original} -> {dimensions}, {} bytes at quality {}",
            photo.index(),
            jpeg.len(),
            self.quality
        );
        Ok(PreparedFrame::new(jpeg, dimensions))
    }
}
