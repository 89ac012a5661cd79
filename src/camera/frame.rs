//! Decoded camera frames

use chrono::{DateTime, Utc};
use image::RgbImage;

/// One decoded RGB image captured from a stream
///
/// Owned by the pipeline run that fetched it and dropped once detection is done.
#[derive(Debug, Clone)]
pub struct Frame {
    image: RgbImage,
    captured_at: DateTime<Utc>,
}

impl Frame {
    /// Wrap a decoded image captured now
    #[must_use]
    pub fn new(image: RgbImage) -> Self {
        Self::captured(image, Utc::now())
    }

    /// Wrap a decoded image with an explicit capture time
    #[must_use]
    pub const fn captured(image: RgbImage, captured_at: DateTime<Utc>) -> Self {
        Self { image, captured_at }
    }

    /// Decode an encoded image (JPEG, PNG)
    ///
    /// # Errors
    ///
    /// Returns error if the bytes are not a supported image
    pub fn decode(bytes: &[u8]) -> crate::Result<Self> {
        let image = image::load_from_memory(bytes)?.to_rgb8();
        Ok(Self::new(image))
    }

    /// Frame width in pixels
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Frame height in pixels
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Pixel buffer
    #[must_use]
    pub const fn image(&self) -> &RgbImage {
        &self.image
    }

    /// When the frame was captured
    #[must_use]
    pub const fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgb};

    use super::*;

    #[test]
    fn decodes_jpeg() {
        let img = RgbImage::from_pixel(32, 16, Rgb([200, 10, 10]));
        let mut jpeg = Cursor::new(Vec::new());
        img.write_to(&mut jpeg, ImageFormat::Jpeg).unwrap();

        let frame = Frame::decode(jpeg.get_ref()).unwrap();
        assert_eq!(frame.width(), 32);
        assert_eq!(frame.height(), 16);
    }

    #[test]
    fn rejects_garbage() {
        assert!(Frame::decode(b"definitely not an image").is_err());
    }
}
