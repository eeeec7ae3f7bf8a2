//! The encoded visitor photo.
//!
//! Photos travel as `data:image/png;base64,...` strings: that is what the
//! store persists and what the pass embeds.

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use image::{codecs::png::PngEncoder, ExtendedColorType, ImageEncoder, RgbaImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const PNG_PREFIX: &str = "data:image/png;base64,";

/// Errors produced while encoding or decoding a photo.
#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("photo is not a base64 image data URL")]
    NotDataUrl,
    #[error("photo payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("photo could not be encoded or decoded: {0}")]
    Image(#[from] image::ImageError),
    #[error("photo has zero area")]
    Empty,
}

/// An immutable, encoded still image of a visitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VisitorPhoto(String);

impl VisitorPhoto {
    /// Encodes a bitmap as a PNG data URL.
    pub fn from_image(image: &RgbaImage) -> Result<Self, PhotoError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(PhotoError::Empty);
        }
        let mut png = Vec::new();
        PngEncoder::new(&mut png).write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )?;
        Ok(Self(format!("{PNG_PREFIX}{}", BASE64_STANDARD.encode(&png))))
    }

    /// Wraps an existing data URL, e.g. one returned by a search.
    pub fn from_data_url(url: impl Into<String>) -> Result<Self, PhotoError> {
        let url = url.into();
        if !url.starts_with("data:image/") || !url.contains(";base64,") {
            return Err(PhotoError::NotDataUrl);
        }
        Ok(Self(url))
    }

    /// Decodes the photo back into a bitmap.
    pub fn decode(&self) -> Result<RgbaImage, PhotoError> {
        let (_, payload) = self.0.split_once(";base64,").ok_or(PhotoError::NotDataUrl)?;
        let bytes = BASE64_STANDARD.decode(payload)?;
        Ok(image::load_from_memory(&bytes)?.to_rgba8())
    }

    /// The data URL.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the photo, returning the data URL.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for VisitorPhoto {
    type Error = PhotoError;

    fn try_from(url: String) -> Result<Self, Self::Error> {
        Self::from_data_url(url)
    }
}

impl From<VisitorPhoto> for String {
    fn from(photo: VisitorPhoto) -> Self {
        photo.0
    }
}

impl AsRef<str> for VisitorPhoto {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_is_png_data_url() {
        let image = RgbaImage::from_pixel(3, 2, image::Rgba([9, 8, 7, 255]));
        let photo = VisitorPhoto::from_image(&image).unwrap();

        assert!(photo.as_str().starts_with("data:image/png;base64,"));
        let decoded = photo.decode().unwrap();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(2, 1).0, [9, 8, 7, 255]);
    }

    #[test]
    fn test_rejects_plain_strings() {
        assert!(matches!(
            VisitorPhoto::from_data_url("hello"),
            Err(PhotoError::NotDataUrl)
        ));
        assert!(VisitorPhoto::from_data_url("data:image/png;base64,AAAA").is_ok());
    }

    #[test]
    fn test_rejects_empty_bitmap() {
        let image = RgbaImage::new(0, 0);
        assert!(matches!(
            VisitorPhoto::from_image(&image),
            Err(PhotoError::Empty)
        ));
    }

    #[test]
    fn test_deserialize_checks_data_url() {
        let photo: VisitorPhoto = serde_json::from_str("\"data:image/png;base64,AAAA\"").unwrap();
        assert_eq!(serde_json::to_string(&photo).unwrap(), "\"data:image/png;base64,AAAA\"");
        assert!(serde_json::from_str::<VisitorPhoto>("\"not a photo\"").is_err());
    }
}
