//! Photo normalisation before it is sent to the model.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use std::io::Cursor;
use thiserror::Error;

/// JPEG quality used for every re-encoded photo.
pub const JPEG_QUALITY: u8 = 75;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image could not be decoded: {0}")]
    Decode(#[source] image::ImageError),

    #[error("image could not be re-encoded: {0}")]
    Encode(#[source] image::ImageError),
}

/// A photo re-encoded as base64 JPEG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPhoto {
    pub base64: String,
}

impl EncodedPhoto {
    /// `data:` URL suitable for an image content part.
    pub fn data_url(&self) -> String {
        format!("data:image/jpeg;base64,{}", self.base64)
    }
}

/// Decode any supported image format and re-encode it as RGB JPEG.
///
/// Alpha is dropped, since JPEG cannot carry it.
pub fn normalize_photo(bytes: &[u8]) -> Result<EncodedPhoto, ImageError> {
    let decoded = image::load_from_memory(bytes).map_err(ImageError::Decode)?;
    let rgb = decoded.to_rgb8();

    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY);
    rgb.write_with_encoder(encoder).map_err(ImageError::Encode)?;

    Ok(EncodedPhoto {
        base64: BASE64.encode(buffer.into_inner()),
    })
}
