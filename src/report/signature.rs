//! Signature data URLs to embeddable images

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{codecs::jpeg::JpegEncoder, ColorType, RgbImage};
use thiserror::Error;

const JPEG_QUALITY: u8 = 85;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("empty payload")]
    Empty,
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("unreadable image: {0}")]
    Image(#[from] image::ImageError),
}

/// A decoded signature, re-encoded as baseline JPEG for a `DCTDecode` stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureImage {
    pub width: u32,
    pub height: u32,
    pub jpeg: Vec<u8>,
}

/// The base64 part of a `data:<mime>;base64,<payload>` URL. Bare payloads
/// are returned as they are.
pub fn payload(data_url: &str) -> &str {
    let trimmed = data_url.trim();
    match trimmed.find(";base64,") {
        Some(at) if trimmed.starts_with("data:") => &trimmed[at + ";base64,".len()..],
        _ => trimmed,
    }
}

/// Decode a signature. `None` means the cell is drawn without an image.
pub fn decode(data_url: &str) -> Option<SignatureImage> {
    match try_decode(data_url) {
        Ok(image) => Some(image),
        Err(e) => {
            tracing::debug!("Ignoring unreadable signature: {}", e);
            None
        }
    }
}

pub fn try_decode(data_url: &str) -> Result<SignatureImage, SignatureError> {
    let cleaned: String = payload(data_url)
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Err(SignatureError::Empty);
    }

    let bytes = STANDARD.decode(cleaned)?;
    let decoded = image::load_from_memory(&bytes)?;
    let rgb = flatten_on_white(&decoded);
    let (width, height) = rgb.dimensions();

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY).encode(
        rgb.as_raw(),
        width,
        height,
        ColorType::Rgb8,
    )?;

    Ok(SignatureImage {
        width,
        height,
        jpeg,
    })
}

/// Canvas exports are transparent PNGs; composite them on white paper
fn flatten_on_white(decoded: &image::DynamicImage) -> RgbImage {
    let rgba = decoded.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = u16::from(a);
        let blend = |c: u8| ((u16::from(c) * alpha + 255 * (255 - alpha)) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}
