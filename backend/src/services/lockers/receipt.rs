//! Proof-of-payment images attached to a locker registration.
//!
//! Uploads are gated by declared content type and size, then decoded, shrunk
//! to fit `max_dimension` and re-encoded as JPEG at a fixed quality before
//! they reach the database. Encoding is CPU bound and runs on the blocking
//! pool; the request waits for it.

use crate::error::ApiError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{load_from_memory, DynamicImage, GenericImageView, ImageError};
use log::debug;

/// Content types accepted for a receipt upload.
pub const ALLOWED_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Placeholder returned instead of the stored bytes after a registration.
pub const RECEIPT_MARKER: &str = "comprobante-cargado";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptPolicy {
    pub max_dimension: u32,
    pub quality: u8,
    pub max_bytes: usize,
}

impl Default for ReceiptPolicy {
    fn default() -> Self {
        Self {
            max_dimension: 800,
            quality: 50,
            max_bytes: 5 * 1024 * 1024,
        }
    }
}

/// A receipt file as received from the client, before any processing.
#[derive(Debug, Clone)]
pub struct ReceiptUpload {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub fn check_content_type(content_type: &str) -> Result<(), ApiError> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if ALLOWED_TYPES.contains(&essence.as_str()) {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "Formato de imagen no permitido. Los tipos permitidos son: {}",
            ALLOWED_TYPES
                .iter()
                .map(|t| t.trim_start_matches("image/"))
                .collect::<Vec<_>>()
                .join(", ")
        )))
    }
}

/// Validates and re-encodes an upload. Blocking.
pub fn encode(upload: &ReceiptUpload, policy: &ReceiptPolicy) -> Result<Vec<u8>, ApiError> {
    check_content_type(&upload.content_type)?;
    if upload.bytes.is_empty() {
        return Err(ApiError::Validation("El comprobante está vacío".to_string()));
    }
    if upload.bytes.len() > policy.max_bytes {
        return Err(ApiError::Validation(format!(
            "El comprobante excede el tamaño máximo de {} bytes",
            policy.max_bytes
        )));
    }

    let img = load_from_memory(&upload.bytes)?;
    let (w, h) = img.dimensions();
    let img = if w > policy.max_dimension || h > policy.max_dimension {
        img.resize(policy.max_dimension, policy.max_dimension, FilterType::Lanczos3)
    } else {
        img
    };

    // JPEG has no alpha channel: flatten over white first.
    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();
    let mut background = image::RgbaImage::from_pixel(w, h, image::Rgba([255, 255, 255, 255]));
    image::imageops::overlay(&mut background, &rgba, 0, 0);
    let rgb = DynamicImage::ImageRgba8(background).to_rgb8();

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, policy.quality)
        .encode_image(&rgb)
        .map_err(encoding_failure)?;
    debug!(
        "Receipt compressed from {} to {} bytes ({}x{})",
        upload.bytes.len(),
        out.len(),
        w,
        h
    );
    Ok(out)
}

/// A decoded image we cannot write back out is our fault, not the client's.
fn encoding_failure(e: ImageError) -> ApiError {
    ApiError::Internal(format!("receipt encoding failed: {}", e))
}

/// [`encode`] on the blocking pool.
pub async fn encode_on_pool(
    upload: ReceiptUpload,
    policy: ReceiptPolicy,
) -> Result<Vec<u8>, ApiError> {
    tokio::task::spawn_blocking(move || encode(&upload, &policy)).await?
}

/// Renders stored receipt bytes as a `data:` URI for listings.
pub fn data_uri(bytes: &[u8]) -> String {
    let mime = image::guess_format(bytes)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream");
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}
