//! Image loading, validation, and data-URL encoding for the recognition API.
//!
//! Images are sent as `data:<mime>;base64,<payload>` strings. The original
//! bytes pass through untouched unless a maximum dimension is configured,
//! in which case oversized images are downscaled and re-encoded as JPEG.

use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use image::{DynamicImage, ImageFormat};
use serde::{Serialize, Serializer};
use tracing::info;

use crate::error::GuesserError;

/// Limits applied while preparing an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageOptions {
    /// Largest accepted input, in bytes.
    pub max_bytes: usize,
    /// Longest edge allowed before downscaling. `None` keeps the original.
    pub max_dimension: Option<u32>,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
            max_dimension: None,
        }
    }
}

/// Handle to a prepared image. Cloning shares the encoded payload.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageData(Arc<str>);

impl ImageData {
    /// Wrap an already-encoded data URL.
    pub fn from_data_url(data_url: impl Into<Arc<str>>) -> Self {
        Self(data_url.into())
    }

    fn encode(bytes: &[u8], media_type: &str) -> Self {
        Self::from_data_url(format!(
            "data:{};base64,{}",
            media_type,
            STANDARD.encode(bytes)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// MIME type from the data-URL prefix, if present.
    pub fn media_type(&self) -> Option<&str> {
        self.0
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(';'))
            .map(|(mime, _)| mime)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Data URLs run to megabytes; keep them out of debug output and logs.
impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("media_type", &self.media_type())
            .field("len", &self.len())
            .finish()
    }
}

impl Serialize for ImageData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Read an image file and prepare it for upload.
///
/// The size limit is checked against file metadata before reading.
pub fn prepare_image_file(path: &Path, options: &ImageOptions) -> Result<ImageData, GuesserError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| GuesserError::Image(format!("Failed to read {:?}: {}", path, e)))?;
    if metadata.len() > options.max_bytes as u64 {
        return Err(too_large(metadata.len() as usize, options.max_bytes));
    }

    let bytes = std::fs::read(path)
        .map_err(|e| GuesserError::Image(format!("Failed to read {:?}: {}", path, e)))?;
    prepare_image(&bytes, options)
}

/// Validate raw image bytes and encode them as a data URL.
///
/// # Errors
/// - Empty input or input larger than `max_bytes`
/// - Format other than JPEG, PNG, GIF, or WebP
/// - Data that cannot be decoded
pub fn prepare_image(bytes: &[u8], options: &ImageOptions) -> Result<ImageData, GuesserError> {
    if bytes.is_empty() {
        return Err(GuesserError::Image("Image file is empty".to_string()));
    }
    if bytes.len() > options.max_bytes {
        return Err(too_large(bytes.len(), options.max_bytes));
    }

    let format = image::guess_format(bytes)
        .map_err(|e| GuesserError::Image(format!("Unrecognized image format: {}", e)))?;
    let media_type = media_type(format).ok_or_else(|| {
        GuesserError::Image(format!(
            "Unsupported image format {:?}. Supported: JPG, PNG, GIF, WebP",
            format
        ))
    })?;

    let img = image::load_from_memory_with_format(bytes, format).map_err(|e| {
        GuesserError::Image(format!(
            "Failed to load image: {}. Ensure it's a valid JPG/PNG/GIF/WebP.",
            e
        ))
    })?;
    info!("Loaded {} image: {}x{}", media_type, img.width(), img.height());

    match options.max_dimension {
        Some(max) if img.width() > max || img.height() > max => {
            let resized = resize_if_needed(img, max);
            info!("Resized to: {}x{}", resized.width(), resized.height());
            let jpeg_bytes = encode_to_jpeg(&resized)?;
            info!("Encoded to JPEG: {} bytes", jpeg_bytes.len());
            Ok(ImageData::encode(&jpeg_bytes, "image/jpeg"))
        }
        _ => Ok(ImageData::encode(bytes, media_type)),
    }
}

fn too_large(len: usize, max: usize) -> GuesserError {
    GuesserError::Image(format!(
        "Image too large: {} bytes (max {} bytes)",
        len, max
    ))
}

/// MIME type for the formats the recognition service accepts.
fn media_type(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Gif => Some("image/gif"),
        ImageFormat::WebP => Some("image/webp"),
        _ => None,
    }
}

/// Resize image if either dimension exceeds max, maintaining aspect ratio.
fn resize_if_needed(img: DynamicImage, max_dimension: u32) -> DynamicImage {
    let (width, height) = (img.width(), img.height());

    if width <= max_dimension && height <= max_dimension {
        return img;
    }

    let scale = max_dimension as f32 / width.max(height) as f32;
    let new_width = (width as f32 * scale) as u32;
    let new_height = (height as f32 * scale) as u32;

    img.resize(new_width, new_height, image::imageops::FilterType::Lanczos3)
}

fn encode_to_jpeg(img: &DynamicImage) -> Result<Vec<u8>, GuesserError> {
    let mut buffer = Cursor::new(Vec::new());
    // JPEG has no alpha channel.
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_to(&mut buffer, ImageFormat::Jpeg)
        .map_err(|e| GuesserError::Image(format!("Failed to encode image to JPEG: {}", e)))?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::new_rgb8(width, height);
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    fn decode_payload(data: &ImageData) -> Vec<u8> {
        let (_, payload) = data.as_str().split_once(",").unwrap();
        STANDARD.decode(payload).unwrap()
    }

    #[test]
    fn test_prepare_image_rejects_invalid() {
        let result = prepare_image(b"not an image", &ImageOptions::default());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Unrecognized image format"));
    }

    #[test]
    fn test_prepare_image_rejects_empty() {
        let result = prepare_image(&[], &ImageOptions::default());
        assert!(result.unwrap_err().to_string().contains("empty"));
    }

    #[test]
    fn test_prepare_image_rejects_too_large() {
        let bytes = png_bytes(64, 64);
        let options = ImageOptions {
            max_bytes: 10,
            max_dimension: None,
        };
        let result = prepare_image(&bytes, &options);
        assert!(result.unwrap_err().to_string().contains("too large"));
    }

    #[test]
    fn test_prepare_image_rejects_unsupported_format() {
        let img = DynamicImage::new_rgb8(8, 8);
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Bmp).unwrap();

        let result = prepare_image(&buffer.into_inner(), &ImageOptions::default());
        assert!(result.unwrap_err().to_string().contains("Unsupported image format"));
    }

    #[test]
    fn test_prepare_image_passes_png_through() {
        let bytes = png_bytes(300, 200);
        let data = prepare_image(&bytes, &ImageOptions::default()).unwrap();

        assert!(data.as_str().starts_with("data:image/png;base64,"));
        assert_eq!(data.media_type(), Some("image/png"));
        assert_eq!(decode_payload(&data), bytes);
    }

    #[test]
    fn test_prepare_image_downscales_to_jpeg() {
        let bytes = png_bytes(2000, 1000);
        let options = ImageOptions {
            max_bytes: 10 * 1024 * 1024,
            max_dimension: Some(1024),
        };
        let data = prepare_image(&bytes, &options).unwrap();
        assert_eq!(data.media_type(), Some("image/jpeg"));

        let jpeg = decode_payload(&data);
        assert_eq!(jpeg[0], 0xFF);
        assert_eq!(jpeg[1], 0xD8);
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.width(), 1024);
        assert_eq!(decoded.height(), 512);
    }

    #[test]
    fn test_prepare_image_within_max_dimension_untouched() {
        let bytes = png_bytes(500, 300);
        let options = ImageOptions {
            max_bytes: 10 * 1024 * 1024,
            max_dimension: Some(1024),
        };
        let data = prepare_image(&bytes, &options).unwrap();
        assert_eq!(data.media_type(), Some("image/png"));
        assert_eq!(decode_payload(&data), bytes);
    }

    #[test]
    fn test_resize_if_needed_resize_height() {
        let img = DynamicImage::new_rgb8(1000, 2000);
        let resized = resize_if_needed(img, 1024);
        assert_eq!(resized.width(), 512);
        assert_eq!(resized.height(), 1024);
    }

    #[test]
    fn test_prepare_image_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&png_bytes(50, 50)).unwrap();

        let data = prepare_image_file(file.path(), &ImageOptions::default()).unwrap();
        assert_eq!(data.media_type(), Some("image/png"));
    }

    #[test]
    fn test_prepare_image_file_missing() {
        let result = prepare_image_file(Path::new("/nonexistent/pic.png"), &ImageOptions::default());
        assert!(matches!(result, Err(GuesserError::Image(_))));
    }

    #[test]
    fn test_image_data_debug_hides_payload() {
        let data = ImageData::from_data_url("data:image/gif;base64,R0lGODlh");
        let debug = format!("{:?}", data);
        assert!(debug.contains("image/gif"));
        assert!(!debug.contains("R0lGODlh"));
    }
}
