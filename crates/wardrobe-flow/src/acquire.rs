//! Image acquisition: raw file bytes to an [`UploadedImage`].
//!
//! The only check is decodability. Dimensions are probed from the header so
//! the overlay can be laid out in natural pixels.

use std::io::Cursor;
use std::path::Path;

use image::io::Reader as ImageReader;
use tracing::debug;
use wardrobe_models::{Dimensions, ImagePayload, UploadedImage};

use crate::error::{FlowError, FlowResult};

/// Encode `bytes` as an upload, probing its natural dimensions.
pub fn acquire(bytes: &[u8], filename: &str) -> FlowResult<UploadedImage> {
    let dimensions = probe(bytes)?;
    debug!(
        filename,
        width = dimensions.width,
        height = dimensions.height,
        "Acquired image"
    );

    Ok(UploadedImage {
        payload: ImagePayload::from_bytes(bytes),
        filename: filename.to_string(),
        dimensions,
    })
}

/// Acquire an image that arrived base64-encoded.
pub fn acquire_base64(payload: ImagePayload, filename: &str) -> FlowResult<UploadedImage> {
    let bytes = payload
        .decode()
        .map_err(|e| FlowError::image_decode(e.to_string()))?;
    let dimensions = probe(&bytes)?;

    Ok(UploadedImage {
        payload,
        filename: filename.to_string(),
        dimensions,
    })
}

/// Read and acquire an image file.
pub async fn acquire_path(path: impl AsRef<Path>) -> FlowResult<UploadedImage> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    acquire(&bytes, &filename)
}

fn probe(bytes: &[u8]) -> FlowResult<Dimensions> {
    if bytes.is_empty() {
        return Err(FlowError::image_decode("file is empty"));
    }

    let (width, height) = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| FlowError::image_decode(e.to_string()))?
        .into_dimensions()
        .map_err(|e| FlowError::image_decode(e.to_string()))?;

    Ok(Dimensions::new(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageOutputFormat, RgbImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_acquire_probes_dimensions() {
        let image = acquire(&png(40, 30), "photo.jpg").unwrap();
        assert_eq!(image.dimensions, Dimensions::new(40, 30));
        assert_eq!(image.filename, "photo.jpg");
        assert_eq!(image.payload.decode().unwrap(), png(40, 30));
    }

    #[test]
    fn test_acquire_rejects_garbage() {
        let err = acquire(b"definitely not an image", "notes.txt").unwrap_err();
        assert!(matches!(err, FlowError::ImageDecode(_)));

        let err = acquire(&[], "empty.png").unwrap_err();
        assert!(matches!(err, FlowError::ImageDecode(_)));
    }

    #[test]
    fn test_acquire_base64_keeps_payload() {
        let payload = ImagePayload::from_bytes(&png(8, 6));
        let image = acquire_base64(payload.clone(), "small.png").unwrap();
        assert_eq!(image.payload, payload);
        assert_eq!(image.dimensions, Dimensions::new(8, 6));
    }

    #[tokio::test]
    async fn test_acquire_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shirt.png");
        tokio::fs::write(&path, png(12, 9)).await.unwrap();

        let image = acquire_path(&path).await.unwrap();
        assert_eq!(image.filename, "shirt.png");
        assert_eq!(image.dimensions, Dimensions::new(12, 9));
    }
}
