//! The still image produced by a capture.

use std::fmt;
use std::io::Cursor;
use std::path::Path;

use image::RgbImage;
use sha2::{Digest, Sha256};

use super::errors::CaptureError;

/// Encoding of a [`CapturedImage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
        }
    }

    fn codec(&self) -> image::ImageFormat {
        match self {
            ImageFormat::Png => image::ImageFormat::Png,
        }
    }
}

/// An encoded still image: the bytes, their format, and a content digest.
#[derive(Clone, PartialEq, Eq)]
pub struct CapturedImage {
    data: Vec<u8>,
    format: ImageFormat,
    width: u32,
    height: u32,
    digest: String,
}

impl CapturedImage {
    /// Encode an RGB raster.
    pub fn encode(raster: &RgbImage, format: ImageFormat) -> Result<Self, CaptureError> {
        let mut data = Vec::new();
        raster
            .write_to(&mut Cursor::new(&mut data), format.codec())
            .map_err(|e| CaptureError::Encode(e.to_string()))?;
        Ok(Self::from_encoded(data, format, raster.width(), raster.height()))
    }

    /// Wrap bytes that are already encoded in `format`.
    pub fn from_encoded(data: Vec<u8>, format: ImageFormat, width: u32, height: u32) -> Self {
        let digest = hex::encode(Sha256::digest(&data));
        Self {
            data,
            format,
            width,
            height,
            digest,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// SHA-256 of the encoded bytes, hex encoded.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// First 12 hex digits of the digest, for logs.
    pub fn short_digest(&self) -> &str {
        &self.digest[..12.min(self.digest.len())]
    }

    /// Decode back into an RGB raster.
    pub fn decode(&self) -> Result<RgbImage, CaptureError> {
        image::load_from_memory_with_format(&self.data, self.format.codec())
            .map(|img| img.to_rgb8())
            .map_err(|e| CaptureError::Encode(e.to_string()))
    }

    /// Write the encoded bytes to `path`.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, &self.data)
    }
}

impl fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedImage")
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .field("digest", &self.short_digest())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster(color: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(4, 4, image::Rgb(color))
    }

    #[test]
    fn test_encode_png_signature() {
        let image = CapturedImage::encode(&raster([1, 2, 3]), ImageFormat::Png).unwrap();
        assert_eq!(&image.data()[..4], &[0x89, b'P', b'N', b'G']);
        assert_eq!((image.width(), image.height()), (4, 4));
        assert_eq!(image.format().mime_type(), "image/png");
    }

    #[test]
    fn test_decode_restores_pixels() {
        let image = CapturedImage::encode(&raster([9, 8, 7]), ImageFormat::Png).unwrap();
        let decoded = image.decode().unwrap();
        assert_eq!(decoded.get_pixel(3, 3).0, [9, 8, 7]);
    }

    #[test]
    fn test_digest_tracks_content() {
        let a = CapturedImage::encode(&raster([0, 0, 0]), ImageFormat::Png).unwrap();
        let b = CapturedImage::encode(&raster([255, 0, 0]), ImageFormat::Png).unwrap();
        assert_eq!(a.digest().len(), 64);
        assert_ne!(a.digest(), b.digest());
        assert_eq!(a.short_digest().len(), 12);
    }

    #[test]
    fn test_debug_omits_pixel_data() {
        let image = CapturedImage::from_encoded(vec![0; 1000], ImageFormat::Png, 10, 10);
        let debug = format!("{:?}", image);
        assert!(debug.contains("bytes: 1000"));
        assert!(debug.len() < 200);
    }

    #[test]
    fn test_save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/capture.png");
        let image = CapturedImage::encode(&raster([5, 5, 5]), ImageFormat::Png).unwrap();
        image.save(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), image.data());
    }
}
