//! Lossless PNG encoding of captured bitmaps.

use crate::export::{
    dependencies::Encoder,
    types::{CapturedBitmap, EncodedArtifact, ExportError, PNG_MIME_TYPE},
};

/// Encodes bitmaps as PNG through Cairo.
pub struct PngEncoder;

impl Encoder for PngEncoder {
    fn encode(&self, bitmap: CapturedBitmap) -> Result<EncodedArtifact, ExportError> {
        let CapturedBitmap {
            width,
            height,
            stride,
            data,
            scale,
        } = bitmap;

        if data.is_empty() || width == 0 || height == 0 {
            return Err(ExportError::Encoding("bitmap is empty".to_string()));
        }
        if (data.len() as u64) < stride as u64 * height as u64 {
            return Err(ExportError::Encoding(format!(
                "pixel buffer of {} bytes is too small for {}x{}",
                data.len(),
                width,
                height
            )));
        }

        let surface = cairo::ImageSurface::create_for_data(
            data,
            cairo::Format::ARgb32,
            width as i32,
            height as i32,
            stride as i32,
        )
        .map_err(|e| ExportError::Encoding(format!("Invalid pixel buffer: {}", e)))?;

        let mut bytes = Vec::new();
        surface
            .write_to_png(&mut bytes)
            .map_err(|e| ExportError::Encoding(format!("PNG encoder failed: {}", e)))?;

        if bytes.is_empty() {
            return Err(ExportError::Encoding("encoder produced no data".to_string()));
        }

        log::debug!("Encoded {}x{} bitmap into {} bytes", width, height, bytes.len());

        Ok(EncodedArtifact {
            byte_length: bytes.len(),
            bytes,
            mime_type: PNG_MIME_TYPE,
            width,
            height,
            scale,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white_bitmap(width: u32, height: u32) -> CapturedBitmap {
        let stride = cairo::Format::ARgb32.stride_for_width(width).unwrap() as u32;
        CapturedBitmap {
            width,
            height,
            stride,
            data: vec![255; (stride * height) as usize],
            scale: 1.0,
        }
    }

    #[test]
    fn produces_png_with_signature() {
        let artifact = PngEncoder.encode(white_bitmap(12, 7)).unwrap();
        assert_eq!(artifact.mime_type, "image/png");
        assert_eq!(artifact.byte_length, artifact.bytes.len());
        assert!(artifact.byte_length > 0);
        assert_eq!(&artifact.bytes[0..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
        assert_eq!((artifact.width, artifact.height), (12, 7));
    }

    #[test]
    fn decoded_png_keeps_dimensions() {
        let artifact = PngEncoder.encode(white_bitmap(9, 5)).unwrap();
        let decoded =
            cairo::ImageSurface::create_from_png(&mut std::io::Cursor::new(artifact.bytes)).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (9, 5));
    }

    #[test]
    fn empty_bitmap_is_an_encoding_error() {
        let bitmap = CapturedBitmap {
            width: 0,
            height: 0,
            stride: 0,
            data: Vec::new(),
            scale: 1.0,
        };
        assert!(matches!(
            PngEncoder.encode(bitmap),
            Err(ExportError::Encoding(_))
        ));
    }

    #[test]
    fn short_buffer_is_an_encoding_error() {
        let mut bitmap = white_bitmap(4, 4);
        bitmap.data.truncate(8);
        assert!(matches!(
            PngEncoder.encode(bitmap),
            Err(ExportError::Encoding(_))
        ));
    }
}
