use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult};
use tracing::debug;

use crate::capture_pipeline::common::error::{CaptureError, Result};
use crate::capture_pipeline::frame::{Frame, PixelFormat};

/// Reads an 8-bit grayscale or RGB TIFF.
pub fn read_tiff_frame(path: &Path) -> Result<Frame> {
    let file = File::open(path)?;
    let mut decoder = Decoder::new(BufReader::new(file))
        .map_err(|e| CaptureError::DecodeError(format!("{}: {}", path.display(), e)))?;
    let (width, height) = decoder
        .dimensions()
        .map_err(|e| CaptureError::DecodeError(e.to_string()))?;
    let format = match decoder
        .colortype()
        .map_err(|e| CaptureError::DecodeError(e.to_string()))?
    {
        ColorType::Gray(8) => PixelFormat::Gray8,
        ColorType::RGB(8) => PixelFormat::Rgb8,
        other => {
            return Err(CaptureError::UnsupportedFormat(format!(
                "{}: {:?}",
                path.display(),
                other
            )));
        }
    };
    let data = match decoder
        .read_image()
        .map_err(|e| CaptureError::DecodeError(e.to_string()))?
    {
        DecodingResult::U8(data) => data,
        _ => {
            return Err(CaptureError::UnsupportedFormat(format!(
                "{}: samples are not 8-bit",
                path.display()
            )));
        }
    };
    debug!("Decoded TIFF {}x{} {:?}", width, height, format);
    Frame::new(width as usize, height as usize, format, data)
}

/// Decodes any format the `image` crate was built with (JPEG, PNG).
pub fn read_image_file(path: &Path) -> Result<Frame> {
    let image = image::open(path)
        .map_err(|e| CaptureError::DecodeError(format!("{}: {}", path.display(), e)))?;
    Ok(Frame::from_dynamic_image(image))
}

pub fn decode_image_bytes(bytes: &[u8]) -> Result<Frame> {
    let image =
        image::load_from_memory(bytes).map_err(|e| CaptureError::DecodeError(e.to_string()))?;
    Ok(Frame::from_dynamic_image(image))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture_pipeline::codec::{
        FrameWriter, JpegWriter, StandardTiffWriter, TiffCompression,
    };

    #[test]
    fn tiff_preserves_gray_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.tiff");
        let mut frame = Frame::filled(16, 8, PixelFormat::Gray8, 3);
        frame.data_mut()[5] = 250;

        for compression in [TiffCompression::None, TiffCompression::Lzw] {
            let mut file = File::create(&path).unwrap();
            StandardTiffWriter::new(compression)
                .write_frame(&frame, &mut file)
                .unwrap();
            drop(file);
            assert_eq!(read_tiff_frame(&path).unwrap(), frame);
        }
    }

    #[test]
    fn jpeg_decodes_to_same_dimensions() {
        let frame = Frame::filled(40, 30, PixelFormat::Rgb8, 128);
        let mut bytes = Vec::new();
        JpegWriter::new(90).write_frame(&frame, &mut bytes).unwrap();
        let decoded = decode_image_bytes(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (40, 30));
        assert_eq!(decoded.format(), PixelFormat::Rgb8);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let result = decode_image_bytes(b"definitely not an image");
        assert!(matches!(result, Err(CaptureError::DecodeError(_))));
    }
}
