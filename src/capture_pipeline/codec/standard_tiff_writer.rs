use std::io::{Cursor, Write};

use tiff::encoder::{Compression, TiffEncoder, colortype, compression::DeflateLevel};
use tiff::tags::Predictor;
use tracing::debug;

use crate::capture_pipeline::codec::types::TiffCompression;
use crate::capture_pipeline::codec::writer::FrameWriter;
use crate::capture_pipeline::common::error::{CaptureError, Result};
use crate::capture_pipeline::frame::{Frame, PixelFormat};

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardTiffWriter {
    compression: TiffCompression,
}

impl StandardTiffWriter {
    pub fn new(compression: TiffCompression) -> Self {
        Self { compression }
    }
}

impl FrameWriter for StandardTiffWriter {
    fn write_frame(&self, frame: &Frame, output: &mut dyn Write) -> Result<()> {
        debug!("Encoding TIFF image: {}x{} {:?}", frame.width(), frame.height(), frame.format());

        let mut buffer = Vec::new();

        let compression = match self.compression {
            TiffCompression::None => Compression::Uncompressed,
            TiffCompression::Lzw => Compression::Lzw,
            TiffCompression::Deflate => Compression::Deflate(DeflateLevel::Fast),
        };

        let mut encoder = TiffEncoder::new(Cursor::new(&mut buffer))
            .map_err(|e| CaptureError::EncodeError(e.to_string()))?
            .with_compression(compression);

        // Horizontal differencing only pays off when something compresses the residuals.
        if self.compression != TiffCompression::None {
            encoder = encoder.with_predictor(Predictor::Horizontal);
        }

        let (width, height) = (frame.width() as u32, frame.height() as u32);
        let written = match frame.format() {
            PixelFormat::Gray8 => encoder.write_image::<colortype::Gray8>(width, height, frame.data()),
            PixelFormat::Rgb8 => encoder.write_image::<colortype::RGB8>(width, height, frame.data()),
        };
        written.map_err(|e| CaptureError::EncodeError(e.to_string()))?;

        output.write_all(&buffer)?;

        debug!("TIFF encoding complete");
        Ok(())
    }

    fn extension(&self) -> &'static str {
        "tiff"
    }
}
