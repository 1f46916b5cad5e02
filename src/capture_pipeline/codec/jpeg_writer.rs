use std::io::Write;

use image::ExtendedColorType;
use image::codecs::jpeg::JpegEncoder;
use tracing::debug;

use crate::capture_pipeline::codec::writer::FrameWriter;
use crate::capture_pipeline::common::error::{CaptureError, Result};
use crate::capture_pipeline::frame::{Frame, PixelFormat};

#[derive(Debug, Clone, Copy)]
pub struct JpegWriter {
    quality: u8,
}

impl JpegWriter {
    /// `quality` is clamped to 1..=100.
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }
}

impl Default for JpegWriter {
    fn default() -> Self {
        Self::new(85)
    }
}

impl FrameWriter for JpegWriter {
    fn write_frame(&self, frame: &Frame, output: &mut dyn Write) -> Result<()> {
        debug!(
            "Encoding JPEG image: {}x{} quality {}",
            frame.width(),
            frame.height(),
            self.quality
        );
        let color = match frame.format() {
            PixelFormat::Gray8 => ExtendedColorType::L8,
            PixelFormat::Rgb8 => ExtendedColorType::Rgb8,
        };
        let mut buffer = Vec::new();
        JpegEncoder::new_with_quality(&mut buffer, self.quality)
            .encode(frame.data(), frame.width() as u32, frame.height() as u32, color)
            .map_err(|e| CaptureError::EncodeError(e.to_string()))?;
        output.write_all(&buffer)?;
        Ok(())
    }

    fn extension(&self) -> &'static str {
        "jpg"
    }
}
