use std::io::Write;

use crate::capture_pipeline::common::error::Result;
use crate::capture_pipeline::frame::Frame;

pub trait FrameWriter {
    fn write_frame(&self, frame: &Frame, output: &mut dyn Write) -> Result<()>;

    /// File extension, without the dot, for files this writer produces.
    fn extension(&self) -> &'static str;
}
