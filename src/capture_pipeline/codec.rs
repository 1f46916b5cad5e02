//! Image codec module
//!
//! Encodes frames for evidence and reference storage and decodes frames
//! produced by external capture tools.

mod jpeg_writer;
mod reader;
mod standard_tiff_writer;
pub mod types;
mod writer;

pub use jpeg_writer::JpegWriter;
pub use reader::{decode_image_bytes, read_image_file, read_tiff_frame};
pub use standard_tiff_writer::StandardTiffWriter;
pub use types::{EvidenceFormat, TiffCompression};
pub use writer::FrameWriter;
