//! Codec configuration types

use serde::Deserialize;

/// TIFF compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    #[default]
    None,
    /// LZW compression (slow, good compression)
    Lzw,
    /// Deflate compression - fast level
    Deflate,
}

/// File format used for stored evidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceFormat {
    #[default]
    Jpeg,
    Tiff,
}

impl EvidenceFormat {
    pub fn extension(self) -> &'static str {
        match self {
            EvidenceFormat::Jpeg => "jpg",
            EvidenceFormat::Tiff => "tiff",
        }
    }
}
