//! In-memory frame types

use image::{DynamicImage, GrayImage, RgbImage};

use crate::capture_pipeline::common::error::{CaptureError, Result};

/// Pixel layout of a [`Frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// One byte per pixel
    Gray8,
    /// Three interleaved bytes per pixel [R, G, B, R, G, B, ...]
    Rgb8,
}

impl PixelFormat {
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Rgb8 => 3,
        }
    }
}

/// An owned 8-bit raster.
///
/// Conversions such as [`Frame::to_gray`] always produce a new value; a frame
/// is never aliased between pipeline stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: usize,
    height: usize,
    format: PixelFormat,
    data: Vec<u8>,
}

impl Frame {
    pub fn new(width: usize, height: usize, format: PixelFormat, data: Vec<u8>) -> Result<Self> {
        let expected = width * height * format.channels();
        if data.len() != expected {
            return Err(CaptureError::InvalidFrame(format!(
                "{}x{} {:?} needs {} bytes, got {}",
                width,
                height,
                format,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// A frame where every channel of every pixel holds `value`.
    pub fn filled(width: usize, height: usize, format: PixelFormat, value: u8) -> Self {
        Self {
            width,
            height,
            format,
            data: vec![value; width * height * format.channels()],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn is_gray(&self) -> bool {
        self.format == PixelFormat::Gray8
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Grayscale copy using ITU-R BT.601 luma weights.
    pub fn to_gray(&self) -> Frame {
        match self.format {
            PixelFormat::Gray8 => self.clone(),
            PixelFormat::Rgb8 => Frame {
                width: self.width,
                height: self.height,
                format: PixelFormat::Gray8,
                data: self.data.chunks_exact(3).map(luma).collect(),
            },
        }
    }

    /// Like [`Frame::to_gray`], but reuses the buffer when already grayscale.
    pub fn into_gray(self) -> Frame {
        match self.format {
            PixelFormat::Gray8 => self,
            PixelFormat::Rgb8 => self.to_gray(),
        }
    }

    /// Mean grayscale brightness, or `None` for an empty frame.
    pub fn mean_brightness(&self) -> Option<f64> {
        if self.pixel_count() == 0 {
            return None;
        }
        let sum: u64 = match self.format {
            PixelFormat::Gray8 => self.data.iter().map(|&v| v as u64).sum(),
            PixelFormat::Rgb8 => self.data.chunks_exact(3).map(|px| luma(px) as u64).sum(),
        };
        Some(sum as f64 / self.pixel_count() as f64)
    }

    pub fn from_dynamic_image(image: DynamicImage) -> Frame {
        match image {
            DynamicImage::ImageLuma8(gray) => {
                let (width, height) = gray.dimensions();
                Frame {
                    width: width as usize,
                    height: height as usize,
                    format: PixelFormat::Gray8,
                    data: gray.into_raw(),
                }
            }
            other => {
                let rgb = other.into_rgb8();
                let (width, height) = rgb.dimensions();
                Frame {
                    width: width as usize,
                    height: height as usize,
                    format: PixelFormat::Rgb8,
                    data: rgb.into_raw(),
                }
            }
        }
    }

    pub fn to_dynamic_image(&self) -> Result<DynamicImage> {
        let (width, height) = (self.width as u32, self.height as u32);
        let data = self.data.clone();
        let image = match self.format {
            PixelFormat::Gray8 => GrayImage::from_raw(width, height, data).map(DynamicImage::ImageLuma8),
            PixelFormat::Rgb8 => RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8),
        };
        image.ok_or_else(|| {
            CaptureError::InvalidFrame(format!("{}x{} buffer does not fit an image", width, height))
        })
    }
}

fn luma(px: &[u8]) -> u8 {
    ((px[0] as u32 * 299 + px[1] as u32 * 587 + px[2] as u32 * 114 + 500) / 1000) as u8
}
