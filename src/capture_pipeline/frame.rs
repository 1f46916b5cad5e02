//! Frame module
//!
//! Owned raster frames plus the grayscale filters the differencer and the
//! classifier share.

pub mod filters;
pub mod types;

pub use filters::{gaussian_blur, validate_blur_kernel};
pub use types::{Frame, PixelFormat};
