//! Grayscale smoothing.

use crate::capture_pipeline::common::error::{CaptureError, Result};
use crate::capture_pipeline::frame::types::{Frame, PixelFormat};

/// A blur kernel is either 0 (disabled) or an odd size.
pub fn validate_blur_kernel(kernel: usize) -> Result<()> {
    if kernel != 0 && kernel % 2 == 0 {
        return Err(CaptureError::InvalidParameter(format!(
            "blur kernel must be 0 or odd, got {}",
            kernel
        )));
    }
    Ok(())
}

/// Separable Gaussian blur of a grayscale frame.
///
/// Sigma is derived from the kernel size the same way common vision
/// libraries do when none is given, and borders are mirrored without
/// repeating the edge pixel. A kernel of 0 or 1 returns an unmodified copy.
pub fn gaussian_blur(frame: &Frame, kernel: usize) -> Result<Frame> {
    validate_blur_kernel(kernel)?;
    if frame.format() != PixelFormat::Gray8 {
        return Err(CaptureError::UnsupportedFormat(format!(
            "blur expects a grayscale frame, got {:?}",
            frame.format()
        )));
    }
    if kernel <= 1 || frame.pixel_count() == 0 {
        return Ok(frame.clone());
    }

    let (width, height) = frame.dimensions();
    let weights = gaussian_weights(kernel);
    let radius = (kernel / 2) as isize;
    let src = frame.data();

    let mut horizontal = vec![0f32; width * height];
    for y in 0..height {
        let row = &src[y * width..(y + 1) * width];
        for x in 0..width {
            let mut acc = 0.0;
            for (k, w) in weights.iter().enumerate() {
                let sx = reflect(x as isize + k as isize - radius, width);
                acc += w * row[sx] as f32;
            }
            horizontal[y * width + x] = acc;
        }
    }

    let mut out = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0;
            for (k, w) in weights.iter().enumerate() {
                let sy = reflect(y as isize + k as isize - radius, height);
                acc += w * horizontal[sy * width + x];
            }
            out[y * width + x] = acc.round().clamp(0.0, 255.0) as u8;
        }
    }

    Frame::new(width, height, PixelFormat::Gray8, out)
}

fn gaussian_weights(kernel: usize) -> Vec<f32> {
    let sigma = 0.3 * ((kernel as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let center = (kernel / 2) as f32;
    let mut weights: Vec<f32> = (0..kernel)
        .map(|i| {
            let d = i as f32 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

fn reflect(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    let mut i = index;
    // Kernels wider than the frame may need more than one bounce.
    while i < 0 || i > last {
        if i < 0 {
            i = -i;
        }
        if i > last {
            i = 2 * last - i;
        }
    }
    i as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_kernel_is_rejected() {
        let frame = Frame::filled(4, 4, PixelFormat::Gray8, 10);
        assert!(matches!(
            gaussian_blur(&frame, 4),
            Err(CaptureError::InvalidParameter(_))
        ));
    }

    #[test]
    fn uniform_frame_stays_uniform() {
        let frame = Frame::filled(20, 10, PixelFormat::Gray8, 77);
        let blurred = gaussian_blur(&frame, 15).unwrap();
        assert!(blurred.data().iter().all(|&v| v == 77));
    }

    #[test]
    fn blur_spreads_a_single_bright_pixel() {
        let mut frame = Frame::filled(9, 9, PixelFormat::Gray8, 0);
        frame.data_mut()[4 * 9 + 4] = 255;
        let blurred = gaussian_blur(&frame, 3).unwrap();
        let center = blurred.data()[4 * 9 + 4];
        let neighbour = blurred.data()[4 * 9 + 5];
        assert!(center < 255);
        assert!(neighbour > 0);
        assert_eq!(blurred.data()[0], 0);
    }

    #[test]
    fn reflect_handles_narrow_frames() {
        assert_eq!(reflect(-1, 3), 1);
        assert_eq!(reflect(3, 3), 1);
        assert_eq!(reflect(-5, 2), 1);
        assert_eq!(reflect(7, 1), 0);
    }
}
