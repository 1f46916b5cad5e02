use tracing::debug;

use crate::capture_pipeline::common::error::{CaptureError, Result};
use crate::capture_pipeline::diff::types::{DiffParams, DiffResult};
use crate::capture_pipeline::frame::{Frame, PixelFormat, gaussian_blur, validate_blur_kernel};

/// Counts the pixels whose absolute difference exceeds `params.binary_threshold`.
///
/// Both frames must be grayscale and share dimensions; mismatched sizes are
/// rejected rather than resized. The result is symmetric in `a` and `b`.
pub fn score(a: &Frame, b: &Frame, params: &DiffParams) -> Result<u64> {
    validate_blur_kernel(params.blur_kernel)?;
    for frame in [a, b] {
        if frame.format() != PixelFormat::Gray8 {
            return Err(CaptureError::UnsupportedFormat(format!(
                "frame differencing expects grayscale frames, got {:?}",
                frame.format()
            )));
        }
    }
    if a.dimensions() != b.dimensions() {
        return Err(CaptureError::dimension_mismatch(a.dimensions(), b.dimensions()));
    }

    let changed = if params.blur_kernel > 1 {
        let a = gaussian_blur(a, params.blur_kernel)?;
        let b = gaussian_blur(b, params.blur_kernel)?;
        count_changed(a.data(), b.data(), params.binary_threshold)
    } else {
        count_changed(a.data(), b.data(), params.binary_threshold)
    };
    Ok(changed)
}

fn count_changed(a: &[u8], b: &[u8], threshold: u8) -> u64 {
    a.iter()
        .zip(b)
        .filter(|&(&x, &y)| x.abs_diff(y) > threshold)
        .count() as u64
}

/// [`score`] bound to a fixed parameter set and event threshold.
#[derive(Debug, Clone, Copy)]
pub struct FrameDiffer {
    params: DiffParams,
    threshold: u64,
}

impl FrameDiffer {
    pub fn new(params: DiffParams, threshold: u64) -> Self {
        Self { params, threshold }
    }

    pub fn compare(&self, current: &Frame, reference: &Frame) -> Result<DiffResult> {
        let changed_pixels = score(current, reference, &self.params)?;
        debug!(changed_pixels, threshold = self.threshold, "Frame difference");
        Ok(DiffResult {
            changed_pixels,
            threshold: self.threshold,
        })
    }

    pub fn params(&self) -> &DiffParams {
        &self.params
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: usize, height: usize) -> Frame {
        let data = (0..width * height).map(|i| (i * 7 % 256) as u8).collect();
        Frame::new(width, height, PixelFormat::Gray8, data).unwrap()
    }

    #[test]
    fn identical_frames_score_zero() {
        let frame = gradient(32, 24);
        for blur_kernel in [0, 3, 5] {
            for binary_threshold in [0, 25, 254] {
                let params = DiffParams {
                    blur_kernel,
                    binary_threshold,
                };
                assert_eq!(score(&frame, &frame, &params).unwrap(), 0);
            }
        }
    }

    #[test]
    fn single_changed_pixel_is_counted() {
        let a = Frame::filled(16, 16, PixelFormat::Gray8, 10);
        let mut b = a.clone();
        b.data_mut()[37] = 200;
        let params = DiffParams {
            blur_kernel: 0,
            binary_threshold: 50,
        };
        assert_eq!(score(&a, &b, &params).unwrap(), 1);
    }

    #[test]
    fn difference_equal_to_threshold_is_not_counted() {
        let a = Frame::filled(4, 4, PixelFormat::Gray8, 100);
        let b = Frame::filled(4, 4, PixelFormat::Gray8, 150);
        let params = DiffParams {
            blur_kernel: 0,
            binary_threshold: 50,
        };
        assert_eq!(score(&a, &b, &params).unwrap(), 0);
    }

    #[test]
    fn score_is_symmetric() {
        let a = gradient(40, 30);
        let mut b = Frame::filled(40, 30, PixelFormat::Gray8, 90);
        b.data_mut()[100..400].fill(250);
        for blur_kernel in [0, 5] {
            let params = DiffParams {
                blur_kernel,
                binary_threshold: 30,
            };
            assert_eq!(
                score(&a, &b, &params).unwrap(),
                score(&b, &a, &params).unwrap()
            );
        }
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let a = Frame::filled(320, 240, PixelFormat::Gray8, 0);
        let b = Frame::filled(640, 480, PixelFormat::Gray8, 0);
        let result = score(&a, &b, &DiffParams::default());
        assert!(matches!(
            result,
            Err(CaptureError::DimensionMismatch {
                left_width: 320,
                right_width: 640,
                ..
            })
        ));
    }

    #[test]
    fn color_frames_are_rejected() {
        let a = Frame::filled(4, 4, PixelFormat::Rgb8, 0);
        let result = score(&a, &a, &DiffParams::default());
        assert!(matches!(result, Err(CaptureError::UnsupportedFormat(_))));
    }

    #[test]
    fn differ_reports_threshold_crossing() {
        let a = Frame::filled(10, 10, PixelFormat::Gray8, 0);
        let mut b = a.clone();
        b.data_mut()[..6].fill(255);
        let differ = FrameDiffer::new(DiffParams::default(), 5);
        let result = differ.compare(&b, &a).unwrap();
        assert_eq!(result.changed_pixels, 6);
        assert!(result.exceeds_threshold());
    }
}
