use tracing::{debug, warn};

use crate::capture_pipeline::classify::classifier::SubjectClassifier;
use crate::capture_pipeline::classify::otsu::{binarize_above, otsu_threshold};
use crate::capture_pipeline::classify::regions::region_areas;
use crate::capture_pipeline::classify::types::{ClassifierConfig, SubjectColor};
use crate::capture_pipeline::common::error::{CaptureError, Result};
use crate::capture_pipeline::frame::{Frame, gaussian_blur};

/// Brightness + region-size presence heuristic.
///
/// A frame qualifies when its mean brightness exceeds
/// [`ClassifierConfig::min_brightness`] and, after blurring and an Otsu
/// split, at least one bright region has an area inside
/// `[min_area, max_area]`. The band rejects both sensor specks and
/// frame-filling lighting changes.
#[derive(Debug, Clone, Default)]
pub struct HeuristicClassifier {
    config: ClassifierConfig,
}

impl HeuristicClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    fn detect(&self, frame: &Frame) -> Result<bool> {
        let gray = frame.to_gray();
        let brightness = mean_brightness(&gray)?;
        if brightness <= self.config.min_brightness {
            debug!(
                brightness,
                min_brightness = self.config.min_brightness,
                "Scene too dim for a subject"
            );
            return Ok(false);
        }

        let blurred = gaussian_blur(&gray, self.config.blur_kernel)?;
        drop(gray);
        let threshold = otsu_threshold(&blurred);
        let mask = binarize_above(&blurred, threshold);
        let areas = region_areas(&mask, blurred.width(), blurred.height());

        let hit = areas
            .iter()
            .copied()
            .find(|area| (self.config.min_area..=self.config.max_area).contains(area));
        match hit {
            Some(area) => {
                debug!(area, brightness, threshold, "Subject-sized region found");
                Ok(true)
            }
            None => {
                debug!(regions = areas.len(), brightness, threshold, "No subject-sized region");
                Ok(false)
            }
        }
    }

    fn classify_color(&self, frame: &Frame) -> Result<SubjectColor> {
        let brightness = mean_brightness(frame)?;
        let color = if brightness > self.config.light_cutoff {
            SubjectColor::Light
        } else {
            SubjectColor::Dark
        };
        debug!(%color, brightness, "Subject color classified");
        Ok(color)
    }
}

fn mean_brightness(frame: &Frame) -> Result<f64> {
    frame
        .mean_brightness()
        .ok_or_else(|| CaptureError::ClassifierDegraded("empty frame".to_string()))
}

impl SubjectClassifier for HeuristicClassifier {
    fn is_subject_present(&self, frame: &Frame) -> bool {
        match self.detect(frame) {
            Ok(present) => present,
            Err(e) => {
                warn!("Presence check degraded, assuming no subject: {}", e);
                false
            }
        }
    }

    fn color_class(&self, frame: &Frame) -> SubjectColor {
        match self.classify_color(frame) {
            Ok(color) => color,
            Err(e) => {
                warn!("Color classification degraded: {}", e);
                SubjectColor::Unknown
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture_pipeline::frame::PixelFormat;

    fn scene_with_blob(background: u8, blob: (usize, usize)) -> Frame {
        let (width, height) = (320, 240);
        let mut frame = Frame::filled(width, height, PixelFormat::Gray8, background);
        let data = frame.data_mut();
        for y in 60..60 + blob.1 {
            for x in 100..100 + blob.0 {
                data[y * width + x] = 255;
            }
        }
        frame
    }

    #[test]
    fn dim_scene_never_qualifies() {
        let classifier = HeuristicClassifier::default();
        let frame = scene_with_blob(10, (50, 40));
        assert!(frame.mean_brightness().unwrap() <= 50.0);
        assert!(!classifier.is_subject_present(&frame));
    }

    #[test]
    fn mid_sized_blob_qualifies() {
        let classifier = HeuristicClassifier::default();
        let frame = scene_with_blob(70, (50, 40));
        assert!(classifier.is_subject_present(&frame));
    }

    #[test]
    fn speck_is_rejected() {
        let classifier = HeuristicClassifier::default();
        let frame = scene_with_blob(70, (10, 10));
        assert!(!classifier.is_subject_present(&frame));
    }

    #[test]
    fn hollow_outline_is_measured_by_its_boundary() {
        let classifier = HeuristicClassifier::new(ClassifierConfig {
            blur_kernel: 0,
            ..ClassifierConfig::default()
        });
        let (width, height) = (320, 240);
        let mut frame = Frame::filled(width, height, PixelFormat::Gray8, 60);
        let data = frame.data_mut();
        for y in 80..140 {
            for x in 120..180 {
                let in_hole = (124..176).contains(&x) && (84..136).contains(&y);
                if !in_hole {
                    data[y * width + x] = 255;
                }
            }
        }
        assert!(frame.mean_brightness().unwrap() > 50.0);
        assert!(classifier.is_subject_present(&frame));
    }

    #[test]
    fn uniform_bright_scene_is_rejected() {
        let classifier = HeuristicClassifier::default();
        let frame = Frame::filled(320, 240, PixelFormat::Gray8, 200);
        assert!(!classifier.is_subject_present(&frame));
    }

    #[test]
    fn color_follows_light_cutoff() {
        let classifier = HeuristicClassifier::default();
        let light = Frame::filled(4, 4, PixelFormat::Rgb8, 180);
        let dark = Frame::filled(4, 4, PixelFormat::Rgb8, 100);
        assert_eq!(classifier.color_class(&light), SubjectColor::Light);
        assert_eq!(classifier.color_class(&dark), SubjectColor::Dark);
    }

    #[test]
    fn empty_frame_degrades_to_unknown() {
        let classifier = HeuristicClassifier::default();
        let empty = Frame::filled(0, 0, PixelFormat::Rgb8, 0);
        assert_eq!(classifier.color_class(&empty), SubjectColor::Unknown);
        assert!(!classifier.is_subject_present(&empty));
    }

    #[test]
    fn invalid_blur_kernel_degrades_to_not_present() {
        let classifier = HeuristicClassifier::new(ClassifierConfig {
            blur_kernel: 4,
            ..ClassifierConfig::default()
        });
        let frame = scene_with_blob(70, (50, 40));
        assert!(!classifier.is_subject_present(&frame));
    }
}
