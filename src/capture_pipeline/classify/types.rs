//! Classifier configuration and results

use std::fmt;

/// Coarse brightness class of a detected subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectColor {
    Light,
    Dark,
    /// Classification could not be computed
    Unknown,
}

impl SubjectColor {
    pub fn as_str(self) -> &'static str {
        match self {
            SubjectColor::Light => "light",
            SubjectColor::Dark => "dark",
            SubjectColor::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SubjectColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thresholds for the brightness + region-size presence heuristic
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    /// Scenes whose mean brightness does not exceed this never qualify
    pub min_brightness: f64,
    /// Mean brightness above this classifies the subject as light
    pub light_cutoff: f64,
    /// Gaussian kernel applied before segmentation (0 or odd)
    pub blur_kernel: usize,
    /// Smallest region area, in pixels, that counts as a subject
    pub min_area: usize,
    /// Largest region area, in pixels, that counts as a subject
    pub max_area: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_brightness: 50.0,
            light_cutoff: 100.0,
            blur_kernel: 15,
            min_area: 1000,
            max_area: 50_000,
        }
    }
}
