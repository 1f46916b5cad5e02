use crate::capture_pipeline::classify::types::SubjectColor;
use crate::capture_pipeline::frame::Frame;

/// Classification never fails outright: implementations fall back to
/// `false` and [`SubjectColor::Unknown`] when something goes wrong.
pub trait SubjectClassifier {
    fn is_subject_present(&self, frame: &Frame) -> bool;
    fn color_class(&self, frame: &Frame) -> SubjectColor;
}
