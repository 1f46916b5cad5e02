use std::path::Path;

use crate::capture_pipeline::classify::SubjectColor;

pub trait Notifier {
    /// Delivers one event. `evidence` is `None` when the frame could not be
    /// stored. Returns whether delivery succeeded.
    fn notify(&mut self, color: SubjectColor, evidence: Option<&Path>) -> bool;
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn notify(&mut self, color: SubjectColor, evidence: Option<&Path>) -> bool {
        (**self).notify(color, evidence)
    }
}
