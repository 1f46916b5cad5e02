use std::path::Path;

use tracing::info;

use crate::capture_pipeline::classify::SubjectColor;
use crate::capture_pipeline::notify::notifier::Notifier;

/// Logs each event and always reports success.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, color: SubjectColor, evidence: Option<&Path>) -> bool {
        match evidence {
            Some(path) => info!(color = %color, path = %path.display(), "Subject detected"),
            None => info!(color = %color, "Subject detected (no evidence stored)"),
        }
        true
    }
}
