use crate::capture_pipeline::common::error::Result;

/// A digital input polled for its current level.
pub trait TriggerSensor {
    /// `true` when the line is high.
    fn poll_level(&mut self) -> Result<bool>;
}

impl<S: TriggerSensor + ?Sized> TriggerSensor for Box<S> {
    fn poll_level(&mut self) -> Result<bool> {
        (**self).poll_level()
    }
}
