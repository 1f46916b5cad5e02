//! Frame differencing module
//!
//! The single comparison primitive behind both motion detection (against the
//! previous detection frame) and presence detection (against the reference
//! image).

mod differ;
pub mod types;

pub use differ::{FrameDiffer, score};
pub use types::{DiffParams, DiffResult};
