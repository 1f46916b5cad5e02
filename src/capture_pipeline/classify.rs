//! Event classification module
//!
//! Decides whether a captured frame plausibly shows an event subject and
//! whether that subject looks light or dark. The heuristics here are
//! approximate by nature: false positives and negatives are expected and are
//! absorbed by the capture cooldown and by manual review of stored evidence.

mod classifier;
mod heuristic_classifier;
mod otsu;
mod regions;
pub mod types;

pub use classifier::SubjectClassifier;
pub use heuristic_classifier::HeuristicClassifier;
pub use otsu::{binarize_above, otsu_threshold};
pub use regions::region_areas;
pub use types::{ClassifierConfig, SubjectColor};
