//! Evidence storage module
//!
//! Persists confirmed-event frames into a flat directory of timestamp-named
//! files. The directory is shared with the retention sweep, which orders
//! files by modification time.

mod sink;

pub use sink::EvidenceSink;
