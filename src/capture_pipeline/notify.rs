//! Notifier module
//!
//! Hands confirmed events to whatever turns them into a message. The capture
//! loop only needs a yes/no answer; a failed notification is logged and the
//! loop moves on.

mod command_notifier;
mod log_notifier;
mod notifier;

pub use command_notifier::CommandNotifier;
pub use log_notifier::LogNotifier;
pub use notifier::Notifier;
