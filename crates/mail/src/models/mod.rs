//! Domain models for mail entities

mod message;
mod thread;

pub use message::{MessageId, labels};
pub use thread::ThreadId;
