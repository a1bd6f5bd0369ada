//! Mailbox abstraction
//!
//! The remote mailbox operations the views and command handler need.
//! [`GmailClient`](crate::GmailClient) talks to the Gmail API;
//! [`InMemoryMailbox`] backs tests and local development.

mod memory;
mod traits;

pub use memory::{InMemoryMailbox, SentMessage};
pub use traits::{Mailbox, MessageFilter};
