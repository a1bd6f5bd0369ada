//! Query API for UI consumption
//!
//! Provides high-level query functions that return data formatted
//! for display in the front end.

mod attachment;
mod listing;
mod thread;

pub use attachment::fetch_attachment;
pub use listing::{EMAILS_PER_PAGE, EmailPage, EmailSummary, list_emails, summarize_message};
pub use thread::{
    DigestAttachment, DigestContent, DigestMetadata, MessageDigest, ThreadMessage,
    ThreadNotFound, digest_message, get_thread_messages, get_thread_view, render_message,
};
