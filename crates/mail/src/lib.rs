//! Mail crate - Business logic for the Courier mailbox assistant
//!
//! This crate provides web-framework-independent functionality including:
//! - Gmail API client and OAuth session handling
//! - MIME part extraction and inline image rewriting
//! - Mailbox trait abstraction with an in-memory implementation
//! - Query API for listings, thread views and attachments
//! - Natural-language command mapping and execution via an LLM
//!
//! All provider calls are blocking; async callers should run them on a
//! blocking thread pool.

pub mod actions;
pub mod config;
pub mod gmail;
pub mod llm;
pub mod mailbox;
pub mod models;
pub mod query;

pub use actions::{ActionHandler, CommandResult, RawCommand, parse_commands};
pub use config::{AppConfig, GoogleCredentials, MistralConfig, ServerConfig};
pub use gmail::{
    AttachmentRef, AuthError, DecodeError, ExtractedParts, GmailAuth, GmailClient, ImageRef,
    SessionToken, VerifiedToken, extract_parts, extract_parts_into, rewrite_inline_images,
};
pub use llm::{LanguageModel, MistralClient, ResponseFormat, ScriptedModel};
pub use mailbox::{InMemoryMailbox, Mailbox, MessageFilter};
pub use models::{MessageId, ThreadId};
pub use query::{
    EmailPage, EmailSummary, MessageDigest, ThreadMessage, ThreadNotFound, digest_message,
    fetch_attachment, get_thread_view, list_emails,
};
