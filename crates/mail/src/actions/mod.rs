//! Natural-language mailbox commands
//!
//! A user request is mapped by the language model into a list of commands,
//! which are then executed one by one against the mailbox.

mod command;
mod compose;
mod handler;
mod prompts;

pub use command::{Command, RawCommand, parse_commands};
pub use compose::compose_message;
pub use handler::{
    ActionHandler, CommandError, CommandResult, EmailDetails, GeneratedReply, ReplyMetadata,
    SuggestedAttachment,
};
