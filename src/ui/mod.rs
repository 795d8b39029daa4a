//! Terminal styling components for the chat client and CLI.

pub mod prompt;
mod spinner;
pub mod status;

pub use spinner::ThinkingSpinner;
pub use status::StatusLine;
