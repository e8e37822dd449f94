//! Domain models for the mail relay

pub mod message;
pub mod submission;

pub use message::*;
pub use submission::*;
