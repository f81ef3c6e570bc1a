//! Speech output through an external speaker program

pub mod command;
pub mod speaker;

pub use command::CommandSpeaker;
pub use speaker::{SpeakOutcome, Speaker};
