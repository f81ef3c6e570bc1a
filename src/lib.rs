//! invdict - inverse dictation
//!
//! Speaks out, word by word, whatever you type. Keystrokes are captured in
//! the foreground and finished words are handed through a shared buffer to a
//! background task that feeds them to an external speech program, so fast
//! typing never waits on speech.

pub mod buffer;
pub mod cancel;
pub mod capture;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod input;
pub mod session;
pub mod speech;
pub mod terminal;

pub use error::{InvDictError, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "invdict";
