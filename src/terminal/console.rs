//! Input capability: how the keyboard is put into single-keystroke mode
//!
//! The mode is chosen once at startup and held by a `ConsoleGuard`, which
//! puts the terminal back the way it found it when dropped.

use super::util::{restore_termios, set_raw_mode};
use crate::Result;
use log::{debug, warn};
use nix::sys::termios::Termios;
use std::io::{self, IsTerminal};

/// How keystrokes reach the capture task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Interactive Unix terminal switched to non-canonical, no-echo mode
    UnixRaw,
    /// stdin is a pipe or file; read it as-is
    Passthrough,
}

impl InputMode {
    /// Pick the mode for the current stdin
    pub fn detect() -> Self {
        if io::stdin().is_terminal() {
            InputMode::UnixRaw
        } else {
            InputMode::Passthrough
        }
    }

    /// Acquire the mode for the lifetime of the returned guard
    pub fn acquire(self) -> Result<ConsoleGuard> {
        let saved = match self {
            InputMode::UnixRaw => {
                let saved = set_raw_mode(io::stdin())?;
                debug!("Terminal switched to raw input");
                Some(saved)
            }
            InputMode::Passthrough => {
                debug!("stdin is not a terminal, reading input as-is");
                None
            }
        };
        Ok(ConsoleGuard { mode: self, saved })
    }
}

/// RAII guard to restore terminal on exit
pub struct ConsoleGuard {
    mode: InputMode,
    saved: Option<Termios>,
}

impl ConsoleGuard {
    pub fn mode(&self) -> InputMode {
        self.mode
    }
}

impl Drop for ConsoleGuard {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            match restore_termios(io::stdin(), &saved) {
                Ok(()) => debug!("Terminal attributes restored"),
                Err(e) => warn!("Failed to restore terminal attributes: {}", e),
            }
        }
    }
}
