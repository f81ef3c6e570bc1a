//! Speaker abstraction
//!
//! The dispatch task hands each sentence to a `Speaker` and waits for it to
//! finish before draining the word buffer again.

use nix::sys::signal::Signal;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

/// How one spoken sentence ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakOutcome {
    Success,
    /// The speaker was stopped by the session's interrupt
    Interrupted,
    /// The speaker exited with this non-zero status
    Failed(i32),
}

impl SpeakOutcome {
    /// Classify a finished speaker process
    ///
    /// Death by SIGINT is an interruption; death by any other signal is
    /// reported shell-style as `128 + signal`.
    pub fn from_status(status: ExitStatus) -> Self {
        if status.success() {
            return SpeakOutcome::Success;
        }
        match (status.code(), status.signal()) {
            (Some(code), _) => SpeakOutcome::Failed(code),
            (None, Some(sig)) if sig == Signal::SIGINT as i32 => SpeakOutcome::Interrupted,
            (None, Some(sig)) => SpeakOutcome::Failed(128 + sig),
            (None, None) => SpeakOutcome::Failed(-1),
        }
    }
}

/// Text-to-speech collaborator
///
/// Calls block until the sentence has been spoken; there is never more than
/// one call in flight.
pub trait Speaker: Send {
    fn speak(&mut self, sentence: &str) -> SpeakOutcome;
}

impl<S: Speaker + ?Sized> Speaker for Box<S> {
    fn speak(&mut self, sentence: &str) -> SpeakOutcome {
        (**self).speak(sentence)
    }
}
