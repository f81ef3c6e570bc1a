//! Word buffer shared between the capture and dispatch tasks
//!
//! The capture task adds finished words; the dispatch task drains everything
//! pending in one step and speaks it as a sentence. Either side may close the
//! buffer. Closing is permanent and the first close decides whether pending
//! words are kept for one last drain or thrown away.

use crate::cancel::CancelToken;
use crate::{InvDictError, Result};
use log::debug;
use parking_lot::{Condvar, Mutex};

/// Result of one drain of the buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    /// Every word that was pending, in insertion order.
    ///
    /// May be empty on a spurious wake while the buffer is still open;
    /// callers should simply drain again.
    Batch(Vec<String>),
    /// The buffer is closed and nothing is left.
    Done,
    /// Cancellation was observed while waiting for data.
    Cancelled,
}

/// Lifecycle of the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    Open,
    /// Closed, with a final batch still waiting to be drained
    ClosedDraining,
    ClosedEmpty,
}

#[derive(Default)]
struct Words {
    pending: Vec<String>,
    closed: bool,
}

/// Binary readiness signal (a settable event)
#[derive(Default)]
struct Readiness {
    flag: Mutex<bool>,
    cond: Condvar,
}

impl Readiness {
    fn set(&self) {
        *self.flag.lock() = true;
        self.cond.notify_all();
    }

    fn clear(&self) {
        *self.flag.lock() = false;
    }

    /// Wake waiters without changing the flag
    fn nudge(&self) {
        let _flag = self.flag.lock();
        self.cond.notify_all();
    }

    /// Block until set; returns false if cancellation came first
    fn wait(&self, cancel: &CancelToken) -> bool {
        let mut flag = self.flag.lock();
        loop {
            if cancel.is_cancelled() {
                return false;
            }
            if *flag {
                return true;
            }
            self.cond.wait(&mut flag);
        }
    }
}

/// Lock-protected mailbox of captured but not yet spoken words
#[derive(Default)]
pub struct WordBuffer {
    words: Mutex<Words>,
    available: Readiness,
}

impl WordBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a word
    ///
    /// Fails with `InvDictError::Closed` once the buffer has been closed; the
    /// word is not enqueued in that case.
    pub fn add(&self, word: impl Into<String>) -> Result<()> {
        let mut words = self.words.lock();
        if words.closed {
            return Err(InvDictError::Closed);
        }
        words.pending.push(word.into());
        self.available.set();
        Ok(())
    }

    /// Close the buffer for writing
    ///
    /// With `clear`, pending words are discarded in the same step. Only the
    /// first call has any effect; returns whether this call closed it.
    pub fn close(&self, clear: bool) -> bool {
        let mut words = self.words.lock();
        let first = !words.closed;
        if first {
            words.closed = true;
            if clear {
                debug!("Closing word buffer, discarding {} words", words.pending.len());
                words.pending.clear();
            } else {
                debug!("Closing word buffer, keeping {} words", words.pending.len());
            }
        }
        self.available.set();
        first
    }

    pub fn is_closed(&self) -> bool {
        self.words.lock().closed
    }

    pub fn state(&self) -> BufferState {
        let words = self.words.lock();
        match (words.closed, words.pending.is_empty()) {
            (false, _) => BufferState::Open,
            (true, false) => BufferState::ClosedDraining,
            (true, true) => BufferState::ClosedEmpty,
        }
    }

    /// Wake a consumer blocked in `extract_all` so it re-checks `cancel`
    pub fn wake(&self) {
        self.available.nudge();
    }

    /// Take everything pending, blocking until there is something to report
    pub fn extract_all(&self, cancel: &CancelToken) -> Extracted {
        if !self.available.wait(cancel) {
            return Extracted::Cancelled;
        }

        let mut words = self.words.lock();
        if !words.closed {
            self.available.clear();
        }

        if !words.pending.is_empty() {
            Extracted::Batch(std::mem::take(&mut words.pending))
        } else if words.closed {
            Extracted::Done
        } else {
            Extracted::Batch(Vec::new())
        }
    }
}
