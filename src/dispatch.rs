//! Speech dispatch task
//!
//! Drains the word buffer and speaks each drained batch as one sentence.
//! While a sentence is being spoken, new words pile up in the buffer and go
//! out together with the next drain.

use crate::buffer::{Extracted, WordBuffer};
use crate::cancel::CancelToken;
use crate::speech::{SpeakOutcome, Speaker};
use log::{debug, warn};
use std::sync::Arc;

/// Why the dispatch loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchEnd {
    /// The buffer was closed and fully drained
    Done,
    /// Cancellation observed while waiting for words
    Cancelled,
    /// The speaker was stopped by the interrupt
    Interrupted,
    /// The speaker exited with this status
    SpeakerFailed(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Sentences spoken to completion
    pub sentences: usize,
    pub end: DispatchEnd,
}

/// Run the dispatch loop until the buffer is done, `cancel` fires or the
/// speaker fails
///
/// Every way out other than `Done` closes the buffer and discards whatever is
/// still pending. Failures are not retried.
pub fn dispatch<S>(buffer: &Arc<WordBuffer>, speaker: &mut S, cancel: &CancelToken) -> DispatchSummary
where
    S: Speaker + ?Sized,
{
    let waker = buffer.clone();
    cancel.on_cancel(move || waker.wake());

    let mut sentences = 0;
    let end = loop {
        let batch = match buffer.extract_all(cancel) {
            Extracted::Done => break DispatchEnd::Done,
            Extracted::Cancelled => {
                buffer.close(true);
                break DispatchEnd::Cancelled;
            }
            Extracted::Batch(batch) => batch,
        };
        if batch.is_empty() {
            continue;
        }

        let sentence = batch.join(" ");
        match speaker.speak(&sentence) {
            SpeakOutcome::Success => sentences += 1,
            SpeakOutcome::Interrupted => {
                buffer.close(true);
                debug!("Speaker interrupted");
                break DispatchEnd::Interrupted;
            }
            SpeakOutcome::Failed(code) => {
                buffer.close(true);
                warn!("Speaker failed with exit status {}", code);
                break DispatchEnd::SpeakerFailed(code);
            }
        }
    };

    debug!("Speech dispatch exited: {:?} after {} sentences", end, sentences);
    DispatchSummary { sentences, end }
}
