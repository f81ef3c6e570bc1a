//! Session orchestration
//!
//! Starts the dispatch task on its own thread, switches the keyboard into
//! single-keystroke mode and runs the capture loop in the foreground. The
//! two tasks only meet at the shared word buffer: whichever side stops first
//! closes it and the other notices.

use crate::buffer::WordBuffer;
use crate::cancel::CancelToken;
use crate::capture::{capture, CaptureSummary};
use crate::dispatch::{dispatch, DispatchEnd, DispatchSummary};
use crate::input::CharSource;
use crate::speech::Speaker;
use crate::terminal::{Echo, InputMode};
use crate::{InvDictError, Result};
use log::{debug, info};
use std::io::Write;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Handle on the running dispatch thread
pub struct DispatchHandle {
    handle: JoinHandle<DispatchSummary>,
}

impl DispatchHandle {
    /// Block until the dispatch thread has finished
    ///
    /// A speaker that exited with a failure status is a `SpeakerFailure`.
    pub fn wait(self) -> Result<DispatchSummary> {
        let summary = self
            .handle
            .join()
            .map_err(|_| InvDictError::Other("speech dispatch thread panicked".to_string()))?;
        match summary.end {
            DispatchEnd::SpeakerFailed(code) => Err(InvDictError::SpeakerFailure(code)),
            _ => Ok(summary),
        }
    }
}

/// What a session leaves behind once capture has returned
pub struct SessionOutcome {
    pub capture: CaptureSummary,
    /// Still running while the final batch is spoken
    pub dispatcher: DispatchHandle,
}

/// Start the dispatch task on a named thread
pub fn start_dispatcher<S>(
    buffer: Arc<WordBuffer>,
    mut speaker: S,
    cancel: CancelToken,
) -> Result<DispatchHandle>
where
    S: Speaker + 'static,
{
    let handle = thread::Builder::new()
        .name("speech-dispatch".to_string())
        .spawn(move || dispatch(&buffer, &mut speaker, &cancel))?;
    Ok(DispatchHandle { handle })
}

/// Run one dictation session
///
/// Returns once the capture loop is over. The input mode is restored and the
/// trailing newline written on every path out of here, errors included.
pub fn run<S, C, W>(
    speaker: S,
    source: &mut C,
    echo: &mut Echo<W>,
    mode: InputMode,
    cancel: &CancelToken,
) -> Result<SessionOutcome>
where
    S: Speaker + 'static,
    C: CharSource + ?Sized,
    W: Write,
{
    let buffer = Arc::new(WordBuffer::new());
    let dispatcher = start_dispatcher(buffer.clone(), speaker, cancel.clone())?;
    debug!("Speech dispatch started");

    let guard = match mode.acquire() {
        Ok(guard) => guard,
        Err(e) => {
            buffer.close(true);
            return Err(e);
        }
    };
    info!("Ready for input ({:?})", guard.mode());

    let captured = capture(source, &buffer, echo, cancel);
    let newline = echo.newline_once();
    drop(guard);

    let capture = captured?;
    newline?;
    info!("Session finished: {:?}", capture);

    Ok(SessionOutcome {
        capture,
        dispatcher,
    })
}
