//! Cancellation token and interrupt wiring
//!
//! A single `CancelToken` is shared by the capture and dispatch tasks. Each
//! blocking point (character read, buffer wait, speaker run) registers a wake
//! hook so that an interrupt reaches it without the tasks talking to each
//! other directly.

use crate::{InvDictError, Result};
use log::{debug, info, warn};
use nix::libc;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::fs::File;
use std::io::{self, Read};
use std::os::unix::io::{IntoRawFd, RawFd};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

type Hook = Box<dyn FnOnce() + Send>;

struct Inner {
    cancelled: AtomicBool,
    hooks: Mutex<Vec<Hook>>,
}

/// Shared, monotonic cancellation flag with wake hooks
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                hooks: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Cancel the token and run every registered hook once.
    ///
    /// Later calls are no-ops.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        let hooks = std::mem::take(&mut *self.inner.hooks.lock());
        debug!("Cancellation requested, waking {} blocked points", hooks.len());
        for hook in hooks {
            hook();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Register a hook to run on cancellation.
    ///
    /// If the token is already cancelled the hook runs immediately.
    pub fn on_cancel<F>(&self, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut hooks = self.inner.hooks.lock();
        if self.is_cancelled() {
            drop(hooks);
            hook();
        } else {
            hooks.push(Box::new(hook));
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Write end of the self-pipe used by the SIGINT handler
static INTERRUPT_PIPE: OnceCell<RawFd> = OnceCell::new();

/// SIGINT handler - only async-signal-safe work happens here
extern "C" fn handle_sigint(_: libc::c_int) {
    if let Some(&fd) = INTERRUPT_PIPE.get() {
        let byte = [1u8];
        unsafe {
            libc::write(fd, byte.as_ptr() as *const libc::c_void, 1);
        }
    }
}

/// Route SIGINT (Ctrl+C) to `token`
///
/// The handler writes to a pipe; a watcher thread reads it and cancels the
/// token. Can only be installed once per process.
pub fn install_interrupt_handler(token: CancelToken) -> Result<()> {
    let (read_end, write_end) = nix::unistd::pipe()?;

    INTERRUPT_PIPE
        .set(write_end.into_raw_fd())
        .map_err(|_| InvDictError::Other("interrupt handler already installed".to_string()))?;

    let action = SigAction::new(
        SigHandler::Handler(handle_sigint),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    unsafe { signal::sigaction(Signal::SIGINT, &action) }?;

    thread::Builder::new()
        .name("interrupt-watch".to_string())
        .spawn(move || {
            let mut pipe = File::from(read_end);
            let mut byte = [0u8; 1];
            loop {
                match pipe.read(&mut byte) {
                    Ok(0) => break,
                    Ok(_) => {
                        info!("Interrupt received");
                        token.cancel();
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        warn!("Interrupt watcher stopped: {}", e);
                        break;
                    }
                }
            }
        })?;

    debug!("SIGINT handler installed");
    Ok(())
}
