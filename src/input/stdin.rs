//! Standard input as a cancellable character source

use super::source::{sequence_len, CharSource, ReadOutcome};
use crate::cancel::CancelToken;
use crate::Result;
use log::debug;
use mio::unix::SourceFd;
use mio::{Events, Interest, Poll, Token, Waker};
use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::unistd::dup;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, Read};
use std::os::unix::io::{AsFd, AsRawFd, FromRawFd, OwnedFd};

/// Token for stdin in mio poll
const STDIN: Token = Token(0);
/// Token for the cancellation waker
const WAKE: Token = Token(1);

/// Reads keystrokes from stdin, waking up when the session is cancelled
///
/// Everything the descriptor has to offer is pulled in after each wake-up
/// and kept in `pending`, so a paste or a pipe is never left half read while
/// the edge-triggered poller waits for more.
pub struct StdinSource {
    file: File,
    pending: VecDeque<u8>,
    eof: bool,
    /// None when stdin cannot be polled (regular files); reads then block
    poll: Option<(Poll, Events)>,
}

impl StdinSource {
    pub fn new(cancel: &CancelToken) -> Result<Self> {
        let fd = dup(io::stdin().as_raw_fd())?;
        let owned = unsafe { OwnedFd::from_raw_fd(fd) };
        Self::from_fd(owned, cancel)
    }

    /// Read keystrokes from any descriptor, e.g. one end of a pipe
    pub fn from_fd(fd: OwnedFd, cancel: &CancelToken) -> Result<Self> {
        let file = File::from(fd);

        let poll = Poll::new()?;
        let raw = file.as_raw_fd();
        let registered = poll
            .registry()
            .register(&mut SourceFd(&raw), STDIN, Interest::READABLE);
        let poll = match registered {
            Ok(()) => {
                let waker = Waker::new(poll.registry(), WAKE)?;
                cancel.on_cancel(move || {
                    if let Err(e) = waker.wake() {
                        debug!("Failed to wake stdin poller: {}", e);
                    }
                });
                debug!("Polling stdin with mio");
                Some((poll, Events::with_capacity(8)))
            }
            Err(e) => {
                debug!("stdin cannot be polled ({}), using blocking reads", e);
                None
            }
        };

        Ok(Self {
            file,
            pending: VecDeque::new(),
            eof: false,
            poll,
        })
    }

    /// Whether a read would return right away
    fn readable_now(&self) -> Result<bool> {
        let mut fds = [PollFd::new(self.file.as_fd(), PollFlags::POLLIN)];
        loop {
            match poll(&mut fds, PollTimeout::ZERO) {
                Ok(0) => return Ok(false),
                Ok(_) => {
                    let ready = PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR;
                    return Ok(fds[0].revents().map_or(false, |r| r.intersects(ready)));
                }
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// One read(2) into `pending`; returns the number of bytes added
    fn read_chunk(&mut self) -> Result<usize> {
        let mut buf = [0u8; 4096];
        loop {
            match self.file.read(&mut buf) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(0);
                }
                Ok(n) => {
                    self.pending.extend(&buf[..n]);
                    return Ok(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Pull in everything that can be read without blocking
    fn drain(&mut self) -> Result<()> {
        while !self.eof && self.readable_now()? {
            self.read_chunk()?;
        }
        Ok(())
    }

    /// Block until stdin has news or the waker fires
    fn wait_readable(&mut self) -> Result<()> {
        if let Some((ref mut poll, ref mut events)) = self.poll {
            match poll.poll(events, None) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Make sure `want` bytes are queued, or input has ended
    ///
    /// Returns false when cancelled first.
    fn fill(&mut self, want: usize, cancel: &CancelToken) -> Result<bool> {
        while self.pending.len() < want && !self.eof {
            if cancel.is_cancelled() {
                return Ok(false);
            }
            if self.poll.is_none() {
                self.read_chunk()?;
                continue;
            }
            self.drain()?;
            if self.pending.len() < want && !self.eof && !cancel.is_cancelled() {
                self.wait_readable()?;
            }
        }
        Ok(true)
    }

    /// Decode one character from the front of `pending`
    fn pop_char(&mut self) -> Option<char> {
        let lead = self.pending.pop_front()?;
        let len = match sequence_len(lead) {
            Some(1) => return Some(lead as char),
            Some(n) => n,
            None => return Some(char::REPLACEMENT_CHARACTER),
        };

        let mut bytes = [lead, 0, 0, 0];
        for slot in bytes.iter_mut().take(len).skip(1) {
            match self.pending.front() {
                Some(&b) if b & 0xc0 == 0x80 => {
                    *slot = b;
                    self.pending.pop_front();
                }
                _ => return Some(char::REPLACEMENT_CHARACTER),
            }
        }

        let ch = std::str::from_utf8(&bytes[..len])
            .ok()
            .and_then(|s| s.chars().next())
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        Some(ch)
    }
}

impl CharSource for StdinSource {
    fn read_char(&mut self, cancel: &CancelToken) -> Result<ReadOutcome> {
        if cancel.is_cancelled() || !self.fill(1, cancel)? {
            return Ok(ReadOutcome::Cancelled);
        }

        let want = match self.pending.front() {
            Some(&lead) => sequence_len(lead).unwrap_or(1),
            None => return Ok(ReadOutcome::Eof),
        };
        if !self.fill(want, cancel)? {
            return Ok(ReadOutcome::Cancelled);
        }

        Ok(self
            .pop_char()
            .map_or(ReadOutcome::Eof, ReadOutcome::Char))
    }
}
