//! Terminal utilities

use crate::Result;
use nix::sys::termios::{self, LocalFlags, SetArg, Termios};
use std::os::fd::AsFd;

/// Switch a terminal to character-at-a-time input without echo
///
/// Only canonical mode and echo are turned off. Signal generation stays on
/// so Ctrl+C still interrupts the whole foreground process group, including
/// a speaker that is currently talking.
pub fn set_raw_mode<Fd: AsFd>(fd: Fd) -> Result<Termios> {
    let original = termios::tcgetattr(fd.as_fd())?;

    let mut raw = original.clone();
    raw.local_flags.remove(LocalFlags::ICANON | LocalFlags::ECHO);
    termios::tcsetattr(fd.as_fd(), SetArg::TCSANOW, &raw)?;

    Ok(original)
}

/// Restore terminal attributes saved by `set_raw_mode`
pub fn restore_termios<Fd: AsFd>(fd: Fd, saved: &Termios) -> Result<()> {
    termios::tcsetattr(fd.as_fd(), SetArg::TCSANOW, saved)?;
    Ok(())
}
