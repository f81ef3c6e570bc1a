//! Echo of typed characters back to the user

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use unicode_width::UnicodeWidthChar;

/// Visual backspace: step back, blank the column, step back again
const BACKSPACE: &[u8] = b"\x08 \x08";

/// Output side of the session
///
/// Since the terminal's own echo is off, every accepted keystroke is written
/// here. The line break at the end of the session is shared with the logger
/// through `newline_flag` so it is written exactly once.
pub struct Echo<W: Write> {
    out: W,
    newline_sent: Arc<AtomicBool>,
}

impl<W: Write> Echo<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            newline_sent: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Write a typed character as-is
    pub fn echo(&mut self, ch: char) -> io::Result<()> {
        let mut utf8 = [0u8; 4];
        self.out.write_all(ch.encode_utf8(&mut utf8).as_bytes())?;
        self.out.flush()
    }

    /// Visually remove `ch`, one backspace sequence per display column
    pub fn erase(&mut self, ch: char) -> io::Result<()> {
        let columns = ch.width().unwrap_or(1);
        for _ in 0..columns {
            self.out.write_all(BACKSPACE)?;
        }
        self.out.flush()
    }

    /// End the typing line unless that already happened
    pub fn newline_once(&mut self) -> io::Result<()> {
        if self.newline_sent.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.out.write_all(b"\n")?;
        self.out.flush()
    }

    /// Flag recording whether the trailing newline has been written
    pub fn newline_flag(&self) -> Arc<AtomicBool> {
        self.newline_sent.clone()
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_and_erase() {
        let mut echo = Echo::new(Vec::new());
        echo.echo('a').unwrap();
        echo.echo('é').unwrap();
        echo.erase('é').unwrap();
        assert_eq!(echo.into_inner(), "aé\x08 \x08".as_bytes());
    }

    #[test]
    fn test_wide_char_erases_two_columns() {
        let mut echo = Echo::new(Vec::new());
        echo.erase('世').unwrap();
        assert_eq!(echo.into_inner(), b"\x08 \x08\x08 \x08");
    }

    #[test]
    fn test_newline_once() {
        let mut echo = Echo::new(Vec::new());
        echo.newline_once().unwrap();
        echo.newline_once().unwrap();
        assert_eq!(echo.get_ref(), b"\n");
    }

    #[test]
    fn test_newline_suppressed_when_flag_taken() {
        let mut echo = Echo::new(Vec::new());
        echo.newline_flag().store(true, Ordering::SeqCst);
        echo.newline_once().unwrap();
        assert!(echo.get_ref().is_empty());
    }
}
