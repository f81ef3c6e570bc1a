//! Character sources for the capture task

use crate::cancel::CancelToken;
use crate::Result;
use std::io::{self, Read};

/// What a single read produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    Char(char),
    /// The input stream ended (empty read)
    Eof,
    /// Cancellation was observed before a character arrived
    Cancelled,
}

/// Something that yields one character at a time
pub trait CharSource {
    fn read_char(&mut self, cancel: &CancelToken) -> Result<ReadOutcome>;
}

/// Decodes UTF-8 characters from any byte reader, one read(2) per byte
///
/// Invalid or truncated sequences decode to U+FFFD.
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.reader.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

/// Length of the UTF-8 sequence introduced by `lead`, if it is a valid lead byte
pub(super) fn sequence_len(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7f => Some(1),
        0xc2..=0xdf => Some(2),
        0xe0..=0xef => Some(3),
        0xf0..=0xf4 => Some(4),
        _ => None,
    }
}

impl<R: Read> CharSource for ReaderSource<R> {
    fn read_char(&mut self, cancel: &CancelToken) -> Result<ReadOutcome> {
        if cancel.is_cancelled() {
            return Ok(ReadOutcome::Cancelled);
        }

        let lead = match self.read_byte()? {
            Some(b) => b,
            None => return Ok(ReadOutcome::Eof),
        };

        let len = match sequence_len(lead) {
            Some(1) => return Ok(ReadOutcome::Char(lead as char)),
            Some(n) => n,
            None => return Ok(ReadOutcome::Char(char::REPLACEMENT_CHARACTER)),
        };

        let mut bytes = [lead, 0, 0, 0];
        for slot in bytes.iter_mut().take(len).skip(1) {
            match self.read_byte()? {
                Some(b) if b & 0xc0 == 0x80 => *slot = b,
                _ => return Ok(ReadOutcome::Char(char::REPLACEMENT_CHARACTER)),
            }
        }

        let ch = std::str::from_utf8(&bytes[..len])
            .ok()
            .and_then(|s| s.chars().next())
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        Ok(ReadOutcome::Char(ch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_all(bytes: &[u8]) -> Vec<ReadOutcome> {
        let cancel = CancelToken::new();
        let mut source = ReaderSource::new(Cursor::new(bytes.to_vec()));
        let mut out = Vec::new();
        loop {
            let outcome = source.read_char(&cancel).unwrap();
            out.push(outcome);
            if outcome == ReadOutcome::Eof {
                return out;
            }
        }
    }

    #[test]
    fn test_ascii() {
        assert_eq!(
            read_all(b"hi"),
            vec![ReadOutcome::Char('h'), ReadOutcome::Char('i'), ReadOutcome::Eof]
        );
    }

    #[test]
    fn test_multibyte() {
        assert_eq!(
            read_all("é世".as_bytes()),
            vec![ReadOutcome::Char('é'), ReadOutcome::Char('世'), ReadOutcome::Eof]
        );
    }

    #[test]
    fn test_invalid_bytes_become_replacement() {
        let out = read_all(&[0xff, b'a']);
        assert_eq!(out[0], ReadOutcome::Char(char::REPLACEMENT_CHARACTER));
        assert_eq!(out[1], ReadOutcome::Char('a'));
    }

    #[test]
    fn test_truncated_sequence() {
        let out = read_all(&[0xe4, 0xb8]);
        assert_eq!(out[0], ReadOutcome::Char(char::REPLACEMENT_CHARACTER));
        assert_eq!(out[1], ReadOutcome::Eof);
    }

    #[test]
    fn test_cancelled_before_read() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut source = ReaderSource::new(Cursor::new(b"x".to_vec()));
        assert_eq!(source.read_char(&cancel).unwrap(), ReadOutcome::Cancelled);
    }
}
