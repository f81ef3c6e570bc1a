//! Keyboard capture task
//!
//! Reads keystrokes one at a time, assembles words and pushes each finished
//! word into the shared buffer. A word is finished by any character that
//! cannot be part of one (usually a space or Enter).

use crate::buffer::WordBuffer;
use crate::cancel::CancelToken;
use crate::input::{is_erase, is_word_char, CharSource, ReadOutcome, EOT};
use crate::terminal::Echo;
use crate::Result;
use log::{debug, warn};
use std::io::Write;

/// Why the capture loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureEnd {
    /// Input ended (EOF or Ctrl+D); buffered words are kept
    EndOfInput,
    /// The speech side closed the buffer first
    DispatcherClosed,
    /// Interrupted; buffered words were discarded
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSummary {
    /// Words successfully handed to the buffer
    pub words: usize,
    pub end: CaptureEnd,
}

/// Run the capture loop until input ends, the buffer closes or `cancel` fires
///
/// Any error also closes the buffer (discarding pending words) so the speech
/// side never waits on a producer that is gone.
pub fn capture<S, W>(
    source: &mut S,
    buffer: &WordBuffer,
    echo: &mut Echo<W>,
    cancel: &CancelToken,
) -> Result<CaptureSummary>
where
    S: CharSource + ?Sized,
    W: Write,
{
    let result = capture_loop(source, buffer, echo, cancel);
    if let Err(e) = &result {
        warn!("Keyboard capture failed: {}", e);
        buffer.close(true);
    }
    debug!("Keyboard capture exited: {:?}", result);
    result
}

fn capture_loop<S, W>(
    source: &mut S,
    buffer: &WordBuffer,
    echo: &mut Echo<W>,
    cancel: &CancelToken,
) -> Result<CaptureSummary>
where
    S: CharSource + ?Sized,
    W: Write,
{
    let mut chars: Vec<char> = Vec::new();
    let mut words = 0;

    loop {
        let ch = match source.read_char(cancel)? {
            ReadOutcome::Cancelled => {
                buffer.close(true);
                return Ok(CaptureSummary {
                    words,
                    end: CaptureEnd::Cancelled,
                });
            }
            ReadOutcome::Eof | ReadOutcome::Char(EOT) => {
                if !chars.is_empty() {
                    debug!("Dropping unfinished word at end of input");
                }
                buffer.close(false);
                return Ok(CaptureSummary {
                    words,
                    end: CaptureEnd::EndOfInput,
                });
            }
            ReadOutcome::Char(ch) => ch,
        };

        if buffer.is_closed() {
            warn!("Speaker task ended but keyboard task did not");
            return Ok(CaptureSummary {
                words,
                end: CaptureEnd::DispatcherClosed,
            });
        }

        if is_word_char(ch) {
            chars.push(ch);
        } else if is_erase(ch) {
            if let Some(removed) = chars.pop() {
                echo.erase(removed)?;
            }
            continue;
        } else if !chars.is_empty() {
            let word: String = chars.drain(..).collect();
            match buffer.add(word) {
                Ok(()) => words += 1,
                Err(e) if e.is_closed() => {
                    warn!("{}", e);
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        echo.echo(ch)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Extracted;
    use crate::input::ReaderSource;
    use std::io::Cursor;

    fn run(input: &str, buffer: &WordBuffer) -> (CaptureSummary, Vec<u8>) {
        let cancel = CancelToken::new();
        let mut source = ReaderSource::new(Cursor::new(input.as_bytes().to_vec()));
        let mut echo = Echo::new(Vec::new());
        let summary = capture(&mut source, buffer, &mut echo, &cancel).unwrap();
        (summary, echo.into_inner())
    }

    fn drain(buffer: &WordBuffer) -> Vec<String> {
        match buffer.extract_all(&CancelToken::new()) {
            Extracted::Batch(batch) => batch,
            other => panic!("expected a batch, got {:?}", other),
        }
    }

    #[test]
    fn test_words_split_on_delimiters() {
        let buffer = WordBuffer::new();
        let (summary, echoed) = run("Don't stop, \"now\"!\n\x04", &buffer);

        assert_eq!(summary.words, 3);
        assert_eq!(summary.end, CaptureEnd::EndOfInput);
        assert_eq!(drain(&buffer), vec!["Don't", "stop,", "\"now\"!"]);
        assert_eq!(echoed, b"Don't stop, \"now\"!\n");
    }

    #[test]
    fn test_unfinished_word_dropped_at_eof() {
        let buffer = WordBuffer::new();
        let (summary, _) = run("hello wor", &buffer);

        assert_eq!(summary.words, 1);
        assert_eq!(drain(&buffer), vec!["hello"]);
        assert_eq!(buffer.extract_all(&CancelToken::new()), Extracted::Done);
    }

    #[test]
    fn test_erase_edits_current_word() {
        let buffer = WordBuffer::new();
        let (_, echoed) = run("cay\x7ft \x04", &buffer);

        assert_eq!(drain(&buffer), vec!["cat"]);
        assert_eq!(echoed, b"cay\x08 \x08t ");
    }

    #[test]
    fn test_delimiters_without_word_are_echoed_only() {
        let buffer = WordBuffer::new();
        let (summary, echoed) = run("  -\x04", &buffer);

        assert_eq!(summary.words, 0);
        assert_eq!(echoed, b"  -");
        assert_eq!(buffer.extract_all(&CancelToken::new()), Extracted::Done);
    }

    #[test]
    fn test_stops_when_buffer_already_closed() {
        let buffer = WordBuffer::new();
        buffer.close(true);
        let (summary, echoed) = run("more words here", &buffer);

        assert_eq!(summary.end, CaptureEnd::DispatcherClosed);
        assert_eq!(summary.words, 0);
        assert!(echoed.is_empty());
    }

    #[test]
    fn test_cancel_discards_pending_words() {
        let buffer = WordBuffer::new();
        buffer.add("earlier").unwrap();

        let cancel = CancelToken::new();
        cancel.cancel();
        let mut source = ReaderSource::new(Cursor::new(b"ignored ".to_vec()));
        let mut echo = Echo::new(Vec::new());
        let summary = capture(&mut source, &buffer, &mut echo, &cancel).unwrap();

        assert_eq!(summary.end, CaptureEnd::Cancelled);
        assert_eq!(buffer.extract_all(&CancelToken::new()), Extracted::Done);
    }
}
