//! Keyboard input: character sources and control codes

pub mod source;
pub mod stdin;

pub use source::{CharSource, ReadOutcome, ReaderSource};
pub use stdin::StdinSource;

/// End-of-transmission (Ctrl+D in raw mode)
pub const EOT: char = '\x04';
/// DEL, sent by the backspace key on most terminals
pub const ERASE: char = '\x7f';
/// ^H, sent as backspace by some terminals
pub const ERASE_ALT: char = '\x08';

/// Punctuation that may appear inside a word
pub const WORD_PUNCTUATION: &[char] = &['\'', '"', '.', ',', ';', '!', '?'];

/// Whether `ch` belongs to a word rather than separating words
pub fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || WORD_PUNCTUATION.contains(&ch)
}

/// Whether `ch` erases the previous character
pub fn is_erase(ch: char) -> bool {
    ch == ERASE || ch == ERASE_ALT
}
