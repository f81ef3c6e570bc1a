//! Shared test doubles: a scripted keyboard and a recording speaker

#![allow(dead_code)]

use invdict::cancel::CancelToken;
use invdict::input::{CharSource, ReadOutcome};
use invdict::speech::{SpeakOutcome, Speaker};
use invdict::Result;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// What the scripted keyboard does after its last character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ending {
    Eof,
    /// Fire the cancellation token, as Ctrl+C would
    Interrupt,
}

pub struct ScriptedSource {
    chars: VecDeque<char>,
    ending: Ending,
}

impl ScriptedSource {
    pub fn new(text: &str, ending: Ending) -> Self {
        Self {
            chars: text.chars().collect(),
            ending,
        }
    }
}

impl CharSource for ScriptedSource {
    fn read_char(&mut self, cancel: &CancelToken) -> Result<ReadOutcome> {
        if cancel.is_cancelled() {
            return Ok(ReadOutcome::Cancelled);
        }
        match self.chars.pop_front() {
            Some(ch) => Ok(ReadOutcome::Char(ch)),
            None => match self.ending {
                Ending::Eof => Ok(ReadOutcome::Eof),
                Ending::Interrupt => {
                    cancel.cancel();
                    Ok(ReadOutcome::Cancelled)
                }
            },
        }
    }
}

/// Speaker that records every sentence and answers with scripted outcomes
#[derive(Clone)]
pub struct RecordingSpeaker {
    spoken: Arc<Mutex<Vec<String>>>,
    outcomes: Arc<Mutex<VecDeque<SpeakOutcome>>>,
}

impl RecordingSpeaker {
    pub fn new() -> Self {
        Self::with_outcomes(Vec::new())
    }

    pub fn with_outcomes(outcomes: Vec<SpeakOutcome>) -> Self {
        Self {
            spoken: Arc::new(Mutex::new(Vec::new())),
            outcomes: Arc::new(Mutex::new(outcomes.into())),
        }
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

impl Speaker for RecordingSpeaker {
    fn speak(&mut self, sentence: &str) -> SpeakOutcome {
        self.spoken.lock().unwrap().push(sentence.to_string());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(SpeakOutcome::Success)
    }
}
