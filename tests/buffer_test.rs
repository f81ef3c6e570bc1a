//! Word buffer contract tests

use invdict::buffer::{BufferState, Extracted, WordBuffer};
use invdict::cancel::CancelToken;
use std::sync::Arc;
use std::thread;

/// Drain until done, skipping spurious empty batches
fn drain_all(buffer: &WordBuffer, cancel: &CancelToken) -> (Vec<String>, usize) {
    let mut words = Vec::new();
    let mut batches = 0;
    loop {
        match buffer.extract_all(cancel) {
            Extracted::Batch(batch) if batch.is_empty() => continue,
            Extracted::Batch(batch) => {
                batches += 1;
                words.extend(batch);
            }
            Extracted::Done => return (words, batches),
            Extracted::Cancelled => panic!("unexpected cancellation"),
        }
    }
}

#[test]
fn test_graceful_close_delivers_everything_once() {
    for count in [0usize, 1, 7, 64] {
        let buffer = WordBuffer::new();
        let cancel = CancelToken::new();
        let expected: Vec<String> = (0..count).map(|i| format!("word{}", i % 5)).collect();

        for word in &expected {
            buffer.add(word.clone()).unwrap();
        }
        buffer.close(false);

        let (words, _) = drain_all(&buffer, &cancel);
        assert_eq!(words, expected);
        assert_eq!(buffer.extract_all(&cancel), Extracted::Done);
    }
}

#[test]
fn test_close_with_clear_at_any_point() {
    for added in 0..4 {
        let buffer = WordBuffer::new();
        let cancel = CancelToken::new();
        for i in 0..added {
            buffer.add(format!("w{}", i)).unwrap();
        }
        buffer.close(true);
        assert_eq!(buffer.state(), BufferState::ClosedEmpty);
        assert_eq!(buffer.extract_all(&cancel), Extracted::Done);
    }
}

#[test]
fn test_add_after_close_never_enqueues() {
    for clear in [false, true] {
        let buffer = WordBuffer::new();
        let cancel = CancelToken::new();
        buffer.close(clear);
        for _ in 0..3 {
            assert!(buffer.add("late").unwrap_err().is_closed());
        }
        assert_eq!(buffer.extract_all(&cancel), Extracted::Done);
    }
}

#[test]
fn test_state_machine() {
    let buffer = WordBuffer::new();
    let cancel = CancelToken::new();
    assert_eq!(buffer.state(), BufferState::Open);

    buffer.add("last").unwrap();
    buffer.close(false);
    assert_eq!(buffer.state(), BufferState::ClosedDraining);

    buffer.extract_all(&cancel);
    assert_eq!(buffer.state(), BufferState::ClosedEmpty);

    buffer.close(false);
    assert_eq!(buffer.state(), BufferState::ClosedEmpty);
    assert!(buffer.is_closed());
}

#[test]
fn test_concurrent_use_does_not_deadlock() {
    for round in 0..20 {
        let buffer = Arc::new(WordBuffer::new());
        let cancel = CancelToken::new();

        let producer = {
            let buffer = buffer.clone();
            thread::spawn(move || {
                let mut accepted = Vec::new();
                for i in 0..200 {
                    let word = format!("r{}w{}", round, i);
                    match buffer.add(word.clone()) {
                        Ok(()) => accepted.push(word),
                        Err(e) => {
                            assert!(e.is_closed());
                            break;
                        }
                    }
                }
                buffer.close(false);
                accepted
            })
        };

        let closer = {
            let buffer = buffer.clone();
            thread::spawn(move || {
                if round % 2 == 0 {
                    buffer.close(false);
                }
            })
        };

        let (words, _) = drain_all(&buffer, &cancel);
        let accepted = producer.join().unwrap();
        closer.join().unwrap();

        assert!(buffer.is_closed());
        assert_eq!(words, accepted);
    }
}

#[test]
fn test_clear_from_consumer_side_while_producing() {
    let buffer = Arc::new(WordBuffer::new());
    let cancel = CancelToken::new();
    buffer.add("a").unwrap();

    assert_eq!(
        buffer.extract_all(&cancel),
        Extracted::Batch(vec!["a".to_string()])
    );
    buffer.add("b").unwrap();
    buffer.close(true);

    let producer = {
        let buffer = buffer.clone();
        thread::spawn(move || buffer.add("c"))
    };
    assert!(producer.join().unwrap().unwrap_err().is_closed());
    assert_eq!(buffer.extract_all(&cancel), Extracted::Done);
}
