//! Driver loop: walks the buffer one window at a time.
//!
//! Each iteration compares the current window against the delimiter and
//! carriage return only. Its quote and newline masks were produced by the
//! previous iteration's lookahead, which compares the next window against
//! those two classes. The current window is then resolved against the carried
//! state, sanitized in place and queued if the slow path must look at it. The
//! loop halts at the end of the buffer, at an explicit end bound, or as soon
//! as the deferred queue fills.
//!
//! When the buffer ends exactly on a window boundary, a quote in its last
//! byte may pair with a quote opening the next buffer. Both windows at such a
//! seam are deferred: the last one here, the first one in the next call via
//! [`ScanState::trailing_quote`].

use super::config::ScanConfig;
use super::queue::DeferredQueue;
use super::quote::ResolverInput;
use super::simd::Backend;
use super::window::{Window, WINDOW_SIZE};
use super::{HaltReason, ScanOutcome, ScanState};
use crate::error::ScanError;

/// Check a start offset against the buffer.
fn check_start(start: usize, len: usize) -> Result<(), ScanError> {
    if start > len {
        return Err(ScanError::OffsetOutOfRange { offset: start, len });
    }
    if start % WINDOW_SIZE != 0 && start != len {
        return Err(ScanError::MisalignedOffset { offset: start });
    }
    Ok(())
}

/// Check an end bound against the start offset and the buffer.
fn check_end(start: usize, end: usize, len: usize) -> Result<(), ScanError> {
    if end > len {
        return Err(ScanError::OffsetOutOfRange { offset: end, len });
    }
    if end < start {
        return Err(ScanError::EndBeforeStart { start, end });
    }
    if end % WINDOW_SIZE != 0 && end != len {
        return Err(ScanError::MisalignedEnd { end });
    }
    Ok(())
}

/// Every window pushed from `start` on must follow the queue's last entry.
fn check_queue(deferred: &DeferredQueue<'_>, start: usize) -> Result<(), ScanError> {
    match deferred.last() {
        Some(&last) if last >= start => Err(ScanError::StaleQueue { last, start }),
        _ => Ok(()),
    }
}

/// Run the scan over `[start, end)`.
///
/// `end` limits which windows are processed, not what is read: the lookahead
/// of the last window still sees the real bytes after `end`, so consecutive
/// bounded scans produce exactly the output of one unbounded scan.
pub(crate) fn run(
    buffer: &mut [u8],
    config: &ScanConfig,
    backend: Backend,
    state: &mut ScanState,
    deferred: &mut DeferredQueue<'_>,
    start: usize,
    end: Option<usize>,
) -> Result<ScanOutcome, ScanError> {
    let len = buffer.len();
    check_start(start, len)?;
    let end = match end {
        Some(end) => {
            check_end(start, end, len)?;
            end
        }
        None => len,
    };
    let bound_halt = if end < len {
        HaltReason::EndBound
    } else {
        HaltReason::EndOfBuffer
    };

    if deferred.is_full() {
        log::debug!("deferred queue already full, nothing scanned at {}", start);
        return Ok(ScanOutcome {
            processed: start,
            halt: HaltReason::QueueFull,
        });
    }
    check_queue(deferred, start)?;
    if start >= end {
        return Ok(ScanOutcome {
            processed: start,
            halt: bound_halt,
        });
    }

    let quote_char = config.quote_char;
    let delimiter = config.delimiter;
    let filler = config.filler();

    let mut offset = start;
    let mut window = Window::load(buffer, offset, filler);
    let (mut quote, mut newline) = match state.pending_offset {
        Some(pending) if pending == offset => {
            (state.pending_quote_mask, state.pending_newline_mask)
        }
        _ => {
            let (quote, newline) = backend.lookahead_masks(window.bytes(), quote_char);
            (quote, newline | window.eof_newline())
        }
    };
    let mut seam_pair = state.trailing_quote && quote & 1 != 0;

    loop {
        let (separator, carriage_return) = backend.field_masks(window.bytes(), delimiter);

        let next_offset = offset + WINDOW_SIZE;
        let next = Window::load(buffer, next_offset, filler);
        let (quote_next, newline_next) = backend.lookahead_masks(next.bytes(), quote_char);
        let newline_next = newline_next | next.eof_newline();

        let resolved = backend.resolve(&ResolverInput {
            quote,
            separator,
            carriage_return,
            quote_next,
            newline,
            newline_next,
            quoted: state.inside_quotes,
            escape_carry: state.escape_carry,
        });

        backend.sanitize(window.bytes_mut(), &resolved, &config.sentinels);
        window.store(buffer);

        // Nothing follows a full final window in this buffer.
        let open_edge = next_offset == len && (quote >> (WINDOW_SIZE - 1)) != 0;
        let needs_deferral = resolved.needs_deferral || seam_pair || open_edge;
        seam_pair = false;

        state.inside_quotes = resolved.quoted;
        state.escape_carry = resolved.escape_carry;
        if next_offset < len {
            state.pending_quote_mask = quote_next;
            state.pending_newline_mask = newline_next;
            state.pending_offset = Some(next_offset);
            state.trailing_quote = false;
        } else {
            state.pending_quote_mask = 0;
            state.pending_newline_mask = 0;
            state.pending_offset = None;
            state.trailing_quote = (quote >> (window.valid_len() - 1)) & 1 != 0;
        }

        let processed = next_offset.min(len);

        if needs_deferral {
            if !deferred.push(offset) {
                let last = deferred.last().copied().unwrap_or(offset);
                return Err(ScanError::StaleQueue { last, start: offset });
            }
            log::trace!("deferred window at {}", offset);

            if deferred.is_full() {
                log::debug!(
                    "deferred queue full ({} entries), halting at {}",
                    deferred.len(),
                    processed
                );
                return Ok(ScanOutcome {
                    processed,
                    halt: HaltReason::QueueFull,
                });
            }
        }

        if next_offset >= end {
            log::debug!(
                "scanned [{}, {}) with {} backend, quoted at end: {}",
                start,
                processed,
                backend.name(),
                state.inside_quotes
            );
            return Ok(ScanOutcome {
                processed,
                halt: bound_halt,
            });
        }

        offset = next_offset;
        window = next;
        quote = quote_next;
        newline = newline_next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_all(buffer: &mut [u8], capacity: usize) -> (ScanOutcome, ScanState, Vec<usize>) {
        let mut slots = vec![0usize; capacity];
        let mut queue = DeferredQueue::new(&mut slots);
        let mut state = ScanState::default();
        let outcome = run(
            buffer,
            &ScanConfig::csv(),
            Backend::detect(),
            &mut state,
            &mut queue,
            0,
            None,
        )
        .unwrap();
        let deferred = queue.as_slice().to_vec();
        (outcome, state, deferred)
    }

    #[test]
    fn test_check_start() {
        assert!(check_start(0, 0).is_ok());
        assert!(check_start(64, 70).is_ok());
        assert!(check_start(70, 70).is_ok());
        assert_eq!(
            check_start(71, 70),
            Err(ScanError::OffsetOutOfRange { offset: 71, len: 70 })
        );
        assert_eq!(
            check_start(10, 70),
            Err(ScanError::MisalignedOffset { offset: 10 })
        );
    }

    #[test]
    fn test_check_end() {
        assert!(check_end(0, 64, 100).is_ok());
        assert!(check_end(0, 100, 100).is_ok());
        assert!(check_end(64, 64, 100).is_ok());
        assert_eq!(
            check_end(128, 64, 200),
            Err(ScanError::EndBeforeStart { start: 128, end: 64 })
        );
        assert_eq!(check_end(0, 65, 100), Err(ScanError::MisalignedEnd { end: 65 }));
        assert!(check_end(0, 128, 100).is_err());
    }

    #[test]
    fn test_empty_buffer() {
        let mut buffer: Vec<u8> = Vec::new();
        let (outcome, state, deferred) = scan_all(&mut buffer, 4);
        assert_eq!(outcome.processed, 0);
        assert_eq!(outcome.halt, HaltReason::EndOfBuffer);
        assert!(!state.inside_quotes);
        assert!(deferred.is_empty());
    }

    #[test]
    fn test_exact_multiple_of_window() {
        let mut buffer = vec![b'a'; 128];
        let (outcome, _, _) = scan_all(&mut buffer, 4);
        assert_eq!(outcome.processed, 128);
        assert_eq!(outcome.halt, HaltReason::EndOfBuffer);
    }

    #[test]
    fn test_partial_tail() {
        let mut buffer = vec![b'a'; 70];
        buffer[64] = b'"';
        buffer[66] = b',';
        let (outcome, state, _) = scan_all(&mut buffer, 4);
        assert_eq!(outcome.processed, 70);
        assert_eq!(buffer[66], 0x02);
        assert!(state.inside_quotes);
    }

    #[test]
    fn test_pending_masks_reused_on_resume() {
        let mut buffer = vec![b'x'; 192];
        buffer[10] = b'"';
        buffer[70] = b',';
        buffer[130] = b'"';

        let config = ScanConfig::csv();
        let backend = Backend::detect();
        let mut slots = [0usize; 4];
        let mut queue = DeferredQueue::new(&mut slots);
        let mut state = ScanState::default();

        let outcome =
            run(&mut buffer, &config, backend, &mut state, &mut queue, 0, Some(64)).unwrap();
        assert_eq!(outcome.processed, 64);
        assert_eq!(outcome.halt, HaltReason::EndBound);
        assert_eq!(state.pending_offset, Some(64));
        assert_eq!(state.pending_quote_mask, 0);
        assert!(state.inside_quotes);

        let outcome = run(&mut buffer, &config, backend, &mut state, &mut queue, 64, None).unwrap();
        assert_eq!(outcome.processed, 192);
        assert_eq!(buffer[70], 0x02);
        assert!(!state.inside_quotes);
        assert_eq!(state.pending_offset, None);
    }

    #[test]
    fn test_check_queue() {
        let mut slots = [0usize; 4];
        let mut queue = DeferredQueue::new(&mut slots);
        assert!(check_queue(&queue, 0).is_ok());

        assert!(queue.push(64));
        assert!(check_queue(&queue, 128).is_ok());
        assert_eq!(
            check_queue(&queue, 64),
            Err(ScanError::StaleQueue { last: 64, start: 64 })
        );
        assert_eq!(
            check_queue(&queue, 0),
            Err(ScanError::StaleQueue { last: 64, start: 0 })
        );
    }

    #[test]
    fn test_stale_queue_is_rejected_before_writing() {
        let mut buffer = b"\"a\"\"b\",c\n".to_vec();
        let original = buffer.clone();
        let mut slots = [0usize; 4];
        let mut queue = DeferredQueue::new(&mut slots);
        assert!(queue.push(64));
        let mut state = ScanState::default();

        let result = run(
            &mut buffer,
            &ScanConfig::csv(),
            Backend::detect(),
            &mut state,
            &mut queue,
            0,
            None,
        );

        assert_eq!(result, Err(ScanError::StaleQueue { last: 64, start: 0 }));
        assert_eq!(buffer, original);
        assert_eq!(queue.as_slice(), &[64]);
        assert_eq!(state, ScanState::default());
    }

    #[test]
    fn test_trailing_quote_recorded_at_end() {
        let mut buffer = vec![b'x'; 64];
        buffer[63] = b'"';
        let (outcome, state, deferred) = scan_all(&mut buffer, 4);

        assert_eq!(outcome.processed, 64);
        assert!(state.trailing_quote);
        assert!(state.inside_quotes);
        // The quote may pair with whatever follows this buffer.
        assert_eq!(deferred, vec![0]);

        let mut buffer = vec![b'x'; 70];
        buffer[69] = b'"';
        let (_, state, deferred) = scan_all(&mut buffer, 4);
        assert!(state.trailing_quote);
        assert!(deferred.is_empty());

        let mut buffer = vec![b'x'; 128];
        buffer[63] = b'"';
        buffer[64] = b'"';
        let (_, state, deferred) = scan_all(&mut buffer, 4);
        assert!(!state.trailing_quote);
        assert_eq!(deferred, vec![0]);
    }
}
