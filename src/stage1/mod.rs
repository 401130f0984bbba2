//! Stage-1 CSV preprocessing: quote-aware classification and sanitization.
//!
//! The scanner walks a mutable buffer in 64-byte windows. For every window it
//! finds quotes, delimiters, carriage returns and newlines with SIMD
//! comparisons, works out which of them lie inside quoted fields, and
//! overwrites the ones that do with sentinel bytes. Afterwards every quote,
//! delimiter and carriage return left in the buffer is structural, so the
//! second-stage tokenizer can split fields and records without tracking quote
//! state itself.
//!
//! Windows the bitmask method cannot settle on its own (escaped quotes, quote
//! pairs straddling a window edge, quoted CRLF) are appended to a
//! [`DeferredQueue`] for a scalar slow path. When the queue fills the scan
//! returns early; the caller drains it and resumes at the returned offset
//! with the same [`ScanState`].
//!
//! # Example
//!
//! ```
//! use csvprep::stage1::{scan, DeferredQueue, ScanState};
//!
//! let mut csv = b"a,\"b,c\",d\n".to_vec();
//! let mut state = ScanState::default();
//! let mut slots = [0usize; 8];
//! let mut deferred = DeferredQueue::new(&mut slots);
//!
//! let processed = scan(&mut csv, b',', &mut state, &mut deferred, 0).unwrap();
//!
//! assert_eq!(processed, csv.len());
//! // The comma inside the quoted field became a separator sentinel.
//! assert_eq!(csv, b"a,\"b\x02c\",d\n");
//! assert!(deferred.is_empty());
//! assert!(!state.inside_quotes);
//! ```
//!
//! # Resuming after the queue fills
//!
//! ```
//! use csvprep::stage1::{DeferredQueue, HaltReason, ScanConfig, ScanState, Stage1};
//!
//! let mut csv = b"\"a\"\"b\",c\n".repeat(16);
//! let stage = Stage1::new(ScanConfig::csv()).unwrap();
//! let mut state = ScanState::default();
//! let mut slots = [0usize; 1];
//! let mut offset = 0;
//! let mut slow_path = Vec::new();
//!
//! loop {
//!     let mut deferred = DeferredQueue::new(&mut slots);
//!     let outcome = stage.scan_outcome(&mut csv, &mut state, &mut deferred, offset).unwrap();
//!     slow_path.extend_from_slice(deferred.as_slice());
//!     offset = outcome.processed;
//!     if outcome.halt != HaltReason::QueueFull {
//!         break;
//!     }
//! }
//!
//! assert_eq!(offset, csv.len());
//! assert_eq!(slow_path, vec![0, 64, 128]);
//! ```

mod compare;
mod config;
mod driver;
mod queue;
mod quote;
mod sanitize;
pub mod simd;
mod window;

pub use compare::{classify_scalar, eq_mask_scalar, eq_pair_scalar, RawMasks};
pub use config::{ScanConfig, Sentinels, CARRIAGE_RETURN, NEWLINE};
pub use queue::DeferredQueue;
pub use quote::{prefix_xor, resolve, resolve_scalar, ResolvedMasks, ResolverInput};
pub use sanitize::{blend_scalar, sanitize_scalar};
pub use simd::Backend;
pub use window::{Window, FILLER, WINDOW_SIZE};

use crate::error::ScanError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Quoting state threaded by the caller between scan calls.
///
/// A fresh buffer starts from `ScanState::default()`. After a call returns,
/// the state describes the buffer exactly at the returned offset; pass it
/// back unchanged to resume there.
///
/// Input split into separate slices is scanned by passing the state from the
/// end of one slice to offset 0 of the next. Every slice but the last must be
/// a multiple of 64 bytes long. Quote pairs meeting across such a seam cannot
/// be rewritten, so both windows touching the seam are deferred instead.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScanState {
    /// Inside an open quoted field at the resume offset.
    pub inside_quotes: bool,
    /// Raw quote mask of the window at `pending_offset`.
    pub pending_quote_mask: u64,
    /// Raw newline mask of the window at `pending_offset`.
    pub pending_newline_mask: u64,
    /// Window described by the pending masks. When it differs from the resume
    /// offset, the masks are recomputed from the buffer.
    pub pending_offset: Option<usize>,
    /// The first byte at the resume offset closes an escaped quote pair.
    pub escape_carry: bool,
    /// The scan reached the end of its buffer and the last byte was a quote.
    pub trailing_quote: bool,
}

impl ScanState {
    /// State for the start of a buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// State for a shard boundary whose quote status is already known.
    pub fn with_quoted(inside_quotes: bool) -> Self {
        Self {
            inside_quotes,
            ..Self::default()
        }
    }
}

/// Why a scan call returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HaltReason {
    /// Every window up to the end of the buffer was processed.
    EndOfBuffer,
    /// The deferred queue is full; drain it and resume.
    QueueFull,
    /// The caller-supplied end bound was reached.
    EndBound,
}

/// Result of a scan call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Offset up to which the buffer has been sanitized: a multiple of 64, or
    /// the buffer length after the final window.
    pub processed: usize,
    /// Why the scan stopped.
    pub halt: HaltReason,
}

/// A configured stage-1 scanner.
#[derive(Clone, Debug)]
pub struct Stage1 {
    config: ScanConfig,
    backend: Backend,
}

impl Stage1 {
    /// Create a scanner using the fastest backend for this CPU.
    pub fn new(config: ScanConfig) -> Result<Self, ScanError> {
        Self::with_backend(config, Backend::detect())
    }

    /// Create a scanner with an explicit backend.
    pub fn with_backend(config: ScanConfig, backend: Backend) -> Result<Self, ScanError> {
        config.validate()?;
        Ok(Self { config, backend })
    }

    /// The scan configuration.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// The kernel set in use.
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Scan from `start_offset` to the end of the buffer or until the queue
    /// fills, returning the number of bytes processed.
    pub fn scan(
        &self,
        buffer: &mut [u8],
        state: &mut ScanState,
        deferred: &mut DeferredQueue<'_>,
        start_offset: usize,
    ) -> Result<usize, ScanError> {
        self.scan_outcome(buffer, state, deferred, start_offset)
            .map(|outcome| outcome.processed)
    }

    /// Like [`scan`](Self::scan), also reporting why the scan stopped.
    pub fn scan_outcome(
        &self,
        buffer: &mut [u8],
        state: &mut ScanState,
        deferred: &mut DeferredQueue<'_>,
        start_offset: usize,
    ) -> Result<ScanOutcome, ScanError> {
        driver::run(
            buffer,
            &self.config,
            self.backend,
            state,
            deferred,
            start_offset,
            None,
        )
    }

    /// Scan windows in `[start_offset, end_offset)` only.
    ///
    /// `end_offset` must be a multiple of 64 or the buffer length. Bytes after
    /// `end_offset` are read for lookahead but never written, so a buffer can
    /// be processed in consecutive bounded calls with the same result as one
    /// call.
    pub fn scan_bounded(
        &self,
        buffer: &mut [u8],
        state: &mut ScanState,
        deferred: &mut DeferredQueue<'_>,
        start_offset: usize,
        end_offset: usize,
    ) -> Result<ScanOutcome, ScanError> {
        driver::run(
            buffer,
            &self.config,
            self.backend,
            state,
            deferred,
            start_offset,
            Some(end_offset),
        )
    }
}

/// Scan a CSV buffer with the default quote character and sentinels.
///
/// Sanitizes `buffer[start_offset..returned]` in place, appends the offsets
/// of windows needing the slow path to `deferred`, and leaves `state`
/// describing the buffer at the returned offset. Returns `start_offset`
/// unchanged if `deferred` is already full.
pub fn scan(
    buffer: &mut [u8],
    separator: u8,
    state: &mut ScanState,
    deferred: &mut DeferredQueue<'_>,
    start_offset: usize,
) -> Result<usize, ScanError> {
    Stage1::new(ScanConfig::csv().with_delimiter(separator))?
        .scan(buffer, state, deferred, start_offset)
}
