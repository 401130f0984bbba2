//! # csvprep
//!
//! SIMD stage-1 preprocessing for CSV-style text.
//!
//! The scanner rewrites a buffer in place so that a second-stage tokenizer
//! can split it on raw delimiters and line terminators without tracking
//! quote state: every delimiter, quote and carriage return that sits inside a
//! quoted field is replaced by a sentinel byte. Windows that need a scalar
//! second look are reported through a caller-owned [`DeferredQueue`].
//!
//! ## Module Organization
//!
//! - [`stage1`] - Window classification, quote resolution, sanitization, driver
//! - [`stage1::simd`] - SSE2, AVX2 and NEON kernels with runtime dispatch
//! - [`error`] - Error type for invalid offsets and configurations
//!
//! ## Quick Start
//!
//! ```
//! use csvprep::{scan, DeferredQueue, ScanState};
//!
//! let mut csv = b"name,quote\nbob,\"he said \"\"hi\"\"\"\n".to_vec();
//! let mut state = ScanState::default();
//! let mut slots = [0usize; 16];
//! let mut deferred = DeferredQueue::new(&mut slots);
//!
//! let processed = scan(&mut csv, b',', &mut state, &mut deferred, 0).unwrap();
//! assert_eq!(processed, csv.len());
//!
//! // Escaped quotes became 0x03 sentinels, and the window was queued
//! // for the slow path.
//! assert_eq!(&csv[24..], b"\x03\x03hi\x03\x03\"\n");
//! assert_eq!(deferred.as_slice(), &[0]);
//! ```
//!
//! ## Features
//!
//! - `std` (default) - Runtime CPU feature detection and `std::error::Error`
//! - `scalar` - Force the portable kernels, for testing and benchmarking
//! - `serde` - Serialization of [`ScanConfig`], [`Sentinels`] and [`ScanState`]
//! - `cli` - The `csvprep` command-line tool

// Use no_std unless std feature is enabled or we're in test mode
#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod error;
pub mod stage1;

pub use error::ScanError;
pub use stage1::{
    scan, Backend, DeferredQueue, HaltReason, ScanConfig, ScanOutcome, ScanState, Sentinels,
    Stage1,
};
