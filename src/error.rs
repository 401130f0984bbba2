//! Scan errors.
//!
//! Only caller contract violations are errors. A full deferred queue, an
//! ambiguous window or an unterminated quote are reported through the scan
//! outcome instead.

use core::fmt;

/// Errors returned by the stage-1 scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// The start offset lies past the end of the buffer.
    OffsetOutOfRange {
        /// Offset supplied by the caller
        offset: usize,
        /// Buffer length
        len: usize,
    },

    /// The start offset is neither a multiple of 64 nor the buffer length.
    MisalignedOffset {
        /// Offset supplied by the caller
        offset: usize,
    },

    /// A bounded scan was asked to stop before it starts.
    EndBeforeStart {
        /// Start offset of the scan
        start: usize,
        /// End bound supplied by the caller
        end: usize,
    },

    /// The end bound is neither a multiple of 64 nor the buffer length.
    MisalignedEnd {
        /// End bound supplied by the caller
        end: usize,
    },

    /// The deferred queue already holds an offset at or after the start
    /// offset, so windows scanned now could not be queued.
    StaleQueue {
        /// Last offset in the queue
        last: usize,
        /// Start offset of the scan
        start: usize,
    },

    /// The scan configuration cannot be classified unambiguously.
    InvalidConfig {
        /// Which constraint was violated
        reason: &'static str,
    },
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::OffsetOutOfRange { offset, len } => {
                write!(f, "start offset {} is past the end of a {}-byte buffer", offset, len)
            }
            ScanError::MisalignedOffset { offset } => {
                write!(f, "start offset {} is not a multiple of 64", offset)
            }
            ScanError::EndBeforeStart { start, end } => {
                write!(f, "end bound {} is before start offset {}", end, start)
            }
            ScanError::MisalignedEnd { end } => {
                write!(f, "end bound {} is not a multiple of 64", end)
            }
            ScanError::StaleQueue { last, start } => {
                write!(
                    f,
                    "deferred queue ends at {}, which does not precede start offset {}",
                    last, start
                )
            }
            ScanError::InvalidConfig { reason } => {
                write!(f, "invalid scan configuration: {}", reason)
            }
        }
    }
}

#[cfg(any(test, feature = "std"))]
impl std::error::Error for ScanError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = ScanError::OffsetOutOfRange { offset: 200, len: 70 };
        assert_eq!(
            err.to_string(),
            "start offset 200 is past the end of a 70-byte buffer"
        );

        let err = ScanError::MisalignedOffset { offset: 10 };
        assert_eq!(err.to_string(), "start offset 10 is not a multiple of 64");

        let err = ScanError::StaleQueue { last: 64, start: 0 };
        assert_eq!(
            err.to_string(),
            "deferred queue ends at 64, which does not precede start offset 0"
        );

        let err = ScanError::InvalidConfig {
            reason: "delimiter equals quote character",
        };
        assert!(err.to_string().contains("delimiter equals quote character"));
    }
}
