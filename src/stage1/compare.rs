//! Vector compare unit: per-class byte masks for one window.
//!
//! Every backend must produce masks bit-identical to [`eq_mask_scalar`]:
//! bit `k` is set iff byte `k` of the window equals the target.

use super::config::{CARRIAGE_RETURN, NEWLINE};
use super::window::WINDOW_SIZE;

/// Raw classification masks of one window, one bit per byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RawMasks {
    /// Quote character positions
    pub quote: u64,
    /// Delimiter positions
    pub separator: u64,
    /// Carriage return positions
    pub carriage_return: u64,
    /// Newline positions
    pub newline: u64,
}

/// Scalar equality scan of a window against one target byte.
#[inline]
pub fn eq_mask_scalar(bytes: &[u8; WINDOW_SIZE], target: u8) -> u64 {
    let mut mask = 0u64;
    for (i, &byte) in bytes.iter().enumerate() {
        mask |= ((byte == target) as u64) << i;
    }
    mask
}

/// Scalar masks of bytes equal to `first` and to `second`.
#[inline]
pub fn eq_pair_scalar(bytes: &[u8; WINDOW_SIZE], first: u8, second: u8) -> (u64, u64) {
    (eq_mask_scalar(bytes, first), eq_mask_scalar(bytes, second))
}

/// Classify a window against all four target classes, byte by byte.
#[inline]
pub fn classify_scalar(bytes: &[u8; WINDOW_SIZE], quote: u8, separator: u8) -> RawMasks {
    RawMasks {
        quote: eq_mask_scalar(bytes, quote),
        separator: eq_mask_scalar(bytes, separator),
        carriage_return: eq_mask_scalar(bytes, CARRIAGE_RETURN),
        newline: eq_mask_scalar(bytes, NEWLINE),
    }
}
