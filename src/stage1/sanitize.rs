//! Sanitizer: neutralizes structural-looking bytes found inside quotes.
//!
//! After sanitization every remaining quote, separator and carriage return in
//! the buffer is structural. Bytes that were literal quoted data carry a
//! [`Sentinels`] value instead.

use super::config::Sentinels;
use super::quote::ResolvedMasks;
use super::window::WINDOW_SIZE;

/// Write `value` at every position set in `mask`.
#[inline]
pub fn blend_scalar(bytes: &mut [u8; WINDOW_SIZE], mut mask: u64, value: u8) {
    while mask != 0 {
        let i = mask.trailing_zeros() as usize;
        bytes[i] = value;
        mask &= mask - 1; // Clear lowest set bit
    }
}

/// Replace quote, separator and carriage return bytes selected by `masks`.
#[inline]
pub fn sanitize_scalar(
    bytes: &mut [u8; WINDOW_SIZE],
    masks: &ResolvedMasks,
    sentinels: &Sentinels,
) {
    blend_scalar(bytes, masks.quote, sentinels.quote);
    blend_scalar(bytes, masks.separator, sentinels.separator);
    blend_scalar(bytes, masks.carriage_return, sentinels.carriage_return);
}
