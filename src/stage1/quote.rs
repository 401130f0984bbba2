//! Quote-state resolver.
//!
//! Determines, for every byte of a window, whether it lies inside an open
//! quoted field, and derives the masks of bytes the sanitizer must
//! neutralize.
//!
//! ## Algorithm
//!
//! The inside mask is the inclusive prefix XOR of the quote mask, inverted
//! when the window starts inside quotes. An opening quote is inside, a
//! closing quote is outside:
//!
//! ```text
//! text:     a , " b , c " , d
//! quote:    0 0 1 0 0 0 1 0 0
//! inside:   0 0 1 1 1 1 0 0 0
//! ```
//!
//! An escaped quote (`""` inside a quoted field) toggles twice on adjacent
//! bytes, so it never changes the classification of any other byte. Its
//! first half is a quote that closes and is immediately followed by another
//! quote; both halves are literal data.
//!
//! A window is flagged for deferral when it holds escaped quotes, when two
//! quotes meet across its upper boundary, or when a quoted carriage return is
//! followed by a newline (the sentinel for CR is newline-equivalent, so a
//! quoted CRLF needs the slow path to be restored).

use super::window::WINDOW_SIZE;

/// Masks and carry consumed by [`resolve`] for one window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolverInput {
    /// Raw quote mask of the current window
    pub quote: u64,
    /// Raw delimiter mask of the current window
    pub separator: u64,
    /// Raw carriage return mask of the current window
    pub carriage_return: u64,
    /// Raw quote mask of the next window
    pub quote_next: u64,
    /// Raw newline mask of the current window (end of data included)
    pub newline: u64,
    /// Raw newline mask of the next window (end of data included)
    pub newline_next: u64,
    /// Inside quotes at the first byte of the window
    pub quoted: bool,
    /// First byte is the second half of an escaped pair that began in the
    /// previous window
    pub escape_carry: bool,
}

/// Output of [`resolve`] for one window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolvedMasks {
    /// Positions inside quotes (quote parity)
    pub inside: u64,
    /// Escaped quote bytes to replace
    pub quote: u64,
    /// Delimiters inside quotes to replace
    pub separator: u64,
    /// Carriage returns inside quotes to replace
    pub carriage_return: u64,
    /// Window must be re-scanned by the slow path
    pub needs_deferral: bool,
    /// Inside quotes at the first byte of the next window
    pub quoted: bool,
    /// First byte of the next window closes an escaped pair
    pub escape_carry: bool,
}

/// Compute inclusive prefix XOR (cumulative XOR) of a 64-bit mask.
///
/// Bit `i` of the result is the XOR of bits `0..=i` of `x`: the parity of
/// quotes seen so far in the window, current byte included.
#[inline]
pub fn prefix_xor(x: u64) -> u64 {
    let mut y = x;
    y ^= y << 1;
    y ^= y << 2;
    y ^= y << 4;
    y ^= y << 8;
    y ^= y << 16;
    y ^= y << 32;
    y
}

/// Bit `k` is set iff the byte after position `k` is set in `mask`, taking
/// bit 0 of `next` as the byte after position 63.
#[inline]
fn followed_by(mask: u64, next: u64) -> u64 {
    (mask >> 1) | (next << (WINDOW_SIZE - 1))
}

/// Resolve the quote state of one window using broadword prefix XOR.
#[inline]
pub fn resolve(input: &ResolverInput) -> ResolvedMasks {
    resolve_with_parity(input, prefix_xor(input.quote))
}

/// Resolve one window given `parity = prefix_xor(input.quote)`.
///
/// Split out so backends with a faster prefix XOR (carry-less multiply)
/// share the rest of the computation.
#[inline]
pub(crate) fn resolve_with_parity(input: &ResolverInput, parity: u64) -> ResolvedMasks {
    let inside = if input.quoted { !parity } else { parity };

    let quote_follows = followed_by(input.quote, input.quote_next);
    let escape_start = input.quote & !inside & quote_follows;
    let carried = (input.escape_carry as u64) & input.quote;
    let quote = escape_start | (escape_start << 1) | carried;

    let separator = input.separator & inside;
    let carriage_return = input.carriage_return & inside;

    let quoted_crlf = carriage_return & followed_by(input.newline, input.newline_next);
    let boundary_quotes = (input.quote >> 63) & input.quote_next & 1 != 0;

    ResolvedMasks {
        inside,
        quote,
        separator,
        carriage_return,
        needs_deferral: quote != 0 || boundary_quotes || quoted_crlf != 0,
        quoted: inside >> 63 != 0,
        escape_carry: escape_start >> 63 != 0,
    }
}

/// Byte-at-a-time reference implementation of [`resolve`].
///
/// Walks the window sequentially, toggling the quote state at each quote.
/// Used to cross-check the bit-parallel path.
pub fn resolve_scalar(input: &ResolverInput) -> ResolvedMasks {
    let bit = |mask: u64, i: usize| (mask >> i) & 1 != 0;
    let quote_at = |i: usize| {
        if i < WINDOW_SIZE {
            bit(input.quote, i)
        } else {
            bit(input.quote_next, 0)
        }
    };
    let newline_at = |i: usize| {
        if i < WINDOW_SIZE {
            bit(input.newline, i)
        } else {
            bit(input.newline_next, 0)
        }
    };

    let mut out = ResolvedMasks::default();
    let mut quoted = input.quoted;

    for i in 0..WINDOW_SIZE {
        let mask = 1u64 << i;

        if quote_at(i) {
            quoted = !quoted;
            if i == 0 && input.escape_carry {
                out.quote |= mask;
            }
            if !quoted && quote_at(i + 1) {
                // Closing quote immediately reopened: escaped pair.
                out.quote |= mask;
                if i + 1 < WINDOW_SIZE {
                    out.quote |= mask << 1;
                } else {
                    out.escape_carry = true;
                }
            }
        }

        if quoted {
            out.inside |= mask;
            if bit(input.separator, i) {
                out.separator |= mask;
            }
            if bit(input.carriage_return, i) {
                out.carriage_return |= mask;
                if newline_at(i + 1) {
                    out.needs_deferral = true;
                }
            }
        }
    }

    if quote_at(WINDOW_SIZE - 1) && quote_at(WINDOW_SIZE) {
        out.needs_deferral = true;
    }
    if out.quote != 0 {
        out.needs_deferral = true;
    }
    out.quoted = quoted;
    out
}
