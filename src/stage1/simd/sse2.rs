//! SSE2 compare kernels for x86_64.
//!
//! SSE2 is baseline for all x86_64 CPUs, providing universal availability.
//! Processes a 64-byte window as 4x 16-byte loads.

use core::arch::x86_64::*;

use super::super::compare::RawMasks;
use super::super::config::{CARRIAGE_RETURN, NEWLINE};
use super::super::window::WINDOW_SIZE;

#[inline]
#[target_feature(enable = "sse2")]
unsafe fn load(bytes: &[u8; WINDOW_SIZE]) -> [__m128i; 4] {
    let ptr = bytes.as_ptr();
    [
        _mm_loadu_si128(ptr as *const __m128i),
        _mm_loadu_si128(ptr.add(16) as *const __m128i),
        _mm_loadu_si128(ptr.add(32) as *const __m128i),
        _mm_loadu_si128(ptr.add(48) as *const __m128i),
    ]
}

/// Compare the four 16-byte chunks against `target` and pack the results.
#[inline]
#[target_feature(enable = "sse2")]
unsafe fn eq_chunks(chunks: &[__m128i; 4], target: u8) -> u64 {
    let v_target = _mm_set1_epi8(target as i8);

    let m0 = _mm_movemask_epi8(_mm_cmpeq_epi8(chunks[0], v_target)) as u16 as u64;
    let m1 = _mm_movemask_epi8(_mm_cmpeq_epi8(chunks[1], v_target)) as u16 as u64;
    let m2 = _mm_movemask_epi8(_mm_cmpeq_epi8(chunks[2], v_target)) as u16 as u64;
    let m3 = _mm_movemask_epi8(_mm_cmpeq_epi8(chunks[3], v_target)) as u16 as u64;

    m0 | (m1 << 16) | (m2 << 32) | (m3 << 48)
}

/// Mask of bytes equal to `target`.
///
/// # Safety
///
/// CPU must support SSE2 (always true on x86_64).
#[target_feature(enable = "sse2")]
pub unsafe fn eq_mask(bytes: &[u8; WINDOW_SIZE], target: u8) -> u64 {
    let chunks = load(bytes);
    eq_chunks(&chunks, target)
}

/// Masks of bytes equal to `first` and to `second`, from one load.
///
/// # Safety
///
/// CPU must support SSE2 (always true on x86_64).
#[target_feature(enable = "sse2")]
pub unsafe fn eq_pair(bytes: &[u8; WINDOW_SIZE], first: u8, second: u8) -> (u64, u64) {
    let chunks = load(bytes);
    (eq_chunks(&chunks, first), eq_chunks(&chunks, second))
}

/// Raw masks for quote, separator, carriage return and newline.
///
/// # Safety
///
/// CPU must support SSE2 (always true on x86_64).
#[target_feature(enable = "sse2")]
pub unsafe fn classify(bytes: &[u8; WINDOW_SIZE], quote: u8, separator: u8) -> RawMasks {
    let chunks = load(bytes);
    RawMasks {
        quote: eq_chunks(&chunks, quote),
        separator: eq_chunks(&chunks, separator),
        carriage_return: eq_chunks(&chunks, CARRIAGE_RETURN),
        newline: eq_chunks(&chunks, NEWLINE),
    }
}
