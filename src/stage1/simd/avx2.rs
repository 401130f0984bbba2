//! AVX2 + PCLMULQDQ kernels for x86_64.
//!
//! A 64-byte window is two 32-byte lanes. Compares use `vpcmpeqb` +
//! `vpmovmskb`; the sanitizer expands each 32-bit half of an output mask
//! into a byte mask and blends the sentinel in with `vpblendvb`; the quote
//! parity is a carry-less multiply by all ones.
//!
//! Requires: AVX2 (compare, blend) + PCLMULQDQ (prefix XOR)
//! Supported: Intel Haswell+ (2013), AMD Excavator+ (2015)

use core::arch::x86_64::*;

use super::super::compare::RawMasks;
use super::super::config::{Sentinels, CARRIAGE_RETURN, NEWLINE};
use super::super::quote::ResolvedMasks;
use super::super::window::WINDOW_SIZE;

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn load(bytes: &[u8; WINDOW_SIZE]) -> (__m256i, __m256i) {
    let ptr = bytes.as_ptr();
    (
        _mm256_loadu_si256(ptr as *const __m256i),
        _mm256_loadu_si256(ptr.add(32) as *const __m256i),
    )
}

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn store(bytes: &mut [u8; WINDOW_SIZE], lo: __m256i, hi: __m256i) {
    let ptr = bytes.as_mut_ptr();
    _mm256_storeu_si256(ptr as *mut __m256i, lo);
    _mm256_storeu_si256(ptr.add(32) as *mut __m256i, hi);
}

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn eq_lanes(lo: __m256i, hi: __m256i, target: u8) -> u64 {
    let v_target = _mm256_set1_epi8(target as i8);
    let m_lo = _mm256_movemask_epi8(_mm256_cmpeq_epi8(lo, v_target)) as u32 as u64;
    let m_hi = _mm256_movemask_epi8(_mm256_cmpeq_epi8(hi, v_target)) as u32 as u64;
    m_lo | (m_hi << 32)
}

/// Mask of bytes equal to `target`.
///
/// # Safety
///
/// CPU must support AVX2.
#[target_feature(enable = "avx2")]
pub unsafe fn eq_mask(bytes: &[u8; WINDOW_SIZE], target: u8) -> u64 {
    let (lo, hi) = load(bytes);
    eq_lanes(lo, hi, target)
}

/// Masks of bytes equal to `first` and to `second`, from one load.
///
/// # Safety
///
/// CPU must support AVX2.
#[target_feature(enable = "avx2")]
pub unsafe fn eq_pair(bytes: &[u8; WINDOW_SIZE], first: u8, second: u8) -> (u64, u64) {
    let (lo, hi) = load(bytes);
    (eq_lanes(lo, hi, first), eq_lanes(lo, hi, second))
}

/// Raw masks for quote, separator, carriage return and newline.
///
/// # Safety
///
/// CPU must support AVX2.
#[target_feature(enable = "avx2")]
pub unsafe fn classify(bytes: &[u8; WINDOW_SIZE], quote: u8, separator: u8) -> RawMasks {
    let (lo, hi) = load(bytes);
    RawMasks {
        quote: eq_lanes(lo, hi, quote),
        separator: eq_lanes(lo, hi, separator),
        carriage_return: eq_lanes(lo, hi, CARRIAGE_RETURN),
        newline: eq_lanes(lo, hi, NEWLINE),
    }
}

/// Expand 32 mask bits into 32 bytes: 0xFF where the bit is set.
///
/// Broadcast the mask, give byte `j` a copy of mask byte `j / 8`, then test
/// bit `j % 8` of it.
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn unpack_bitmask(mask: u32) -> __m256i {
    let spread = _mm256_shuffle_epi8(
        _mm256_set1_epi32(mask as i32),
        _mm256_setr_epi8(
            0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1, //
            2, 2, 2, 2, 2, 2, 2, 2, 3, 3, 3, 3, 3, 3, 3, 3,
        ),
    );
    let bit = _mm256_set1_epi64x(0x8040_2010_0804_0201u64 as i64);
    _mm256_cmpeq_epi8(_mm256_and_si256(spread, bit), bit)
}

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn blend(lo: __m256i, hi: __m256i, mask: u64, value: u8) -> (__m256i, __m256i) {
    if mask == 0 {
        return (lo, hi);
    }
    let v_value = _mm256_set1_epi8(value as i8);
    (
        _mm256_blendv_epi8(lo, v_value, unpack_bitmask(mask as u32)),
        _mm256_blendv_epi8(hi, v_value, unpack_bitmask((mask >> 32) as u32)),
    )
}

/// Replace quote, separator and carriage return bytes selected by `masks`.
///
/// # Safety
///
/// CPU must support AVX2.
#[target_feature(enable = "avx2")]
pub unsafe fn sanitize(
    bytes: &mut [u8; WINDOW_SIZE],
    masks: &ResolvedMasks,
    sentinels: &Sentinels,
) {
    let (lo, hi) = load(bytes);
    let (lo, hi) = blend(lo, hi, masks.quote, sentinels.quote);
    let (lo, hi) = blend(lo, hi, masks.separator, sentinels.separator);
    let (lo, hi) = blend(lo, hi, masks.carriage_return, sentinels.carriage_return);
    store(bytes, lo, hi);
}

/// Inclusive prefix XOR via carry-less multiplication by all ones.
///
/// # Safety
///
/// CPU must support PCLMULQDQ (and SSE2).
#[inline]
#[target_feature(enable = "pclmulqdq,sse2")]
pub unsafe fn prefix_xor_clmul(mask: u64) -> u64 {
    let product = _mm_clmulepi64_si128(
        _mm_set_epi64x(0, mask as i64),
        _mm_set1_epi8(-1),
        0,
    );
    _mm_cvtsi128_si64(product) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_avx2() -> bool {
        is_x86_feature_detected!("avx2")
    }

    #[test]
    fn test_unpack_bitmask() {
        if !has_avx2() {
            eprintln!("Skipping AVX2 test: CPU doesn't support AVX2");
            return;
        }

        let mut out = [0u8; 32];
        unsafe {
            let expanded = unpack_bitmask(0x8000_0001 | (1 << 9));
            _mm256_storeu_si256(out.as_mut_ptr() as *mut __m256i, expanded);
        }
        for (j, &byte) in out.iter().enumerate() {
            let expected = if j == 0 || j == 9 || j == 31 { 0xFF } else { 0 };
            assert_eq!(byte, expected, "byte {}", j);
        }
    }

    #[test]
    fn test_sanitize_both_lanes() {
        if !has_avx2() {
            return;
        }

        let mut bytes = [b'x'; WINDOW_SIZE];
        bytes[3] = b',';
        bytes[40] = b',';
        bytes[63] = b'\r';
        let masks = ResolvedMasks {
            separator: (1 << 3) | (1 << 40),
            carriage_return: 1 << 63,
            ..ResolvedMasks::default()
        };
        unsafe { sanitize(&mut bytes, &masks, &Sentinels::default()) };

        assert_eq!(bytes[3], 0x02);
        assert_eq!(bytes[40], 0x02);
        assert_eq!(bytes[63], b'\n');
        assert_eq!(bytes.iter().filter(|&&b| b == b'x').count(), 61);
    }

    #[test]
    fn test_prefix_xor_clmul() {
        if !is_x86_feature_detected!("pclmulqdq") {
            return;
        }

        unsafe {
            assert_eq!(prefix_xor_clmul(0), 0);
            assert_eq!(prefix_xor_clmul(1), !0u64);
            assert_eq!(prefix_xor_clmul(0b100100) & 0b111111, 0b011100);
        }
    }
}
