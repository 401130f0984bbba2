//! NEON compare kernels for ARM64.
//!
//! Processes a 64-byte window as 4x 16-byte loads.

use core::arch::aarch64::*;

use super::super::compare::RawMasks;
use super::super::config::{CARRIAGE_RETURN, NEWLINE};
use super::super::window::WINDOW_SIZE;

#[inline]
#[target_feature(enable = "neon")]
unsafe fn load(bytes: &[u8; WINDOW_SIZE]) -> [uint8x16_t; 4] {
    let ptr = bytes.as_ptr();
    [
        vld1q_u8(ptr),
        vld1q_u8(ptr.add(16)),
        vld1q_u8(ptr.add(32)),
        vld1q_u8(ptr.add(48)),
    ]
}

/// Extract a bitmask from the high bit of each byte in a NEON vector.
/// Returns a u16 where bit i is set if byte i has its high bit set.
#[inline]
#[target_feature(enable = "neon")]
unsafe fn neon_movemask(v: uint8x16_t) -> u16 {
    // Shift right by 7 to get 0 or 1 in each byte
    let high_bits = vshrq_n_u8::<7>(v);

    let low_u64 = vgetq_lane_u64::<0>(vreinterpretq_u64_u8(high_bits));
    let high_u64 = vgetq_lane_u64::<1>(vreinterpretq_u64_u8(high_bits));

    // Pack 8 bytes into 8 bits using multiplication trick
    const MAGIC: u64 = 0x0102040810204080;

    let low_packed = (low_u64.wrapping_mul(MAGIC) >> 56) as u8;
    let high_packed = (high_u64.wrapping_mul(MAGIC) >> 56) as u8;

    (low_packed as u16) | ((high_packed as u16) << 8)
}

#[inline]
#[target_feature(enable = "neon")]
unsafe fn eq_chunks(chunks: &[uint8x16_t; 4], target: u8) -> u64 {
    let v_target = vdupq_n_u8(target);

    let m0 = neon_movemask(vceqq_u8(chunks[0], v_target)) as u64;
    let m1 = neon_movemask(vceqq_u8(chunks[1], v_target)) as u64;
    let m2 = neon_movemask(vceqq_u8(chunks[2], v_target)) as u64;
    let m3 = neon_movemask(vceqq_u8(chunks[3], v_target)) as u64;

    m0 | (m1 << 16) | (m2 << 32) | (m3 << 48)
}

/// Mask of bytes equal to `target`.
///
/// # Safety
///
/// CPU must support NEON (always true on aarch64).
#[target_feature(enable = "neon")]
pub unsafe fn eq_mask(bytes: &[u8; WINDOW_SIZE], target: u8) -> u64 {
    let chunks = load(bytes);
    eq_chunks(&chunks, target)
}

/// Masks of bytes equal to `first` and to `second`, from one load.
///
/// # Safety
///
/// CPU must support NEON (always true on aarch64).
#[target_feature(enable = "neon")]
pub unsafe fn eq_pair(bytes: &[u8; WINDOW_SIZE], first: u8, second: u8) -> (u64, u64) {
    let chunks = load(bytes);
    (eq_chunks(&chunks, first), eq_chunks(&chunks, second))
}

/// Raw masks for quote, separator, carriage return and newline.
///
/// # Safety
///
/// CPU must support NEON (always true on aarch64).
#[target_feature(enable = "neon")]
pub unsafe fn classify(bytes: &[u8; WINDOW_SIZE], quote: u8, separator: u8) -> RawMasks {
    let chunks = load(bytes);
    RawMasks {
        quote: eq_chunks(&chunks, quote),
        separator: eq_chunks(&chunks, separator),
        carriage_return: eq_chunks(&chunks, CARRIAGE_RETURN),
        newline: eq_chunks(&chunks, NEWLINE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neon_movemask() {
        let mut lanes = [0u8; 16];
        lanes[0] = 0xFF;
        lanes[7] = 0xFF;
        lanes[15] = 0xFF;
        let mask = unsafe { neon_movemask(vld1q_u8(lanes.as_ptr())) };
        assert_eq!(mask, 1 | (1 << 7) | (1 << 15));
    }
}
