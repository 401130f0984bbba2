//! SIMD-accelerated compare and sanitize kernels.
//!
//! All kernels operate on one 64-byte window and are bit-identical to the
//! scalar versions in [`compare`](super::compare) and
//! [`sanitize`](super::sanitize).
//!
//! ## x86_64 Instruction Sets
//!
//! - **SSE2** (baseline): 4x 16-byte compares, scalar blend
//! - **AVX2 + PCLMULQDQ** (optimal): 2x 32-byte compares, `vpblendvb`
//!   sanitize, carry-less multiply prefix XOR
//!
//! ## ARM
//!
//! On aarch64, NEON compares 4x 16 bytes; sanitize uses the scalar blend.
//!
//! The backend is selected once per [`Stage1`](super::Stage1) with runtime
//! detection when `std` is available.

#[cfg(target_arch = "x86_64")]
pub mod avx2;

#[cfg(target_arch = "x86_64")]
pub mod sse2;

#[cfg(target_arch = "aarch64")]
pub mod neon;

use super::compare::{classify_scalar, eq_mask_scalar, eq_pair_scalar, RawMasks};
use super::config::{Sentinels, CARRIAGE_RETURN, NEWLINE};
use super::quote::{prefix_xor, resolve_with_parity, ResolvedMasks, ResolverInput};
use super::sanitize::sanitize_scalar;
use super::window::WINDOW_SIZE;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    Scalar,
    #[cfg(target_arch = "x86_64")]
    Sse2,
    #[cfg(target_arch = "x86_64")]
    Avx2,
    #[cfg(target_arch = "aarch64")]
    Neon,
}

/// Kernel set used for a scan.
///
/// Can only be obtained through [`Backend::detect`] or [`Backend::scalar`],
/// so a vector backend always matches what the running CPU supports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Backend(Kind);

impl Backend {
    /// Portable byte-at-a-time kernels.
    pub const fn scalar() -> Self {
        Backend(Kind::Scalar)
    }

    /// Fastest kernels supported by the running CPU.
    pub fn detect() -> Self {
        if cfg!(feature = "scalar") {
            return Self::scalar();
        }
        Self::detect_vector()
    }

    #[cfg(all(target_arch = "x86_64", any(test, feature = "std")))]
    fn detect_vector() -> Self {
        if is_x86_feature_detected!("avx2") && is_x86_feature_detected!("pclmulqdq") {
            Backend(Kind::Avx2)
        } else {
            Backend(Kind::Sse2)
        }
    }

    // Without std feature, only compile-time features are known
    #[cfg(all(target_arch = "x86_64", not(any(test, feature = "std"))))]
    fn detect_vector() -> Self {
        if cfg!(all(target_feature = "avx2", target_feature = "pclmulqdq")) {
            Backend(Kind::Avx2)
        } else {
            Backend(Kind::Sse2)
        }
    }

    #[cfg(target_arch = "aarch64")]
    fn detect_vector() -> Self {
        // NEON is mandatory on aarch64
        Backend(Kind::Neon)
    }

    #[cfg(not(any(target_arch = "aarch64", target_arch = "x86_64")))]
    fn detect_vector() -> Self {
        Self::scalar()
    }

    /// Every backend available on this CPU, scalar first.
    pub fn available() -> impl Iterator<Item = Backend> {
        let detected = Self::detect_vector();
        let mut list = [Some(Self::scalar()), None, None];

        #[cfg(target_arch = "x86_64")]
        {
            list[1] = Some(Backend(Kind::Sse2));
            if detected.0 == Kind::Avx2 {
                list[2] = Some(detected);
            }
        }
        #[cfg(not(target_arch = "x86_64"))]
        {
            if detected.0 != Kind::Scalar {
                list[1] = Some(detected);
            }
        }

        list.into_iter().flatten()
    }

    /// Short name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self.0 {
            Kind::Scalar => "scalar",
            #[cfg(target_arch = "x86_64")]
            Kind::Sse2 => "sse2",
            #[cfg(target_arch = "x86_64")]
            Kind::Avx2 => "avx2+pclmulqdq",
            #[cfg(target_arch = "aarch64")]
            Kind::Neon => "neon",
        }
    }

    /// Mask of bytes equal to `target`.
    #[inline]
    pub fn eq_mask(&self, bytes: &[u8; WINDOW_SIZE], target: u8) -> u64 {
        match self.0 {
            Kind::Scalar => eq_mask_scalar(bytes, target),
            // SAFETY: SSE2 is mandatory on x86_64
            #[cfg(target_arch = "x86_64")]
            Kind::Sse2 => unsafe { sse2::eq_mask(bytes, target) },
            // SAFETY: Avx2 is only constructed after feature detection
            #[cfg(target_arch = "x86_64")]
            Kind::Avx2 => unsafe { avx2::eq_mask(bytes, target) },
            // SAFETY: NEON is mandatory on aarch64
            #[cfg(target_arch = "aarch64")]
            Kind::Neon => unsafe { neon::eq_mask(bytes, target) },
        }
    }

    /// Masks of bytes equal to `first` and to `second`, from one load.
    #[inline]
    pub fn eq_pair(&self, bytes: &[u8; WINDOW_SIZE], first: u8, second: u8) -> (u64, u64) {
        match self.0 {
            Kind::Scalar => eq_pair_scalar(bytes, first, second),
            // SAFETY: SSE2 is mandatory on x86_64
            #[cfg(target_arch = "x86_64")]
            Kind::Sse2 => unsafe { sse2::eq_pair(bytes, first, second) },
            // SAFETY: Avx2 is only constructed after feature detection
            #[cfg(target_arch = "x86_64")]
            Kind::Avx2 => unsafe { avx2::eq_pair(bytes, first, second) },
            // SAFETY: NEON is mandatory on aarch64
            #[cfg(target_arch = "aarch64")]
            Kind::Neon => unsafe { neon::eq_pair(bytes, first, second) },
        }
    }

    /// The classes only needed for the window being sanitized:
    /// `(separator, carriage_return)`.
    #[inline]
    pub fn field_masks(&self, bytes: &[u8; WINDOW_SIZE], separator: u8) -> (u64, u64) {
        self.eq_pair(bytes, separator, CARRIAGE_RETURN)
    }

    /// The classes the window before this one looks ahead at:
    /// `(quote, newline)`.
    #[inline]
    pub fn lookahead_masks(&self, bytes: &[u8; WINDOW_SIZE], quote: u8) -> (u64, u64) {
        self.eq_pair(bytes, quote, NEWLINE)
    }

    /// Raw masks for all four target classes.
    #[inline]
    pub fn classify(&self, bytes: &[u8; WINDOW_SIZE], quote: u8, separator: u8) -> RawMasks {
        match self.0 {
            Kind::Scalar => classify_scalar(bytes, quote, separator),
            // SAFETY: SSE2 is mandatory on x86_64
            #[cfg(target_arch = "x86_64")]
            Kind::Sse2 => unsafe { sse2::classify(bytes, quote, separator) },
            // SAFETY: Avx2 is only constructed after feature detection
            #[cfg(target_arch = "x86_64")]
            Kind::Avx2 => unsafe { avx2::classify(bytes, quote, separator) },
            // SAFETY: NEON is mandatory on aarch64
            #[cfg(target_arch = "aarch64")]
            Kind::Neon => unsafe { neon::classify(bytes, quote, separator) },
        }
    }

    /// Inclusive prefix XOR of a quote mask.
    #[inline]
    pub fn prefix_xor(&self, mask: u64) -> u64 {
        match self.0 {
            // SAFETY: Avx2 implies PCLMULQDQ was detected
            #[cfg(target_arch = "x86_64")]
            Kind::Avx2 => unsafe { avx2::prefix_xor_clmul(mask) },
            _ => prefix_xor(mask),
        }
    }

    /// Resolve the quote state of one window.
    #[inline]
    pub fn resolve(&self, input: &ResolverInput) -> ResolvedMasks {
        resolve_with_parity(input, self.prefix_xor(input.quote))
    }

    /// Overwrite the bytes selected by `masks` with their sentinels.
    #[inline]
    pub fn sanitize(
        &self,
        bytes: &mut [u8; WINDOW_SIZE],
        masks: &ResolvedMasks,
        sentinels: &Sentinels,
    ) {
        if masks.quote | masks.separator | masks.carriage_return == 0 {
            return;
        }
        match self.0 {
            // SAFETY: Avx2 is only constructed after feature detection
            #[cfg(target_arch = "x86_64")]
            Kind::Avx2 => unsafe { avx2::sanitize(bytes, masks, sentinels) },
            _ => sanitize_scalar(bytes, masks, sentinels),
        }
    }
}

impl Default for Backend {
    fn default() -> Self {
        Self::detect()
    }
}
