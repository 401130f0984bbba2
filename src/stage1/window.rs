//! Boundary loader: 64-byte windows over the scan buffer.
//!
//! A window is always 64 bytes wide. When the buffer ends inside a window,
//! only the real bytes are copied and the remaining lanes hold a filler byte
//! that never equals a target class (see [`ScanConfig::filler`]). Only the
//! valid prefix is ever written back.
//!
//! [`ScanConfig::filler`]: super::ScanConfig::filler

/// Number of bytes classified per iteration (two 32-byte lanes).
pub const WINDOW_SIZE: usize = 64;

/// Preferred inert byte for lanes past the end of the buffer.
pub const FILLER: u8 = b' ';

/// A 64-byte view of the buffer at a given offset.
#[derive(Clone, Copy, Debug)]
pub struct Window {
    bytes: [u8; WINDOW_SIZE],
    offset: usize,
    valid: usize,
    eof_newline: u64,
}

impl Window {
    /// Load the window starting at `offset`.
    ///
    /// Reads directly when `offset + 64 <= buffer.len()`, otherwise copies the
    /// `buffer.len() - offset` remaining bytes and pads with `filler`. An
    /// offset at or past the end yields a window made entirely of filler.
    #[inline]
    pub fn load(buffer: &[u8], offset: usize, filler: u8) -> Self {
        let len = buffer.len();
        let mut bytes = [filler; WINDOW_SIZE];

        let valid = if offset >= len {
            0
        } else if len - offset >= WINDOW_SIZE {
            bytes.copy_from_slice(&buffer[offset..offset + WINDOW_SIZE]);
            WINDOW_SIZE
        } else {
            let remaining = len - offset;
            bytes[..remaining].copy_from_slice(&buffer[offset..]);
            remaining
        };

        // The end of data acts as a record terminator when it falls inside
        // this window.
        let eof_newline = if offset <= len && len - offset < WINDOW_SIZE {
            1u64 << (len - offset)
        } else {
            0
        };

        Self {
            bytes,
            offset,
            valid,
            eof_newline,
        }
    }

    /// Window bytes, filler included.
    #[inline]
    pub fn bytes(&self) -> &[u8; WINDOW_SIZE] {
        &self.bytes
    }

    /// Mutable window bytes, filler included.
    #[inline]
    pub fn bytes_mut(&mut self) -> &mut [u8; WINDOW_SIZE] {
        &mut self.bytes
    }

    /// Absolute buffer offset of the first byte.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of bytes that came from the buffer.
    #[inline]
    pub fn valid_len(&self) -> usize {
        self.valid
    }

    /// True if some lanes hold filler.
    #[inline]
    pub fn is_partial(&self) -> bool {
        self.valid < WINDOW_SIZE
    }

    /// Bit at the position just past the last buffer byte, if that position
    /// lies within this window.
    #[inline]
    pub fn eof_newline(&self) -> u64 {
        self.eof_newline
    }

    /// Write the valid prefix back to the buffer at the window's offset.
    #[inline]
    pub fn store(&self, buffer: &mut [u8]) {
        if self.valid == 0 {
            return;
        }
        buffer[self.offset..self.offset + self.valid].copy_from_slice(&self.bytes[..self.valid]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_load() {
        let buffer: Vec<u8> = (0..128u8).collect();
        let window = Window::load(&buffer, 64, FILLER);

        assert_eq!(window.valid_len(), 64);
        assert!(!window.is_partial());
        assert_eq!(window.bytes()[0], 64);
        assert_eq!(window.bytes()[63], 127);
        assert_eq!(window.eof_newline(), 0);
    }

    #[test]
    fn test_partial_load_pads_with_filler() {
        let buffer = vec![b'x'; 70];
        let window = Window::load(&buffer, 64, FILLER);

        assert_eq!(window.valid_len(), 6);
        assert!(window.is_partial());
        assert!(window.bytes()[..6].iter().all(|&b| b == b'x'));
        assert!(window.bytes()[6..].iter().all(|&b| b == FILLER));
        assert_eq!(window.eof_newline(), 1 << 6);
    }

    #[test]
    fn test_partial_load_uses_given_filler() {
        let buffer = vec![b'x'; 3];
        let window = Window::load(&buffer, 0, 0x00);

        assert_eq!(&window.bytes()[..3], b"xxx");
        assert!(window.bytes()[3..].iter().all(|&b| b == 0x00));
    }

    #[test]
    fn test_load_past_end_is_all_filler() {
        let buffer = vec![b'x'; 10];
        let window = Window::load(&buffer, 64, FILLER);

        assert_eq!(window.valid_len(), 0);
        assert!(window.bytes().iter().all(|&b| b == FILLER));
        // End of data lies in an earlier window.
        assert_eq!(window.eof_newline(), 0);
    }

    #[test]
    fn test_eof_bit_only_in_window_containing_end() {
        let buffer = vec![b'x'; 128];
        assert_eq!(Window::load(&buffer, 0, FILLER).eof_newline(), 0);
        assert_eq!(Window::load(&buffer, 64, FILLER).eof_newline(), 0);
        assert_eq!(Window::load(&buffer, 128, FILLER).eof_newline(), 1);
    }

    #[test]
    fn test_store_writes_only_valid_prefix() {
        let mut buffer = vec![b'a'; 70];
        let mut window = Window::load(&buffer, 64, FILLER);
        for byte in window.bytes_mut().iter_mut() {
            *byte = b'z';
        }
        window.store(&mut buffer);

        assert_eq!(buffer.len(), 70);
        assert!(buffer[..64].iter().all(|&b| b == b'a'));
        assert!(buffer[64..].iter().all(|&b| b == b'z'));
    }

    #[test]
    fn test_empty_buffer() {
        let mut buffer: Vec<u8> = Vec::new();
        let window = Window::load(&buffer, 0, FILLER);
        assert_eq!(window.valid_len(), 0);
        assert_eq!(window.eof_newline(), 1);
        window.store(&mut buffer);
        assert!(buffer.is_empty());
    }
}
