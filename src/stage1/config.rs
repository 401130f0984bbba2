//! Configuration for stage-1 scanning.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::window::FILLER;
use crate::error::ScanError;

/// Carriage return byte.
pub const CARRIAGE_RETURN: u8 = b'\r';

/// Newline byte.
pub const NEWLINE: u8 = b'\n';

/// Replacement bytes written over structural-looking bytes found inside
/// quoted fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sentinels {
    /// Replaces both halves of an escaped quote pair (default: 0x03)
    pub quote: u8,
    /// Replaces a delimiter inside quotes (default: 0x02)
    pub separator: u8,
    /// Replaces a carriage return inside quotes (default: b'\n')
    pub carriage_return: u8,
}

impl Default for Sentinels {
    fn default() -> Self {
        Self {
            quote: 0x03,
            separator: 0x02,
            carriage_return: NEWLINE,
        }
    }
}

/// Configuration for stage-1 scanning.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScanConfig {
    /// Field delimiter (default: b',')
    pub delimiter: u8,
    /// Quote character (default: b'"')
    pub quote_char: u8,
    /// Sentinel bytes used by the sanitizer
    pub sentinels: Sentinels,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote_char: b'"',
            sentinels: Sentinels::default(),
        }
    }
}

impl ScanConfig {
    /// Create a CSV configuration (comma-separated).
    pub fn csv() -> Self {
        Self::default()
    }

    /// Create a TSV configuration (tab-separated).
    pub fn tsv() -> Self {
        Self {
            delimiter: b'\t',
            ..Self::default()
        }
    }

    /// Create a PSV configuration (pipe-separated).
    pub fn psv() -> Self {
        Self {
            delimiter: b'|',
            ..Self::default()
        }
    }

    /// Set the field delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the quote character.
    pub fn with_quote_char(mut self, quote_char: u8) -> Self {
        self.quote_char = quote_char;
        self
    }

    /// Set the sentinel bytes.
    pub fn with_sentinels(mut self, sentinels: Sentinels) -> Self {
        self.sentinels = sentinels;
        self
    }

    /// Byte used to pad the final partial window.
    ///
    /// [`FILLER`] unless the delimiter or quote character is a space, in which
    /// case `0x00` (or `0x01` if that is taken too).
    pub fn filler(&self) -> u8 {
        [FILLER, 0x00, 0x01]
            .into_iter()
            .find(|&byte| byte != self.delimiter && byte != self.quote_char)
            .unwrap_or(FILLER)
    }

    /// Check that every target byte is distinct from the others and from the
    /// sentinels that will stand in for it.
    pub fn validate(&self) -> Result<(), ScanError> {
        let invalid = |reason| Err(ScanError::InvalidConfig { reason });

        if self.delimiter == self.quote_char {
            return invalid("delimiter equals quote character");
        }
        if is_line_terminator(self.delimiter) {
            return invalid("delimiter is a line terminator");
        }
        if is_line_terminator(self.quote_char) {
            return invalid("quote character is a line terminator");
        }

        let s = &self.sentinels;
        let targets = [self.delimiter, self.quote_char, CARRIAGE_RETURN];
        if targets.contains(&s.quote) || s.quote == NEWLINE {
            return invalid("quote sentinel collides with a structural byte");
        }
        if targets.contains(&s.separator) || s.separator == NEWLINE {
            return invalid("separator sentinel collides with a structural byte");
        }
        if targets.contains(&s.carriage_return) {
            return invalid("carriage return sentinel collides with a structural byte");
        }
        if s.quote == s.separator {
            return invalid("quote and separator sentinels are equal");
        }

        Ok(())
    }
}

#[inline]
fn is_line_terminator(byte: u8) -> bool {
    byte == CARRIAGE_RETURN || byte == NEWLINE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(ScanConfig::csv().delimiter, b',');
        assert_eq!(ScanConfig::tsv().delimiter, b'\t');
        assert_eq!(ScanConfig::psv().delimiter, b'|');
        assert_eq!(ScanConfig::csv().quote_char, b'"');
    }

    #[test]
    fn test_default_validates() {
        assert!(ScanConfig::csv().validate().is_ok());
        assert!(ScanConfig::tsv().validate().is_ok());
        assert!(ScanConfig::psv().validate().is_ok());
        assert!(ScanConfig::csv().with_quote_char(b'\'').validate().is_ok());
    }

    #[test]
    fn test_delimiter_equals_quote() {
        let config = ScanConfig::csv().with_delimiter(b'"');
        assert_eq!(
            config.validate(),
            Err(ScanError::InvalidConfig {
                reason: "delimiter equals quote character"
            })
        );
    }

    #[test]
    fn test_terminators_rejected() {
        assert!(ScanConfig::csv().with_delimiter(b'\n').validate().is_err());
        assert!(ScanConfig::csv().with_quote_char(b'\r').validate().is_err());
    }

    #[test]
    fn test_filler_avoids_targets() {
        assert_eq!(ScanConfig::csv().filler(), b' ');

        let spaced = ScanConfig::csv().with_delimiter(b' ');
        assert!(spaced.validate().is_ok());
        assert_eq!(spaced.filler(), 0x00);

        let spaced_quote = ScanConfig::csv().with_quote_char(b' ');
        assert!(spaced_quote.validate().is_ok());
        assert_eq!(spaced_quote.filler(), 0x00);

        let both = ScanConfig::csv().with_delimiter(b' ').with_quote_char(0x00);
        assert_eq!(both.filler(), 0x01);
    }

    #[test]
    fn test_sentinel_collisions() {
        let config = ScanConfig::csv().with_sentinels(Sentinels {
            separator: b',',
            ..Sentinels::default()
        });
        assert!(config.validate().is_err());

        let config = ScanConfig::csv().with_sentinels(Sentinels {
            quote: 0x02,
            ..Sentinels::default()
        });
        assert!(config.validate().is_err());

        let config = ScanConfig::csv().with_sentinels(Sentinels {
            carriage_return: b'\r',
            ..Sentinels::default()
        });
        assert!(config.validate().is_err());
    }
}
