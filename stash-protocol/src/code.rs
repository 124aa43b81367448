//! Six-digit numeric share codes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A 6-digit numeric code naming one live entry in a content store.
///
/// Codes are always exactly [`Code::LEN`] ASCII digits, zero-padded.
/// The file store and the text store each have their own code namespace,
/// so the same code may name a file in one and a text in the other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Code(String);

impl Code {
    /// Number of digits in a code.
    pub const LEN: usize = 6;

    /// Size of the code space: codes are drawn from `0..SPACE`.
    pub const SPACE: u32 = 1_000_000;

    /// Parse a code from its string form.
    ///
    /// Returns `None` unless the input is exactly six ASCII digits.
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() == Self::LEN && s.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(s.to_string()))
        } else {
            None
        }
    }

    /// Build a code from an index into the code space, zero-padded.
    ///
    /// Callers must pass an index below [`Code::SPACE`].
    pub fn from_index(index: u32) -> Self {
        debug_assert!(index < Self::SPACE);
        Self(format!("{index:06}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Code {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_six_digits() {
        let code = Code::parse("042137").unwrap();
        assert_eq!(code.as_str(), "042137");
    }

    #[test]
    fn parse_rejects_malformed() {
        // Too short
        assert!(Code::parse("12345").is_none());
        // Too long
        assert!(Code::parse("1234567").is_none());
        // Non-digit characters
        assert!(Code::parse("12a456").is_none());
        assert!(Code::parse("12 456").is_none());
        // Unicode digits are not ASCII digits
        assert!(Code::parse("12345٤").is_none());
        // Empty
        assert!(Code::parse("").is_none());
    }

    #[test]
    fn from_index_zero_pads() {
        assert_eq!(Code::from_index(7).as_str(), "000007");
        assert_eq!(Code::from_index(0).as_str(), "000000");
        assert_eq!(Code::from_index(999_999).as_str(), "999999");
    }

    #[test]
    fn serde_is_transparent() {
        let code = Code::parse("123456").unwrap();
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"123456\"");
        let back: Code = serde_json::from_str(&json).unwrap();
        assert_eq!(back, code);
    }
}
