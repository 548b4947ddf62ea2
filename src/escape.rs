//! Percent-encoding over raw byte sequences.
//!
//! Decoding is driven by a compiled escaped-octet pattern, so a parser whose
//! `ESCAPED` rule was widened (for example to also accept `%uHHHH`) decodes
//! the wider form while every other parser keeps rejecting it.
//!
//! ```
//! use uri_grammar::escape::{self, ByteSet, EscapePattern};
//!
//! let pattern = EscapePattern::default();
//! let encoded = escape::encode("a b/c".as_bytes(), ByteSet::RFC3986_UNRESERVED);
//! assert_eq!(encoded, "a%20b%2Fc");
//! assert_eq!(escape::decode(encoded.as_bytes(), &pattern).unwrap(), b"a b/c");
//! ```

use std::fmt;

use memchr::memchr;
use regex::bytes::{Regex, RegexBuilder};

use crate::constants::REGEX_SIZE_LIMIT;
use crate::error::{ByteSetError, ConfigError, EscapeError};

const UPPER_HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Returns the value of an ASCII hexadecimal digit.
#[must_use]
pub const fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'A'..=b'F' => Some(b - b'A' + 10),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}

/// Returns the upper-case `%HH` triplet for an octet.
#[must_use]
pub fn pct_triplet(b: u8) -> [u8; 3] {
    [
        b'%',
        UPPER_HEX[usize::from(b >> 4)],
        UPPER_HEX[usize::from(b & 0x0F)],
    ]
}

/// A set of ASCII bytes that may appear unescaped.
///
/// `%` and non-ASCII bytes can never be members, which keeps encoding
/// reversible.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteSet(u64, u64);

const ALNUM: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

impl ByteSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0, 0);

    /// `alphanum | mark` from RFC 2396.
    pub const RFC2396_UNRESERVED: Self = Self::new(ALNUM).union(Self::new(b"-_.!~*'()"));

    /// `reserved` from RFC 2396, with the RFC 2732 brackets.
    pub const RFC2396_RESERVED: Self = Self::new(b";/?:@&=+$,[]");

    /// `unreserved` from RFC 3986.
    pub const RFC3986_UNRESERVED: Self = Self::new(ALNUM).union(Self::new(b"-._~"));

    /// `sub-delims` from RFC 3986.
    pub const RFC3986_SUB_DELIMS: Self = Self::new(b"!$&'()*+,;=");

    /// `gen-delims` from RFC 3986.
    pub const RFC3986_GEN_DELIMS: Self = Self::new(b":/?#[]@");

    /// Creates a set containing the given bytes.
    ///
    /// # Panics
    ///
    /// Panics if any byte is non-ASCII or `%`. Use [`ByteSet::try_new`] for
    /// byte lists that are not known at compile time.
    #[must_use]
    pub const fn new(bytes: &[u8]) -> Self {
        match Self::try_new(bytes) {
            Ok(set) => set,
            Err(_) => panic!("cannot allow non-ASCII byte or %"),
        }
    }

    /// Creates a set containing the given bytes.
    ///
    /// # Errors
    ///
    /// Returns `ByteSetError` naming the first byte that is non-ASCII or `%`.
    pub const fn try_new(bytes: &[u8]) -> Result<Self, ByteSetError> {
        let mut lo = 0u64;
        let mut hi = 0u64;
        let mut position = 0;
        while position < bytes.len() {
            let cur = bytes[position];
            if cur == b'%' || cur >= 128 {
                return Err(ByteSetError { position, byte: cur });
            }
            if cur < 64 {
                lo |= 1 << cur;
            } else {
                hi |= 1 << (cur - 64);
            }
            position += 1;
        }
        Ok(Self(lo, hi))
    }

    /// Returns the bytes allowed by either set.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0, self.1 | other.1)
    }

    /// Returns the bytes allowed by `self` but not by `other`.
    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0, self.1 & !other.1)
    }

    /// Returns true if the byte may appear unescaped.
    #[must_use]
    pub const fn contains(self, b: u8) -> bool {
        if b < 64 {
            self.0 & (1 << b) != 0
        } else if b < 128 {
            self.1 & (1 << (b - 64)) != 0
        } else {
            false
        }
    }
}

impl fmt::Debug for ByteSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let members: String = (0u8..128)
            .filter(|b| self.contains(*b))
            .map(char::from)
            .collect();
        f.debug_tuple("ByteSet").field(&members).finish()
    }
}

/// A compiled escaped-octet pattern.
///
/// The pattern is anchored at the `%` being examined; only the bytes it
/// matches there are treated as one escape sequence.
#[derive(Debug, Clone)]
pub struct EscapePattern {
    regex: Regex,
}

impl EscapePattern {
    /// Compiles an `ESCAPED` rule source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidPattern` if the source does not compile.
    pub fn new(source: &str) -> Result<Self, ConfigError> {
        let regex = RegexBuilder::new(&format!(r"\A(?:{source})"))
            .size_limit(REGEX_SIZE_LIMIT)
            .build()
            .map_err(|e| ConfigError::InvalidPattern {
                rule: Some(crate::pattern::Rule::Escaped),
                message: e.to_string(),
            })?;
        Ok(Self { regex })
    }

    /// Returns the length of the escape sequence starting at `input[0]`.
    fn match_len(&self, input: &[u8]) -> Option<usize> {
        self.regex
            .find(input)
            .map(|m| m.end())
            .filter(|len| *len > 0)
    }
}

impl Default for EscapePattern {
    /// The `%HH` pattern shared by both grammar generations.
    fn default() -> Self {
        Self {
            regex: Regex::new(r"\A%[0-9A-Fa-f]{2}").expect("static escape pattern compiles"),
        }
    }
}

/// Replaces every byte outside `allowed` with its `%HH` triplet.
#[must_use]
pub fn encode(bytes: &[u8], allowed: ByteSet) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        if allowed.contains(b) {
            out.push(char::from(b));
        } else {
            for t in pct_triplet(b) {
                out.push(char::from(t));
            }
        }
    }
    out
}

/// Replaces every escape sequence with the octets it stands for.
///
/// Bytes outside escape sequences pass through unchanged.
///
/// # Errors
///
/// Returns `EscapeError` at the first `%` that does not begin a match of
/// `pattern`, or whose match does not decode to octets.
pub fn decode(bytes: &[u8], pattern: &EscapePattern) -> Result<Vec<u8>, EscapeError> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut pos = 0;
    while let Some(offset) = memchr(b'%', &bytes[pos..]) {
        let start = pos + offset;
        out.extend_from_slice(&bytes[pos..start]);
        let len = pattern
            .match_len(&bytes[start..])
            .ok_or(EscapeError { position: start })?;
        decode_sequence(&bytes[start..start + len], &mut out)
            .ok_or(EscapeError { position: start })?;
        pos = start + len;
    }
    out.extend_from_slice(&bytes[pos..]);
    Ok(out)
}

/// Checks every `%` in `bytes` against `pattern` without decoding.
///
/// # Errors
///
/// Returns `EscapeError` at the first `%` that does not begin a match.
pub fn validate(bytes: &[u8], pattern: &EscapePattern) -> Result<(), EscapeError> {
    let mut pos = 0;
    while let Some(offset) = memchr(b'%', &bytes[pos..]) {
        let start = pos + offset;
        let len = pattern
            .match_len(&bytes[start..])
            .ok_or(EscapeError { position: start })?;
        pos = start + len;
    }
    Ok(())
}

/// Decodes one matched sequence: `%HH`, or `%uHHHH` as UTF-8.
fn decode_sequence(seq: &[u8], out: &mut Vec<u8>) -> Option<()> {
    match seq {
        [b'%', hi, lo] => {
            out.push((hex_value(*hi)? << 4) | hex_value(*lo)?);
            Some(())
        }
        [b'%', b'u' | b'U', digits @ ..] if digits.len() == 4 => {
            let code = digits
                .iter()
                .try_fold(0u32, |acc, d| Some((acc << 4) | u32::from(hex_value(*d)?)))?;
            let c = char::from_u32(code)?;
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            Some(())
        }
        _ => None,
    }
}
