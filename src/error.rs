//! Error types for URI splitting, parsing, and component assignment.

use std::fmt;

use crate::components::Component;
use crate::pattern::{Generation, Rule};

/// Errors raised when a string is not a valid URI reference under the active
/// grammar.
///
/// Raised by [`Parser::split`](crate::Parser::split),
/// [`Parser::parse`](crate::Parser::parse) and the unescaping operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidUriError {
    /// The input that was rejected
    pub input: String,
    /// The specific failure
    pub kind: InvalidUriErrorKind,
}

/// Specific reasons an input is not a valid URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidUriErrorKind {
    /// The input bytes are not UTF-8 text
    NotText {
        /// Length of the longest valid UTF-8 prefix
        valid_up_to: usize,
    },
    /// The input does not match the grammar
    Malformed {
        /// Grammar generation that rejected the input
        generation: Generation,
    },
    /// A `%` does not start a valid escape sequence
    InvalidEscape {
        /// Byte offset of the offending `%`
        position: usize,
    },
    /// The components matched but do not form a valid URI together
    Structure {
        /// Which combination was rejected
        reason: &'static str,
    },
    /// The port is not a number in `0..=65535`
    PortOutOfRange {
        /// The port as written
        value: String,
    },
    /// Decoded octets are not UTF-8 text
    InvalidUtf8,
}

impl fmt::Display for InvalidUriError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bad URI '{}': ", self.input)?;
        match &self.kind {
            InvalidUriErrorKind::NotText { valid_up_to } => {
                write!(f, "input is not UTF-8 text (valid up to byte {valid_up_to})")
            }
            InvalidUriErrorKind::Malformed { generation } => {
                write!(f, "does not match the {generation} grammar")
            }
            InvalidUriErrorKind::InvalidEscape { position } => {
                write!(f, "invalid percent-encoding at byte {position}")
            }
            InvalidUriErrorKind::Structure { reason } => write!(f, "{reason}"),
            InvalidUriErrorKind::PortOutOfRange { value } => {
                write!(f, "port '{value}' must be a number in 0-65535")
            }
            InvalidUriErrorKind::InvalidUtf8 => write!(f, "decoded octets are not UTF-8"),
        }
    }
}

impl std::error::Error for InvalidUriError {}

/// Errors raised when a single component value is rejected.
///
/// Only component setters and [`UriBuilder::build`](crate::UriBuilder::build)
/// raise this error; splitting and parsing report every anomaly as
/// [`InvalidUriError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidComponentError {
    /// The component that was rejected
    pub component: Component,
    /// The rejected value
    pub value: String,
    /// Reason for rejection
    pub reason: &'static str,
}

impl InvalidComponentError {
    pub(crate) fn new(component: Component, value: impl Into<String>, reason: &'static str) -> Self {
        Self {
            component,
            value: value.into(),
            reason,
        }
    }
}

impl fmt::Display for InvalidComponentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bad component {} '{}': {}",
            self.component, self.value, self.reason
        )
    }
}

impl std::error::Error for InvalidComponentError {}

/// Errors raised while resolving grammar rules or compiling matchers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An override names a rule the grammar generation does not define
    UnknownRule {
        /// The rule name as given
        name: String,
        /// Generation the override was applied to, if known
        generation: Option<Generation>,
    },
    /// A rule source or composed grammar failed to compile
    InvalidPattern {
        /// The offending rule, or `None` for a composed grammar
        rule: Option<Rule>,
        /// Compiler diagnostic
        message: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownRule { name, generation } => match generation {
                Some(g) => write!(f, "rule '{name}' is not part of the {g} grammar"),
                None => write!(f, "unknown grammar rule '{name}'"),
            },
            Self::InvalidPattern { rule, message } => match rule {
                Some(r) => write!(f, "rule {r} does not compile: {message}"),
                None => write!(f, "composed grammar does not compile: {message}"),
            },
        }
    }
}

impl std::error::Error for ConfigError {}

/// A `%` that does not begin a valid escape sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscapeError {
    /// Byte offset of the offending `%`
    pub position: usize,
}

impl fmt::Display for EscapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid escape sequence at byte {}", self.position)
    }
}

impl std::error::Error for EscapeError {}

/// A byte that cannot be placed in a [`ByteSet`](crate::escape::ByteSet).
///
/// `%` and non-ASCII bytes are always escaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteSetError {
    /// Index of the offending byte in the input
    pub position: usize,
    /// The offending byte
    pub byte: u8,
}

impl fmt::Display for ByteSetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot allow byte {:#04X} at position {}: non-ASCII or '%'",
            self.byte, self.position
        )
    }
}

impl std::error::Error for ByteSetError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_uri_display_carries_input() {
        let err = InvalidUriError {
            input: "?q=%XX".to_string(),
            kind: InvalidUriErrorKind::InvalidEscape { position: 3 },
        };
        assert_eq!(
            err.to_string(),
            "bad URI '?q=%XX': invalid percent-encoding at byte 3"
        );
    }

    #[test]
    fn malformed_names_generation() {
        let err = InvalidUriError {
            input: "::".to_string(),
            kind: InvalidUriErrorKind::Malformed {
                generation: Generation::Rfc3986,
            },
        };
        assert!(err.to_string().contains("RFC3986"));
    }

    #[test]
    fn component_error_names_component() {
        let err = InvalidComponentError::new(Component::Port, "\ta", "port must be decimal digits");
        assert_eq!(
            err.to_string(),
            "bad component port '\ta': port must be decimal digits"
        );
    }

    #[test]
    fn unknown_rule_with_and_without_generation() {
        let err = ConfigError::UnknownRule {
            name: "REGISTRY".to_string(),
            generation: Some(Generation::Rfc3986),
        };
        assert_eq!(err.to_string(), "rule 'REGISTRY' is not part of the RFC3986 grammar");

        let err = ConfigError::UnknownRule {
            name: "BOGUS".to_string(),
            generation: None,
        };
        assert_eq!(err.to_string(), "unknown grammar rule 'BOGUS'");
    }
}
