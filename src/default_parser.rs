//! The process-wide default parser.
//!
//! Crate-level entry points such as [`crate::parse`] consult this slot. Every
//! operation is also available on an explicit [`Parser`], so the slot is a
//! convenience, not a requirement.

use std::sync::{PoisonError, RwLock};

use tracing::debug;

use crate::parser::{Parser, rfc3986_parser};

static DEFAULT: RwLock<Option<&'static Parser>> = RwLock::new(None);

/// Returns the current default parser, the shared RFC 3986 parser unless
/// replaced.
#[must_use]
pub fn default_parser() -> &'static Parser {
    let current = *DEFAULT.read().unwrap_or_else(PoisonError::into_inner);
    current.unwrap_or_else(rfc3986_parser)
}

/// Replaces the default parser and returns the previous one.
///
/// The last writer wins. Prefer [`override_default_parser`], which restores
/// the previous default automatically.
pub fn set_default_parser(parser: &'static Parser) -> &'static Parser {
    let mut slot = DEFAULT.write().unwrap_or_else(PoisonError::into_inner);
    let previous = slot.replace(parser).unwrap_or_else(rfc3986_parser);
    debug!(
        previous = previous.id(),
        current = parser.id(),
        generation = %parser.generation(),
        "replaced default URI parser"
    );
    previous
}

/// Replaces the default parser until the returned guard is dropped.
///
/// ```
/// use uri_grammar::{default_parser, override_default_parser, rfc2396_parser, Generation};
///
/// {
///     let _guard = override_default_parser(rfc2396_parser());
///     assert_eq!(default_parser().generation(), Generation::Rfc2396);
/// }
/// assert_eq!(default_parser().generation(), Generation::Rfc3986);
/// ```
pub fn override_default_parser(parser: &'static Parser) -> DefaultParserGuard {
    DefaultParserGuard {
        previous: set_default_parser(parser),
    }
}

/// Restores the previous default parser when dropped, including during
/// unwinding.
#[derive(Debug)]
#[must_use = "the previous default parser is restored when the guard is dropped"]
pub struct DefaultParserGuard {
    previous: &'static Parser,
}

impl DefaultParserGuard {
    /// Returns the parser that will be restored.
    #[must_use]
    pub const fn previous(&self) -> &'static Parser {
        self.previous
    }
}

impl Drop for DefaultParserGuard {
    fn drop(&mut self) {
        let mut slot = DEFAULT.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(self.previous);
        debug!(restored = self.previous.id(), "restored default URI parser");
    }
}
