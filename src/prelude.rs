//! Convenient re-exports for glob imports.
//!
//! ```rust
//! use uri_grammar::prelude::*;
//!
//! let uri = rfc3986_parser().parse("http://example.com/").unwrap();
//! assert_eq!(uri.generation(), Generation::Rfc3986);
//! ```

pub use crate::{
    // Grammar engine
    Generation, Parser, ParserConfig, PatternSet, Rule, SchemeMatcher, rfc2396_parser,
    rfc3986_parser,
    // Component model
    Component, Components, Uri, UriBuilder,
    // Escaping
    ByteSet,
    // Default parser
    DefaultParserGuard, default_parser, override_default_parser, set_default_parser,
    // Errors
    ByteSetError, ConfigError, EscapeError, InvalidComponentError, InvalidUriError, InvalidUriErrorKind,
};
