//! The process-wide default parser.
//!
//! Kept as a single test in its own binary: the default slot is global state
//! and tests within a binary run concurrently.

use std::panic;

use uri_grammar::{
    Generation, Parser, ParserConfig, Rule, default_parser, override_default_parser,
    rfc2396_parser, rfc3986_parser, set_default_parser,
};

#[test]
fn default_parser_lifecycle() {
    // Starts as the shared RFC 3986 parser
    assert!(std::ptr::eq(default_parser(), rfc3986_parser()));
    assert!(uri_grammar::split("a:").is_ok());
    assert!(uri_grammar::split("  http://a/").is_err());

    // Scoped override
    {
        let guard = override_default_parser(rfc2396_parser());
        assert!(std::ptr::eq(guard.previous(), rfc3986_parser()));
        assert_eq!(default_parser().generation(), Generation::Rfc2396);

        let parts = uri_grammar::split("  http://a/  ").unwrap();
        assert_eq!(parts.host.as_deref(), Some("a"));
        let uri = uri_grammar::parse("foo://reg$name/").unwrap();
        assert_eq!(uri.registry(), Some("reg$name"));
        assert!(std::ptr::eq(uri.parser(), rfc2396_parser()));
    }
    assert!(std::ptr::eq(default_parser(), rfc3986_parser()));

    // Restored during unwinding
    let result = panic::catch_unwind(|| {
        let _guard = override_default_parser(rfc2396_parser());
        panic!("boom");
    });
    assert!(result.is_err());
    assert!(std::ptr::eq(default_parser(), rfc3986_parser()));

    // Nested overrides restore in reverse order
    let widened: &'static Parser = Box::leak(Box::new(
        Parser::new(
            ParserConfig::rfc2396().with_override(Rule::Escaped, "%[0-9A-Fa-f]{2}|%u[0-9A-Fa-f]{4}"),
        )
        .unwrap(),
    ));
    {
        let _outer = override_default_parser(rfc2396_parser());
        {
            let _inner = override_default_parser(widened);
            assert!(uri_grammar::parse("http://a/b/%uABCD").is_ok());
            let matcher = uri_grammar::make_regexp(&["http"]).unwrap();
            assert!(matcher.is_match("see http://a/b/%uABCD"));
        }
        assert!(std::ptr::eq(default_parser(), rfc2396_parser()));
        assert!(uri_grammar::parse("http://a/b/%uABCD").is_err());
    }

    // Unscoped replacement
    let previous = set_default_parser(widened);
    assert!(std::ptr::eq(previous, rfc3986_parser()));
    let uri: uri_grammar::Uri<'static> = "http://a/%u30D0".parse().unwrap();
    assert_eq!(uri.decoded_path().unwrap().as_deref(), Some("/\u{30d0}"));
    set_default_parser(previous);
    assert!(std::ptr::eq(default_parser(), rfc3986_parser()));
}
