//! The grammar engine: an immutable, identity-bearing URI parser.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

use regex::Regex;
use tracing::{debug, trace};

use crate::components::Components;
use crate::config::ParserConfig;
use crate::error::{ConfigError, InvalidUriError, InvalidUriErrorKind};
use crate::escape::{self, ByteSet, EscapePattern};
use crate::grammar::{self, Grammar};
use crate::pattern::{Generation, PatternSet, Rule};
use crate::uri::Uri;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

static RFC2396: LazyLock<Parser> = LazyLock::new(Parser::rfc2396);
static RFC3986: LazyLock<Parser> = LazyLock::new(Parser::rfc3986);

/// Returns the shared RFC 2396 parser.
#[must_use]
pub fn rfc2396_parser() -> &'static Parser {
    &RFC2396
}

/// Returns the shared RFC 3986 parser.
#[must_use]
pub fn rfc3986_parser() -> &'static Parser {
    &RFC3986
}

/// A compiled URI grammar.
///
/// A parser is immutable once built and can be shared across threads. Each
/// instance has its own identity: two parsers built from the same
/// configuration are distinct, and [`Uri::strict_eq`] tells their URIs apart.
///
/// All matching runs in time linear in the input length.
///
/// # Examples
///
/// ```
/// use uri_grammar::rfc3986_parser;
///
/// let uri = rfc3986_parser().parse("http://example.com/a?q=1#top").unwrap();
/// assert_eq!(uri.host(), Some("example.com"));
/// assert_eq!(uri.path(), "/a");
/// assert_eq!(uri.query(), Some("q=1"));
/// assert_eq!(uri.fragment(), Some("top"));
/// ```
pub struct Parser {
    id: u64,
    patterns: PatternSet,
    grammar: Grammar,
    escaped: EscapePattern,
    validators: BTreeMap<Rule, Regex>,
}

impl Parser {
    /// Builds a parser from a configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override names a rule the generation does
    /// not define, or if a rule or the composed grammar does not compile.
    pub fn new(config: ParserConfig) -> Result<Self, ConfigError> {
        Self::from_patterns(config.resolve()?)
    }

    /// Builds a parser from a resolved rule table.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a rule or the composed grammar does not
    /// compile.
    pub fn from_patterns(patterns: PatternSet) -> Result<Self, ConfigError> {
        let grammar = Grammar::compile(&patterns)?;
        let escaped = EscapePattern::new(patterns.get(Rule::Escaped).unwrap_or_default())?;
        let validators = patterns
            .iter()
            .map(|(rule, source)| {
                let regex = grammar::build(&format!(r"\A(?:{source})\z")).map_err(|e| match e {
                    ConfigError::InvalidPattern { message, .. } => ConfigError::InvalidPattern {
                        rule: Some(rule),
                        message,
                    },
                    other => other,
                })?;
                Ok((rule, regex))
            })
            .collect::<Result<BTreeMap<_, _>, ConfigError>>()?;

        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        debug!(
            generation = %patterns.generation(),
            id,
            overridden = ?patterns.overridden(),
            "built URI parser"
        );

        Ok(Self {
            id,
            patterns,
            grammar,
            escaped,
            validators,
        })
    }

    /// Builds a fresh RFC 2396 parser with default rules.
    ///
    /// # Panics
    ///
    /// Panics if the built-in grammar fails to compile, which the test suite
    /// rules out.
    #[must_use]
    pub fn rfc2396() -> Self {
        Self::new(ParserConfig::rfc2396()).expect("built-in RFC 2396 grammar compiles")
    }

    /// Builds a fresh RFC 3986 parser with default rules.
    ///
    /// # Panics
    ///
    /// Panics if the built-in grammar fails to compile, which the test suite
    /// rules out.
    #[must_use]
    pub fn rfc3986() -> Self {
        Self::new(ParserConfig::rfc3986()).expect("built-in RFC 3986 grammar compiles")
    }

    /// Returns the grammar generation.
    #[must_use]
    pub const fn generation(&self) -> Generation {
        self.patterns.generation()
    }

    /// Returns the resolved rule table.
    #[must_use]
    pub const fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    /// Returns the process-unique instance number.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Splits a URI reference into its nine components.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUriError` if the input is not UTF-8 text, does not
    /// match the grammar, or its components conflict.
    ///
    /// # Examples
    ///
    /// ```
    /// use uri_grammar::rfc3986_parser;
    ///
    /// let parts = rfc3986_parser().split("//[0::0]").unwrap();
    /// assert_eq!(parts.scheme, None);
    /// assert_eq!(parts.host.as_deref(), Some("[0::0]"));
    /// assert_eq!(parts.path.as_deref(), Some(""));
    ///
    /// assert!(rfc3986_parser().split("foo@example:foo").is_err());
    /// ```
    pub fn split(&self, input: impl AsRef<[u8]>) -> Result<Components, InvalidUriError> {
        let bytes = input.as_ref();
        let text = std::str::from_utf8(bytes).map_err(|e| InvalidUriError {
            input: String::from_utf8_lossy(bytes).into_owned(),
            kind: InvalidUriErrorKind::NotText {
                valid_up_to: e.valid_up_to(),
            },
        })?;
        self.split_str(text).inspect_err(|e| {
            trace!(
                generation = %self.generation(),
                len = text.len(),
                kind = ?e.kind,
                "split failed"
            );
        })
    }

    fn split_str(&self, input: &str) -> Result<Components, InvalidUriError> {
        let error = |kind| InvalidUriError {
            input: input.to_string(),
            kind,
        };
        let Some(mut parts) = self.grammar.split(input) else {
            let kind = match escape::validate(input.as_bytes(), &self.escaped) {
                Err(e) => InvalidUriErrorKind::InvalidEscape {
                    position: e.position,
                },
                Ok(()) => InvalidUriErrorKind::Malformed {
                    generation: self.generation(),
                },
            };
            return Err(error(kind));
        };
        grammar::check_structure(&mut parts)
            .map_err(|reason| error(InvalidUriErrorKind::Structure { reason }))?;
        Ok(parts)
    }

    /// Parses a URI reference into a [`Uri`] bound to this parser.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUriError` if splitting fails or the port does not fit
    /// in 16 bits.
    pub fn parse(&self, input: impl AsRef<[u8]>) -> Result<Uri<'_>, InvalidUriError> {
        let parts = self.split(input.as_ref())?;
        Uri::from_components(self, parts).map_err(|kind| InvalidUriError {
            input: String::from_utf8_lossy(input.as_ref()).into_owned(),
            kind,
        })
    }

    /// Decodes escape sequences using this parser's `ESCAPED` rule.
    ///
    /// Bytes outside escape sequences, including raw UTF-8, pass through.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUriError` with kind `InvalidEscape` at the first `%`
    /// that does not begin a valid escape sequence.
    pub fn unescape(&self, input: impl AsRef<[u8]>) -> Result<Vec<u8>, InvalidUriError> {
        let bytes = input.as_ref();
        escape::decode(bytes, &self.escaped).map_err(|e| InvalidUriError {
            input: String::from_utf8_lossy(bytes).into_owned(),
            kind: InvalidUriErrorKind::InvalidEscape {
                position: e.position,
            },
        })
    }

    /// Decodes escape sequences into text.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUriError` if an escape sequence is invalid or the
    /// decoded octets are not UTF-8.
    ///
    /// # Examples
    ///
    /// ```
    /// use uri_grammar::rfc3986_parser;
    ///
    /// let parser = rfc3986_parser();
    /// assert_eq!(parser.unescape_str("%e3%83%90").unwrap(), "\u{30d0}");
    /// assert!(parser.unescape_str("%zz").is_err());
    /// ```
    pub fn unescape_str(&self, input: &str) -> Result<String, InvalidUriError> {
        let bytes = self.unescape(input)?;
        String::from_utf8(bytes).map_err(|_| InvalidUriError {
            input: input.to_string(),
            kind: InvalidUriErrorKind::InvalidUtf8,
        })
    }

    /// Percent-encodes every byte outside the generation's unreserved and
    /// reserved characters.
    #[must_use]
    pub fn escape(&self, input: impl AsRef<[u8]>) -> String {
        escape::encode(input.as_ref(), safe_set(self.generation()))
    }

    /// Percent-encodes every byte outside `allowed`.
    #[must_use]
    pub fn escape_with(&self, input: impl AsRef<[u8]>, allowed: ByteSet) -> String {
        escape::encode(input.as_ref(), allowed)
    }

    /// Builds a matcher for absolute URIs whose scheme is one of `schemes`,
    /// compared case-insensitively. An empty list accepts any scheme.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a name does not match the `SCHEME` rule or
    /// the composed matcher does not compile.
    ///
    /// # Examples
    ///
    /// ```
    /// use uri_grammar::rfc3986_parser;
    ///
    /// let http = rfc3986_parser().make_regexp(&["HTTP"]).unwrap();
    /// assert!(http.is_match("HTTP://EXAMPLE.COM/"));
    /// assert!(http.is_match("http://example.com/"));
    /// assert!(!http.is_match("https://example.com/"));
    /// ```
    pub fn make_regexp(&self, schemes: &[&str]) -> Result<SchemeMatcher, ConfigError> {
        let scheme = if schemes.is_empty() {
            format!(r"\b{}", self.patterns.group(Rule::Scheme))
        } else {
            let names = schemes
                .iter()
                .map(|name| {
                    if self.validate(Rule::Scheme, name) {
                        Ok(regex::escape(name))
                    } else {
                        Err(ConfigError::InvalidPattern {
                            rule: Some(Rule::Scheme),
                            message: format!("'{name}' is not a scheme name"),
                        })
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;
            // ASCII folding only: Unicode folding maps U+017F to 's' and U+212A to 'k'
            format!(r"\b(?i-u:{})", names.join("|"))
        };
        Ok(SchemeMatcher {
            regex: grammar::scheme_matcher(&self.patterns, &scheme)?,
        })
    }

    /// Returns true if the whole of `value` matches `rule`.
    ///
    /// Rules the generation does not define never match.
    #[must_use]
    pub fn validate(&self, rule: Rule, value: &str) -> bool {
        self.validators
            .get(&rule)
            .is_some_and(|regex| regex.is_match(value))
    }
}

fn safe_set(generation: Generation) -> ByteSet {
    match generation {
        Generation::Rfc2396 => ByteSet::RFC2396_UNRESERVED.union(ByteSet::RFC2396_RESERVED),
        Generation::Rfc3986 => ByteSet::RFC3986_UNRESERVED
            .union(ByteSet::RFC3986_SUB_DELIMS)
            .union(ByteSet::RFC3986_GEN_DELIMS),
    }
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(self.generation().parser_label())
            .field("id", &self.id)
            .field("overridden", &self.patterns.overridden())
            .finish_non_exhaustive()
    }
}

/// Finds absolute URIs with selected schemes in text.
///
/// Matching is unanchored, so the matcher can extract URIs embedded in
/// prose.
///
/// ```
/// use uri_grammar::rfc3986_parser;
///
/// let matcher = rfc3986_parser().make_regexp(&["http", "ftp"]).unwrap();
/// let found: Vec<&str> = matcher
///     .find_iter("see http://example.com/a and ftp://files.example/ or mailto:x@y")
///     .collect();
/// assert_eq!(found, ["http://example.com/a", "ftp://files.example/"]);
/// ```
#[derive(Debug, Clone)]
pub struct SchemeMatcher {
    regex: Regex,
}

impl SchemeMatcher {
    /// Returns true if `text` contains a matching URI.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Returns the first matching URI in `text`.
    #[must_use]
    pub fn find<'h>(&self, text: &'h str) -> Option<&'h str> {
        self.regex.find(text).map(|m| m.as_str())
    }

    /// Returns every non-overlapping matching URI in `text`.
    pub fn find_iter<'h>(&self, text: &'h str) -> impl Iterator<Item = &'h str> {
        self.regex.find_iter(text).map(|m| m.as_str())
    }

    /// Returns the underlying regular expression.
    #[must_use]
    pub const fn as_regex(&self) -> &Regex {
        &self.regex
    }
}
