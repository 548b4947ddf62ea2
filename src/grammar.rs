//! Composition of rule sources into whole-reference grammars.
//!
//! Both generations are matched with two grammars: an absolute one that
//! requires a scheme, tried first, and a relative one. Named capture groups
//! map onto the nine [`Components`] slots. Look-ahead constructs of the
//! classic grammars are expressed as alternation order plus a structural
//! check after the match.

use regex::{Captures, Regex, RegexBuilder};

use crate::components::Components;
use crate::constants::{DFA_SIZE_LIMIT, LEGACY_WHITESPACE, REGEX_SIZE_LIMIT};
use crate::error::ConfigError;
use crate::pattern::{Generation, PatternSet, Rule};

/// The compiled absolute and relative grammars of one parser.
#[derive(Debug, Clone)]
pub(crate) struct Grammar {
    absolute: Regex,
    relative: Regex,
}

impl Grammar {
    pub(crate) fn compile(set: &PatternSet) -> Result<Self, ConfigError> {
        let ws = match set.generation() {
            Generation::Rfc2396 => format!("{LEGACY_WHITESPACE}*"),
            Generation::Rfc3986 => String::new(),
        };
        let absolute = absolute_body(set, &set.group(Rule::Scheme));
        let relative = relative_body(set);
        Ok(Self {
            absolute: build(&format!(r"\A{ws}{absolute}{ws}\z"))?,
            relative: build(&format!(r"\A{ws}{relative}{ws}\z"))?,
        })
    }

    /// Matches `input` and returns its components, or `None` if neither
    /// grammar matches.
    pub(crate) fn split(&self, input: &str) -> Option<Components> {
        self.absolute
            .captures(input)
            .or_else(|| self.relative.captures(input))
            .map(|caps| components(&caps))
    }
}

/// Builds an unanchored matcher for absolute URIs with the given scheme
/// source.
pub(crate) fn scheme_matcher(set: &PatternSet, scheme: &str) -> Result<Regex, ConfigError> {
    build(&absolute_body(set, scheme))
}

pub(crate) fn build(source: &str) -> Result<Regex, ConfigError> {
    RegexBuilder::new(source)
        .size_limit(REGEX_SIZE_LIMIT)
        .dfa_size_limit(DFA_SIZE_LIMIT)
        .build()
        .map_err(|e| ConfigError::InvalidPattern {
            rule: None,
            message: e.to_string(),
        })
}

fn absolute_body(set: &PatternSet, scheme: &str) -> String {
    let r = |rule| set.group(rule);
    match set.generation() {
        Generation::Rfc2396 => format!(
            concat!(
                "(?P<scheme>{scheme}):",
                "(?:(?P<opaque>{opaque})",
                "|(?:(?:(?P<authority>//)(?:(?:(?:(?P<userinfo>{userinfo})@)?(?P<host>{host})(?::(?P<port>{port}))?)?",
                "|(?P<registry>{registry}))(?P<net_path>{abs_path})?)",
                "|(?P<abs_path>{abs_path})?)",
                r"(?:\?(?P<query>{query}))?)",
                "(?:#(?P<fragment>{fragment}))?",
            ),
            scheme = scheme,
            opaque = r(Rule::Opaque),
            userinfo = r(Rule::Userinfo),
            host = r(Rule::Host),
            port = r(Rule::Port),
            registry = r(Rule::Registry),
            abs_path = r(Rule::AbsPath),
            query = r(Rule::Query),
            fragment = r(Rule::Fragment),
        ),
        Generation::Rfc3986 => format!(
            concat!(
                "(?P<scheme>{scheme}):",
                "(?:(?P<authority>//(?:(?P<userinfo>{userinfo})@)?(?P<host>{host})(?::(?P<port>{port}))?)",
                "(?P<path_abempty>{abs_path}?)",
                "|(?P<path_absolute>/(?:{pchar}+(?:/{pchar}*)*)?)",
                "|(?P<opaque>{opaque})",
                "|(?P<path_empty>))",
                r"(?:\?(?P<query>{query}))?",
                "(?:#(?P<fragment>{fragment}))?",
            ),
            scheme = scheme,
            userinfo = r(Rule::Userinfo),
            host = r(Rule::Host),
            port = r(Rule::Port),
            abs_path = r(Rule::AbsPath),
            pchar = r(Rule::Pchar),
            opaque = r(Rule::Opaque),
            query = r(Rule::Query),
            fragment = r(Rule::Fragment),
        ),
    }
}

fn relative_body(set: &PatternSet) -> String {
    let r = |rule| set.group(rule);
    match set.generation() {
        Generation::Rfc2396 => format!(
            concat!(
                "(?:(?:(?P<authority>//)(?:(?:(?:(?P<userinfo>{userinfo})@)?(?P<host>{host})(?::(?P<port>{port}))?)?",
                "|(?P<registry>{registry}))(?P<net_path>{abs_path})?)",
                "|(?P<rel_path>{rel_path})",
                "|(?P<abs_path>{abs_path}))?",
                r"(?:\?(?P<query>{query}))?",
                "(?:#(?P<fragment>{fragment}))?",
            ),
            userinfo = r(Rule::Userinfo),
            host = r(Rule::Host),
            port = r(Rule::Port),
            registry = r(Rule::Registry),
            abs_path = r(Rule::AbsPath),
            rel_path = r(Rule::RelPath),
            query = r(Rule::Query),
            fragment = r(Rule::Fragment),
        ),
        Generation::Rfc3986 => format!(
            concat!(
                "(?:(?P<authority>//(?:(?P<userinfo>{userinfo})@)?(?P<host>{host})(?::(?P<port>{port}))?)",
                "(?P<path_abempty>{abs_path}?)",
                "|(?P<path_absolute>/(?:{pchar}+(?:/{pchar}*)*)?)",
                "|(?P<path_noscheme>{rel_path})",
                "|(?P<path_empty>))",
                r"(?:\?(?P<query>{query}))?",
                "(?:#(?P<fragment>{fragment}))?",
            ),
            userinfo = r(Rule::Userinfo),
            host = r(Rule::Host),
            port = r(Rule::Port),
            abs_path = r(Rule::AbsPath),
            pchar = r(Rule::Pchar),
            rel_path = r(Rule::RelPath),
            query = r(Rule::Query),
            fragment = r(Rule::Fragment),
        ),
    }
}

fn components(caps: &Captures<'_>) -> Components {
    let get = |name| caps.name(name).map(|m| m.as_str().to_string());
    let path = [
        "net_path",
        "abs_path",
        "rel_path",
        "path_abempty",
        "path_absolute",
        "path_noscheme",
        "path_empty",
    ]
    .into_iter()
    .find_map(get);

    // An empty server after "//" is an empty host, so "//" survives recomposition.
    let registry = get("registry");
    let mut host = get("host");
    if host.is_none() && registry.is_none() && caps.name("authority").is_some() {
        host = Some(String::new());
    }

    Components {
        scheme: get("scheme"),
        userinfo: get("userinfo"),
        host,
        port: get("port"),
        registry,
        path,
        opaque: get("opaque"),
        query: get("query"),
        fragment: get("fragment"),
    }
}

/// Rejects component combinations the grammars cannot express on their own.
///
/// On success, an absent path of a non-opaque reference becomes empty.
pub(crate) fn check_structure(parts: &mut Components) -> Result<(), &'static str> {
    let path = parts.path.as_deref().unwrap_or_default();
    if parts.opaque.is_some() && (parts.has_authority() || !path.is_empty()) {
        return Err("opaque part conflicts with authority or path");
    }
    if parts.registry.is_some()
        && (parts.userinfo.is_some() || parts.host.is_some() || parts.port.is_some())
    {
        return Err("registry conflicts with server authority");
    }
    if parts.scheme.is_some()
        && parts.opaque.is_none()
        && parts.path.is_none()
        && !parts.has_authority()
    {
        return Err("absolute URI without path");
    }
    if !parts.has_authority() && path.starts_with("//") {
        return Err("path without authority cannot begin with '//'");
    }
    if parts.scheme.is_none()
        && !parts.has_authority()
        && path.split('/').next().is_some_and(|first| first.contains(':'))
    {
        return Err("first segment of a relative path cannot contain ':'");
    }
    if parts.path.is_none() && parts.opaque.is_none() {
        parts.path = Some(String::new());
    }
    Ok(())
}
