//! Named grammar rules for the two URI grammar generations.
//!
//! Each generation defines an ordered list of [`Rule`]s. A rule resolves to
//! regular-expression source built from the rules listed before it, so an
//! override of `ESCAPED` flows into `USERINFO`, `HOST`, the path rules,
//! `QUERY`, and so on, while unrelated rules stay untouched.
//!
//! # Grammar Reference
//!
//! ```abnf
//! ; RFC 2396 (legacy)
//! escaped     = "%" hex hex
//! unreserved  = alphanum | "-" | "_" | "." | "!" | "~" | "*" | "'" | "(" | ")"
//! reserved    = ";" | "/" | "?" | ":" | "@" | "&" | "=" | "+" | "$" | "," | "[" | "]"
//!
//! ; RFC 3986 (current)
//! pct-encoded = "%" HEXDIG HEXDIG
//! unreserved  = ALPHA / DIGIT / "-" / "." / "_" / "~"
//! sub-delims  = "!" / "$" / "&" / "'" / "(" / ")" / "*" / "+" / "," / ";" / "="
//! ```
//!
//! Rule sources use only constructs supported by the `regex` crate, which
//! executes every pattern with finite automata in time linear in the input.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use regex::Regex;

use crate::error::ConfigError;

/// One of the two grammar generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Generation {
    /// RFC 2396, the legacy generation
    Rfc2396,
    /// RFC 3986, the current generation
    Rfc3986,
}

const RFC2396_RULES: &[Rule] = &[
    Rule::Hex,
    Rule::Escaped,
    Rule::Unreserved,
    Rule::Reserved,
    Rule::Scheme,
    Rule::Userinfo,
    Rule::Hostname,
    Rule::Ipv4Addr,
    Rule::Ipv6Addr,
    Rule::Host,
    Rule::Port,
    Rule::Registry,
    Rule::Segment,
    Rule::AbsPath,
    Rule::RelPath,
    Rule::Query,
    Rule::Fragment,
    Rule::Opaque,
];

const RFC3986_RULES: &[Rule] = &[
    Rule::Hex,
    Rule::Escaped,
    Rule::Unreserved,
    Rule::SubDelims,
    Rule::Scheme,
    Rule::Userinfo,
    Rule::Ipv4Addr,
    Rule::Ipv6Addr,
    Rule::Host,
    Rule::Port,
    Rule::Pchar,
    Rule::AbsPath,
    Rule::RelPath,
    Rule::Query,
    Rule::Fragment,
    Rule::Opaque,
];

impl Generation {
    /// Returns the rules of this generation in resolution order.
    #[must_use]
    pub const fn rules(self) -> &'static [Rule] {
        match self {
            Self::Rfc2396 => RFC2396_RULES,
            Self::Rfc3986 => RFC3986_RULES,
        }
    }

    /// Returns true if the generation defines the rule.
    #[must_use]
    pub fn defines(self, rule: Rule) -> bool {
        self.rules().contains(&rule)
    }

    /// Returns the label used when rendering parsers and their URIs.
    pub(crate) const fn parser_label(self) -> &'static str {
        match self {
            Self::Rfc2396 => "Rfc2396Parser",
            Self::Rfc3986 => "Rfc3986Parser",
        }
    }

    /// Returns the short label, `"RFC2396"` or `"RFC3986"`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Rfc2396 => "RFC2396",
            Self::Rfc3986 => "RFC3986",
        }
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A named sub-grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rule {
    /// A single hexadecimal digit
    Hex,
    /// A percent-encoded octet
    Escaped,
    /// A single unreserved character
    Unreserved,
    /// A single reserved character (legacy)
    Reserved,
    /// A single sub-delimiter character (current)
    SubDelims,
    /// The scheme name
    Scheme,
    /// The userinfo part of an authority
    Userinfo,
    /// A registered host name (legacy)
    Hostname,
    /// A dotted IPv4 address
    Ipv4Addr,
    /// An IPv6 address without brackets
    Ipv6Addr,
    /// A host, including bracketed IP literals
    Host,
    /// A port, as digits
    Port,
    /// A registry-based naming authority (legacy)
    Registry,
    /// A single path segment with parameters (legacy)
    Segment,
    /// A single path character (current)
    Pchar,
    /// A path beginning with `/`
    AbsPath,
    /// A relative path not beginning with `/`
    RelPath,
    /// The query
    Query,
    /// The fragment
    Fragment,
    /// The opaque part of a non-hierarchical URI
    Opaque,
}

impl Rule {
    /// Every rule known to any generation.
    pub const ALL: [Self; 20] = [
        Self::Hex,
        Self::Escaped,
        Self::Unreserved,
        Self::Reserved,
        Self::SubDelims,
        Self::Scheme,
        Self::Userinfo,
        Self::Hostname,
        Self::Ipv4Addr,
        Self::Ipv6Addr,
        Self::Host,
        Self::Port,
        Self::Registry,
        Self::Segment,
        Self::Pchar,
        Self::AbsPath,
        Self::RelPath,
        Self::Query,
        Self::Fragment,
        Self::Opaque,
    ];

    /// Returns the upper-case rule name, e.g. `"ESCAPED"`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Hex => "HEX",
            Self::Escaped => "ESCAPED",
            Self::Unreserved => "UNRESERVED",
            Self::Reserved => "RESERVED",
            Self::SubDelims => "SUB_DELIMS",
            Self::Scheme => "SCHEME",
            Self::Userinfo => "USERINFO",
            Self::Hostname => "HOSTNAME",
            Self::Ipv4Addr => "IPV4ADDR",
            Self::Ipv6Addr => "IPV6ADDR",
            Self::Host => "HOST",
            Self::Port => "PORT",
            Self::Registry => "REGISTRY",
            Self::Segment => "SEGMENT",
            Self::Pchar => "PCHAR",
            Self::AbsPath => "ABS_PATH",
            Self::RelPath => "REL_PATH",
            Self::Query => "QUERY",
            Self::Fragment => "FRAGMENT",
            Self::Opaque => "OPAQUE",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Rule {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|rule| rule.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownRule {
                name: s.to_string(),
                generation: None,
            })
    }
}

/// The resolved rule table of one grammar generation.
///
/// Every rule of the generation is present, holding either the generation's
/// default source or a caller-supplied override. Resolution never mutates the
/// built-in defaults.
///
/// # Examples
///
/// ```
/// use uri_grammar::{Generation, PatternSet, Rule};
///
/// let widened = PatternSet::resolve(
///     Generation::Rfc2396,
///     &[(Rule::Escaped, "%[0-9A-Fa-f]{2}|%u[0-9A-Fa-f]{4}".to_string())],
/// )
/// .unwrap();
/// assert!(widened.is_overridden(Rule::Escaped));
/// assert!(widened.get(Rule::Userinfo).unwrap().contains("%u"));
///
/// let defaults = PatternSet::defaults(Generation::Rfc2396);
/// assert!(!defaults.get(Rule::Userinfo).unwrap().contains("%u"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSet {
    generation: Generation,
    sources: BTreeMap<Rule, String>,
    overridden: Vec<Rule>,
}

impl PatternSet {
    /// Returns the default rule table of a generation.
    #[must_use]
    pub fn defaults(generation: Generation) -> Self {
        let mut sources = BTreeMap::new();
        for &rule in generation.rules() {
            let source = default_source(generation, rule, &sources);
            sources.insert(rule, source);
        }
        Self {
            generation,
            sources,
            overridden: Vec::new(),
        }
    }

    /// Resolves a generation's rule table with overrides applied.
    ///
    /// Later overrides of the same rule replace earlier ones.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - An override names a rule the generation does not define
    /// - An override source does not compile as a regular expression
    pub fn resolve(generation: Generation, overrides: &[(Rule, String)]) -> Result<Self, ConfigError> {
        let mut custom: BTreeMap<Rule, &str> = BTreeMap::new();
        for (rule, source) in overrides {
            if !generation.defines(*rule) {
                return Err(ConfigError::UnknownRule {
                    name: rule.name().to_string(),
                    generation: Some(generation),
                });
            }
            Regex::new(&group(source)).map_err(|e| ConfigError::InvalidPattern {
                rule: Some(*rule),
                message: e.to_string(),
            })?;
            custom.insert(*rule, source.as_str());
        }

        let mut sources = BTreeMap::new();
        for &rule in generation.rules() {
            let source = match custom.get(&rule) {
                Some(source) => (*source).to_string(),
                None => default_source(generation, rule, &sources),
            };
            sources.insert(rule, source);
        }

        Ok(Self {
            generation,
            sources,
            overridden: custom.into_keys().collect(),
        })
    }

    /// Returns the generation this table belongs to.
    #[must_use]
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    /// Returns the source of a rule, or `None` if the generation lacks it.
    #[must_use]
    pub fn get(&self, rule: Rule) -> Option<&str> {
        self.sources.get(&rule).map(String::as_str)
    }

    /// Returns true if the rule was supplied by an override.
    #[must_use]
    pub fn is_overridden(&self, rule: Rule) -> bool {
        self.overridden.contains(&rule)
    }

    /// Returns the overridden rules in rule order.
    #[must_use]
    pub fn overridden(&self) -> &[Rule] {
        &self.overridden
    }

    /// Returns an iterator over `(rule, source)` pairs in rule order.
    pub fn iter(&self) -> impl Iterator<Item = (Rule, &str)> {
        self.sources.iter().map(|(rule, source)| (*rule, source.as_str()))
    }

    /// Returns the rule source wrapped in a non-capturing group.
    pub(crate) fn group(&self, rule: Rule) -> String {
        self.get(rule).map(group).unwrap_or_default()
    }
}

fn group(source: &str) -> String {
    format!("(?:{source})")
}

fn default_source(generation: Generation, rule: Rule, resolved: &BTreeMap<Rule, String>) -> String {
    let r = |rule: Rule| {
        resolved
            .get(&rule)
            .map(String::as_str)
            .map(group)
            .unwrap_or_default()
    };
    match generation {
        Generation::Rfc2396 => rfc2396_source(rule, &r),
        Generation::Rfc3986 => rfc3986_source(rule, &r),
    }
}

fn rfc2396_source(rule: Rule, r: &dyn Fn(Rule) -> String) -> String {
    match rule {
        Rule::Hex => "[0-9A-Fa-f]".to_string(),
        Rule::Escaped => format!("%{hex}{hex}", hex = r(Rule::Hex)),
        Rule::Unreserved => "[-_.!~*'()A-Za-z0-9]".to_string(),
        Rule::Reserved => r"[;/?:@&=+$,\[\]]".to_string(),
        Rule::Scheme => "[A-Za-z][-+.A-Za-z0-9]*".to_string(),
        Rule::Userinfo => format!(
            "(?:{unr}|[;:&=+$,]|{esc})*",
            unr = r(Rule::Unreserved),
            esc = r(Rule::Escaped)
        ),
        Rule::Hostname => format!("(?:[-.A-Za-z0-9]|{esc})+", esc = r(Rule::Escaped)),
        Rule::Ipv4Addr => r"[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}".to_string(),
        Rule::Ipv6Addr => {
            // RFC 2373, appendix B
            let hex4 = format!("{}{{1,4}}", r(Rule::Hex));
            let lastpart = format!("(?:{hex4}|{})", r(Rule::Ipv4Addr));
            let hexseq1 = format!("(?:{hex4}:)*{hex4}");
            let hexseq2 = format!("(?:{hex4}:)*{lastpart}");
            format!("{hexseq2}|(?:{hexseq1})?::(?:{hexseq2})?")
        }
        Rule::Host => format!(
            r"{}|{}|\[{}\]",
            r(Rule::Hostname),
            r(Rule::Ipv4Addr),
            r(Rule::Ipv6Addr)
        ),
        Rule::Port => "[0-9]*".to_string(),
        Rule::Registry => format!(
            "(?:{unr}|[$,;:@&=+]|{esc})+",
            unr = r(Rule::Unreserved),
            esc = r(Rule::Escaped)
        ),
        Rule::Segment => {
            let pchar = format!(
                "(?:{unr}|[:@&=+$,]|{esc})",
                unr = r(Rule::Unreserved),
                esc = r(Rule::Escaped)
            );
            format!("{pchar}*(?:;{pchar}*)*")
        }
        Rule::AbsPath => format!("/{seg}(?:/{seg})*", seg = r(Rule::Segment)),
        Rule::RelPath => format!(
            "(?:{unr}|[;@&=+$,]|{esc})+{abs}?",
            unr = r(Rule::Unreserved),
            esc = r(Rule::Escaped),
            abs = r(Rule::AbsPath)
        ),
        Rule::Query | Rule::Fragment => format!("{}*", legacy_uric(r)),
        Rule::Opaque => format!(
            "(?:{unr}|[;?:@&=+$,]|{esc}){uric}*",
            unr = r(Rule::Unreserved),
            esc = r(Rule::Escaped),
            uric = legacy_uric(r)
        ),
        Rule::SubDelims | Rule::Pchar => String::new(),
    }
}

fn legacy_uric(r: &dyn Fn(Rule) -> String) -> String {
    format!(
        "(?:{}|{}|{})",
        r(Rule::Unreserved),
        r(Rule::Reserved),
        r(Rule::Escaped)
    )
}

fn rfc3986_source(rule: Rule, r: &dyn Fn(Rule) -> String) -> String {
    match rule {
        Rule::Hex => "[0-9A-Fa-f]".to_string(),
        Rule::Escaped => format!("%{hex}{hex}", hex = r(Rule::Hex)),
        Rule::Unreserved => "[-.0-9A-Z_a-z~]".to_string(),
        Rule::SubDelims => "[!$&'()*+,;=]".to_string(),
        Rule::Scheme => "[A-Za-z][-+.0-9A-Za-z]*".to_string(),
        Rule::Userinfo => format!(
            "(?:{esc}|{unr}|{sub}|:)*",
            esc = r(Rule::Escaped),
            unr = r(Rule::Unreserved),
            sub = r(Rule::SubDelims)
        ),
        Rule::Ipv4Addr => {
            let dec_octet = "(?:25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9][0-9]|[0-9])";
            format!(r"{dec_octet}\.{dec_octet}\.{dec_octet}\.{dec_octet}")
        }
        Rule::Ipv6Addr => {
            let h16 = format!("{}{{1,4}}", r(Rule::Hex));
            let ls32 = format!("(?:{h16}:{h16}|{})", r(Rule::Ipv4Addr));
            [
                format!("(?:{h16}:){{6}}{ls32}"),
                format!("::(?:{h16}:){{5}}{ls32}"),
                format!("(?:{h16})?::(?:{h16}:){{4}}{ls32}"),
                format!("(?:(?:{h16}:){{0,1}}{h16})?::(?:{h16}:){{3}}{ls32}"),
                format!("(?:(?:{h16}:){{0,2}}{h16})?::(?:{h16}:){{2}}{ls32}"),
                format!("(?:(?:{h16}:){{0,3}}{h16})?::{h16}:{ls32}"),
                format!("(?:(?:{h16}:){{0,4}}{h16})?::{ls32}"),
                format!("(?:(?:{h16}:){{0,5}}{h16})?::{h16}"),
                format!("(?:(?:{h16}:){{0,6}}{h16})?::"),
            ]
            .join("|")
        }
        Rule::Host => format!(
            r"\[(?:{ipv6}|v{hex}+\.(?:{unr}|{sub}|:)+)\]|{ipv4}|(?:{esc}|{unr}|{sub})*",
            ipv6 = r(Rule::Ipv6Addr),
            hex = r(Rule::Hex),
            unr = r(Rule::Unreserved),
            sub = r(Rule::SubDelims),
            ipv4 = r(Rule::Ipv4Addr),
            esc = r(Rule::Escaped)
        ),
        Rule::Port => "[0-9]*".to_string(),
        Rule::Pchar => format!(
            "{esc}|{unr}|{sub}|[:@]",
            esc = r(Rule::Escaped),
            unr = r(Rule::Unreserved),
            sub = r(Rule::SubDelims)
        ),
        Rule::AbsPath => format!("(?:/{}*)+", r(Rule::Pchar)),
        Rule::RelPath => format!(
            "(?:{esc}|{unr}|{sub}|@)+(?:/{pchar}*)*",
            esc = r(Rule::Escaped),
            unr = r(Rule::Unreserved),
            sub = r(Rule::SubDelims),
            pchar = r(Rule::Pchar)
        ),
        Rule::Query | Rule::Fragment => format!("(?:{}|[/?])*", r(Rule::Pchar)),
        Rule::Opaque => format!(
            r"{pchar}+(?:/{pchar}*)*(?:\?{query})?",
            pchar = r(Rule::Pchar),
            query = r(Rule::Query)
        ),
        Rule::Reserved | Rule::Hostname | Rule::Registry | Rule::Segment => String::new(),
    }
}
