//! The decomposed, mutable URI value.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::components::{Component, Components};
use crate::default_parser::default_parser;
use crate::error::{InvalidComponentError, InvalidUriError, InvalidUriErrorKind};
use crate::parser::Parser;
use crate::pattern::{Generation, Rule};
use crate::scheme;

/// A parsed URI reference bound to the parser that produced it.
///
/// Components are stored in their encoded form. Setters validate the new
/// value with the owning parser's grammar and leave the URI unchanged on
/// failure.
///
/// Two URIs are equal (`==`) when their components are equal;
/// [`strict_eq`](Self::strict_eq) also requires the same parser instance.
///
/// # Examples
///
/// ```
/// use uri_grammar::rfc3986_parser;
///
/// let mut uri = rfc3986_parser().parse("HTTP://al%40ice@example.com:8080/a").unwrap();
/// assert_eq!(uri.scheme(), Some("http"));
/// assert_eq!(uri.user(), Some("al%40ice"));
/// assert_eq!(uri.decoded_user().unwrap().as_deref(), Some("al@ice"));
/// assert_eq!(uri.port(), Some(8080));
///
/// uri.set_path("/b/c").unwrap();
/// uri.set_query(Some("x=1")).unwrap();
/// assert_eq!(uri.to_string(), "http://al%40ice@example.com:8080/b/c?x=1");
///
/// assert!(uri.set_port_str("80a").is_err());
/// assert_eq!(uri.port(), Some(8080));
/// ```
#[derive(Clone)]
pub struct Uri<'p> {
    scheme: Option<String>,
    user: Option<String>,
    password: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    registry: Option<String>,
    path: String,
    opaque: Option<String>,
    query: Option<String>,
    fragment: Option<String>,
    parser: &'p Parser,
}

impl<'p> Uri<'p> {
    /// Creates an empty relative reference bound to `parser`.
    pub(crate) const fn empty(parser: &'p Parser) -> Self {
        Self {
            scheme: None,
            user: None,
            password: None,
            host: None,
            port: None,
            registry: None,
            path: String::new(),
            opaque: None,
            query: None,
            fragment: None,
            parser,
        }
    }

    pub(crate) fn from_components(
        parser: &'p Parser,
        parts: Components,
    ) -> Result<Self, InvalidUriErrorKind> {
        let port = match parts.port.as_deref() {
            None | Some("") => None,
            Some(digits) => Some(digits.parse::<u16>().map_err(|_| {
                InvalidUriErrorKind::PortOutOfRange {
                    value: digits.to_string(),
                }
            })?),
        };
        let (user, password) = match parts.userinfo {
            Some(userinfo) => {
                let (user, password) = split_userinfo(&userinfo);
                (Some(user), password)
            }
            None => (None, None),
        };
        Ok(Self {
            scheme: parts.scheme.map(|s| s.to_ascii_lowercase()),
            user,
            password,
            host: parts.host,
            port,
            registry: parts.registry,
            path: parts.path.unwrap_or_default(),
            opaque: parts.opaque,
            query: parts.query,
            fragment: parts.fragment,
            parser,
        })
    }

    /// Returns the scheme, lower-cased.
    #[must_use]
    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    /// Returns the user, percent-encoded.
    #[must_use]
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Returns the password, percent-encoded.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Returns `user[:password]`, percent-encoded.
    #[must_use]
    pub fn userinfo(&self) -> Option<String> {
        let user = self.user.as_deref()?;
        Some(match &self.password {
            Some(password) => format!("{user}:{password}"),
            None => user.to_string(),
        })
    }

    /// Returns the host; IP literals keep their brackets.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Returns the explicit port.
    #[must_use]
    pub const fn port(&self) -> Option<u16> {
        self.port
    }

    /// Returns the registry-based authority.
    #[must_use]
    pub fn registry(&self) -> Option<&str> {
        self.registry.as_deref()
    }

    /// Returns the path, possibly empty.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the opaque part of a non-hierarchical URI.
    #[must_use]
    pub fn opaque(&self) -> Option<&str> {
        self.opaque.as_deref()
    }

    /// Returns the query, without the leading `?`.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Returns the fragment, without the leading `#`.
    #[must_use]
    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// Returns the parser this URI is bound to.
    #[must_use]
    pub const fn parser(&self) -> &'p Parser {
        self.parser
    }

    /// Returns the grammar generation of the owning parser.
    #[must_use]
    pub const fn generation(&self) -> Generation {
        self.parser.generation()
    }

    /// Returns the user with escape sequences decoded.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUriError` if an escape sequence is invalid or the
    /// decoded octets are not UTF-8.
    pub fn decoded_user(&self) -> Result<Option<String>, InvalidUriError> {
        self.decode(self.user.as_deref())
    }

    /// Returns the password with escape sequences decoded.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUriError` if an escape sequence is invalid or the
    /// decoded octets are not UTF-8.
    pub fn decoded_password(&self) -> Result<Option<String>, InvalidUriError> {
        self.decode(self.password.as_deref())
    }

    /// Returns the host with escape sequences decoded.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUriError` if an escape sequence is invalid or the
    /// decoded octets are not UTF-8.
    pub fn decoded_host(&self) -> Result<Option<String>, InvalidUriError> {
        self.decode(self.host.as_deref())
    }

    /// Returns the path with escape sequences decoded, or `None` for an
    /// opaque URI.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUriError` if an escape sequence is invalid or the
    /// decoded octets are not UTF-8.
    pub fn decoded_path(&self) -> Result<Option<String>, InvalidUriError> {
        if self.opaque.is_some() {
            return Ok(None);
        }
        self.decode(Some(self.path.as_str()))
    }

    /// Returns the query with escape sequences decoded.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUriError` if an escape sequence is invalid or the
    /// decoded octets are not UTF-8.
    pub fn decoded_query(&self) -> Result<Option<String>, InvalidUriError> {
        self.decode(self.query.as_deref())
    }

    /// Returns the fragment with escape sequences decoded.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUriError` if an escape sequence is invalid or the
    /// decoded octets are not UTF-8.
    pub fn decoded_fragment(&self) -> Result<Option<String>, InvalidUriError> {
        self.decode(self.fragment.as_deref())
    }

    fn decode(&self, value: Option<&str>) -> Result<Option<String>, InvalidUriError> {
        value.map(|v| self.parser.unescape_str(v)).transpose()
    }

    /// Sets or clears the scheme. The scheme is stored lower-cased.
    ///
    /// # Errors
    ///
    /// Returns `InvalidComponentError` if the scheme does not match the
    /// grammar, or if clearing it leaves an opaque part without a scheme.
    pub fn set_scheme(&mut self, scheme: Option<&str>) -> Result<(), InvalidComponentError> {
        self.update(Component::Scheme, scheme)
    }

    /// Sets or clears `user[:password]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidComponentError` if the value does not match the
    /// grammar or conflicts with a registry or opaque part.
    pub fn set_userinfo(&mut self, userinfo: Option<&str>) -> Result<(), InvalidComponentError> {
        self.update(Component::Userinfo, userinfo)
    }

    /// Sets or clears the user. Clearing the user also clears the password.
    ///
    /// # Errors
    ///
    /// Returns `InvalidComponentError` if the value does not match the
    /// grammar, contains `:`, or conflicts with a registry or opaque part.
    pub fn set_user(&mut self, user: Option<&str>) -> Result<(), InvalidComponentError> {
        self.update(Component::User, user)
    }

    /// Sets or clears the password.
    ///
    /// # Errors
    ///
    /// Returns `InvalidComponentError` if the value does not match the
    /// grammar or no user is set.
    pub fn set_password(&mut self, password: Option<&str>) -> Result<(), InvalidComponentError> {
        self.update(Component::Password, password)
    }

    /// Sets or clears the host.
    ///
    /// # Errors
    ///
    /// Returns `InvalidComponentError` if the host does not match the
    /// grammar or conflicts with the other components.
    pub fn set_host(&mut self, host: Option<&str>) -> Result<(), InvalidComponentError> {
        self.update(Component::Host, host)
    }

    /// Sets or clears the port.
    ///
    /// # Errors
    ///
    /// Returns `InvalidComponentError` if the port does not match the
    /// grammar or conflicts with a registry or opaque part.
    pub fn set_port(&mut self, port: Option<u16>) -> Result<(), InvalidComponentError> {
        let digits = port.map(|p| p.to_string());
        self.update(Component::Port, digits.as_deref())
    }

    /// Sets the port from its decimal form. An empty string clears it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidComponentError` if the value is not decimal digits,
    /// does not fit in 16 bits, or conflicts with the other components.
    pub fn set_port_str(&mut self, port: &str) -> Result<(), InvalidComponentError> {
        self.update(Component::Port, Some(port))
    }

    /// Sets or clears the registry-based authority.
    ///
    /// # Errors
    ///
    /// Returns `InvalidComponentError` if the grammar has no registry rule,
    /// the value does not match it, or a server authority is present.
    pub fn set_registry(&mut self, registry: Option<&str>) -> Result<(), InvalidComponentError> {
        self.update(Component::Registry, registry)
    }

    /// Sets the path.
    ///
    /// # Errors
    ///
    /// Returns `InvalidComponentError` if the path does not match the
    /// grammar, is relative while a scheme or authority is present, or
    /// conflicts with an opaque part.
    pub fn set_path(&mut self, path: &str) -> Result<(), InvalidComponentError> {
        self.update(Component::Path, Some(path))
    }

    /// Sets or clears the opaque part.
    ///
    /// # Errors
    ///
    /// Returns `InvalidComponentError` if the value does not match the
    /// grammar, no scheme is set, or an authority, path or query is present.
    pub fn set_opaque(&mut self, opaque: Option<&str>) -> Result<(), InvalidComponentError> {
        self.update(Component::Opaque, opaque)
    }

    /// Sets or clears the query.
    ///
    /// # Errors
    ///
    /// Returns `InvalidComponentError` if the query does not match the
    /// grammar or the URI is opaque.
    pub fn set_query(&mut self, query: Option<&str>) -> Result<(), InvalidComponentError> {
        self.update(Component::Query, query)
    }

    /// Sets or clears the fragment.
    ///
    /// # Errors
    ///
    /// Returns `InvalidComponentError` if the fragment does not match the
    /// grammar.
    pub fn set_fragment(&mut self, fragment: Option<&str>) -> Result<(), InvalidComponentError> {
        self.update(Component::Fragment, fragment)
    }

    /// Validates and commits one component change atomically.
    fn update(&mut self, component: Component, value: Option<&str>) -> Result<(), InvalidComponentError> {
        let mut next = self.clone();
        next.assign(component, value)?;
        if let Some((_, reason)) = next.structure_error() {
            return Err(InvalidComponentError::new(
                component,
                value.unwrap_or_default(),
                reason,
            ));
        }
        *self = next;
        Ok(())
    }

    /// Validates `value` against the component's rule and stores it, without
    /// checking it against the other components.
    pub(crate) fn assign(
        &mut self,
        component: Component,
        value: Option<&str>,
    ) -> Result<(), InvalidComponentError> {
        let Some(value) = value else {
            self.clear(component);
            return Ok(());
        };
        let parser = self.parser;
        let invalid = |reason| InvalidComponentError::new(component, value, reason);
        let check = |rule: Rule| {
            if parser.validate(rule, value) {
                Ok(())
            } else {
                Err(invalid(mismatch(rule)))
            }
        };

        match component {
            Component::Scheme => {
                check(Rule::Scheme)?;
                self.scheme = Some(value.to_ascii_lowercase());
            }
            Component::Userinfo => {
                check(Rule::Userinfo)?;
                let (user, password) = split_userinfo(value);
                self.user = Some(user);
                self.password = password;
            }
            Component::User => {
                check(Rule::Userinfo)?;
                if value.contains(':') {
                    return Err(invalid("user cannot contain ':'"));
                }
                self.user = Some(value.to_string());
            }
            Component::Password => {
                check(Rule::Userinfo)?;
                self.password = Some(value.to_string());
            }
            Component::Host => {
                check(Rule::Host)?;
                self.host = Some(value.to_string());
            }
            Component::Port => {
                check(Rule::Port)?;
                self.port = if value.is_empty() {
                    None
                } else {
                    Some(value.parse().map_err(|_| invalid("port must be a number in 0-65535"))?)
                };
            }
            Component::Registry => {
                if !parser.generation().defines(Rule::Registry) {
                    return Err(invalid("registry is not part of this grammar"));
                }
                check(Rule::Registry)?;
                self.registry = Some(value.to_string());
            }
            Component::Path => {
                if !value.is_empty()
                    && !parser.validate(Rule::AbsPath, value)
                    && !parser.validate(Rule::RelPath, value)
                {
                    return Err(invalid("does not match ABS_PATH or REL_PATH"));
                }
                self.path = value.to_string();
            }
            Component::Opaque => {
                check(Rule::Opaque)?;
                self.opaque = Some(value.to_string());
            }
            Component::Query => {
                check(Rule::Query)?;
                self.query = Some(value.to_string());
            }
            Component::Fragment => {
                check(Rule::Fragment)?;
                self.fragment = Some(value.to_string());
            }
        }
        Ok(())
    }

    fn clear(&mut self, component: Component) {
        match component {
            Component::Scheme => self.scheme = None,
            Component::Userinfo | Component::User => {
                self.user = None;
                self.password = None;
            }
            Component::Password => self.password = None,
            Component::Host => self.host = None,
            Component::Port => self.port = None,
            Component::Registry => self.registry = None,
            Component::Path => self.path.clear(),
            Component::Opaque => self.opaque = None,
            Component::Query => self.query = None,
            Component::Fragment => self.fragment = None,
        }
    }

    fn has_authority(&self) -> bool {
        self.user.is_some() || self.host.is_some() || self.port.is_some() || self.registry.is_some()
    }

    /// Returns the first violated cross-component invariant.
    pub(crate) fn structure_error(&self) -> Option<(Component, &'static str)> {
        let authority = self.has_authority();
        if self.opaque.is_some() {
            if self.scheme.is_none() {
                return Some((Component::Opaque, "opaque part requires a scheme"));
            }
            if authority {
                return Some((Component::Opaque, "opaque part conflicts with authority"));
            }
            if !self.path.is_empty() {
                return Some((Component::Opaque, "opaque part conflicts with path"));
            }
            if self.query.is_some() {
                return Some((Component::Query, "query conflicts with opaque part"));
            }
        }
        if self.registry.is_some()
            && (self.user.is_some() || self.host.is_some() || self.port.is_some())
        {
            return Some((Component::Registry, "registry conflicts with server authority"));
        }
        if self.password.is_some() && self.user.is_none() {
            return Some((Component::Password, "password requires a user"));
        }
        if self.host.is_none() && (self.user.is_some() || self.port.is_some()) {
            return Some((Component::Host, "userinfo and port require a host"));
        }
        if !authority && self.path.starts_with("//") {
            return Some((Component::Path, "path cannot begin with '//' without an authority"));
        }
        if (self.scheme.is_some() || authority) && !self.path.is_empty() && !self.path.starts_with('/') {
            return Some((Component::Path, "path must be absolute with a scheme or authority"));
        }
        if self.scheme.is_none()
            && !authority
            && self.path.split('/').next().is_some_and(|first| first.contains(':'))
        {
            return Some((Component::Path, "first segment of a relative path cannot contain ':'"));
        }
        if self.generation() == Generation::Rfc2396
            && self.scheme.is_some()
            && self.opaque.is_none()
            && !authority
            && self.path.is_empty()
        {
            return Some((Component::Path, "absolute URI without path"));
        }
        None
    }

    /// Returns the stored value of a component, for error reports.
    pub(crate) fn component_value(&self, component: Component) -> String {
        match component {
            Component::Scheme => self.scheme.clone(),
            Component::Userinfo => self.userinfo(),
            Component::User => self.user.clone(),
            Component::Password => self.password.clone(),
            Component::Host => self.host.clone(),
            Component::Port => self.port.map(|p| p.to_string()),
            Component::Registry => self.registry.clone(),
            Component::Path => Some(self.path.clone()),
            Component::Opaque => self.opaque.clone(),
            Component::Query => self.query.clone(),
            Component::Fragment => self.fragment.clone(),
        }
        .unwrap_or_default()
    }

    /// Returns the nine-slot component tuple.
    #[must_use]
    pub fn components(&self) -> Components {
        Components {
            scheme: self.scheme.clone(),
            userinfo: self.userinfo(),
            host: self.host.clone(),
            port: self.port.map(|p| p.to_string()),
            registry: self.registry.clone(),
            path: self.opaque.is_none().then(|| self.path.clone()),
            opaque: self.opaque.clone(),
            query: self.query.clone(),
            fragment: self.fragment.clone(),
        }
    }

    /// Returns true if two URIs have equal components and the same parser
    /// instance.
    #[must_use]
    pub fn strict_eq(&self, other: &Self) -> bool {
        self == other && std::ptr::eq(self.parser, other.parser)
    }

    /// Returns true if the URI has a scheme.
    #[must_use]
    pub const fn is_absolute(&self) -> bool {
        self.scheme.is_some()
    }

    /// Returns true if the URI has no scheme.
    #[must_use]
    pub const fn is_relative(&self) -> bool {
        self.scheme.is_none()
    }

    /// Returns true if the URI is not opaque.
    #[must_use]
    pub const fn is_hierarchical(&self) -> bool {
        self.opaque.is_none()
    }

    /// Returns the well-known port of the scheme.
    #[must_use]
    pub fn default_port(&self) -> Option<u16> {
        self.scheme.as_deref().and_then(scheme::default_port)
    }

    /// Returns the explicit port, falling back to the scheme's default.
    #[must_use]
    pub fn effective_port(&self) -> Option<u16> {
        self.port.or_else(|| self.default_port())
    }

    #[allow(clippy::type_complexity)]
    fn fields(
        &self,
    ) -> (
        Option<&str>,
        Option<&str>,
        Option<&str>,
        Option<&str>,
        Option<u16>,
        Option<&str>,
        &str,
        Option<&str>,
        Option<&str>,
        Option<&str>,
    ) {
        (
            self.scheme.as_deref(),
            self.user.as_deref(),
            self.password.as_deref(),
            self.host.as_deref(),
            self.port,
            self.registry.as_deref(),
            &self.path,
            self.opaque.as_deref(),
            self.query.as_deref(),
            self.fragment.as_deref(),
        )
    }
}

fn split_userinfo(userinfo: &str) -> (String, Option<String>) {
    match userinfo.split_once(':') {
        Some((user, password)) => (user.to_string(), Some(password.to_string())),
        None => (userinfo.to_string(), None),
    }
}

const fn mismatch(rule: Rule) -> &'static str {
    match rule {
        Rule::Scheme => "does not match SCHEME",
        Rule::Userinfo => "does not match USERINFO",
        Rule::Host => "does not match HOST",
        Rule::Port => "port must be decimal digits",
        Rule::Registry => "does not match REGISTRY",
        Rule::Opaque => "does not match OPAQUE",
        Rule::Query => "does not match QUERY",
        Rule::Fragment => "does not match FRAGMENT",
        _ => "does not match the grammar",
    }
}

impl PartialEq for Uri<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.fields() == other.fields()
    }
}

impl Eq for Uri<'_> {}

impl Hash for Uri<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fields().hash(state);
    }
}

impl fmt::Display for Uri<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.components(), f)
    }
}

impl fmt::Debug for Uri<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Uri")
            .field(&format_args!("{}", self.generation().parser_label()))
            .field(&self.to_string())
            .finish()
    }
}

impl FromStr for Uri<'static> {
    type Err = InvalidUriError;

    /// Parses with the process-wide default parser.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        default_parser().parse(s)
    }
}

impl TryFrom<&str> for Uri<'static> {
    type Error = InvalidUriError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Uri<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Uri<'static> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
