//! Builder for assembling a [`Uri`] component by component.

use crate::components::Component;
use crate::error::InvalidComponentError;
use crate::parser::Parser;
use crate::uri::Uri;

/// A builder for [`Uri`] values.
///
/// Components may be given in any order; each is validated against the
/// parser's grammar, and the combination is checked once, in
/// [`build`](Self::build).
///
/// # Examples
///
/// ```
/// use uri_grammar::{rfc3986_parser, UriBuilder};
///
/// let uri = UriBuilder::new(rfc3986_parser())
///     .path("/search")
///     .host("example.com")
///     .scheme("https")
///     .query("q=rust")
///     .build()
///     .unwrap();
///
/// assert_eq!(uri.to_string(), "https://example.com/search?q=rust");
/// ```
///
/// Conflicting components are rejected:
///
/// ```
/// use uri_grammar::{rfc3986_parser, Component, UriBuilder};
///
/// let err = UriBuilder::new(rfc3986_parser())
///     .scheme("mailto")
///     .opaque("a@example.com")
///     .host("example.com")
///     .build()
///     .unwrap_err();
/// assert_eq!(err.component, Component::Opaque);
/// ```
#[derive(Debug, Clone)]
pub struct UriBuilder<'p> {
    parser: &'p Parser,
    parts: Vec<(Component, String)>,
}

impl<'p> UriBuilder<'p> {
    /// Creates an empty builder bound to `parser`.
    #[must_use]
    pub const fn new(parser: &'p Parser) -> Self {
        Self {
            parser,
            parts: Vec::new(),
        }
    }

    fn with(mut self, component: Component, value: impl Into<String>) -> Self {
        self.parts.retain(|(c, _)| *c != component);
        self.parts.push((component, value.into()));
        self
    }

    /// Sets the scheme.
    #[must_use]
    pub fn scheme(self, scheme: impl Into<String>) -> Self {
        self.with(Component::Scheme, scheme)
    }

    /// Sets `user[:password]`.
    #[must_use]
    pub fn userinfo(self, userinfo: impl Into<String>) -> Self {
        self.with(Component::Userinfo, userinfo)
    }

    /// Sets the user.
    #[must_use]
    pub fn user(self, user: impl Into<String>) -> Self {
        self.with(Component::User, user)
    }

    /// Sets the password.
    #[must_use]
    pub fn password(self, password: impl Into<String>) -> Self {
        self.with(Component::Password, password)
    }

    /// Sets the host.
    #[must_use]
    pub fn host(self, host: impl Into<String>) -> Self {
        self.with(Component::Host, host)
    }

    /// Sets the port.
    #[must_use]
    pub fn port(self, port: u16) -> Self {
        self.with(Component::Port, port.to_string())
    }

    /// Sets the registry-based authority.
    #[must_use]
    pub fn registry(self, registry: impl Into<String>) -> Self {
        self.with(Component::Registry, registry)
    }

    /// Sets the path.
    #[must_use]
    pub fn path(self, path: impl Into<String>) -> Self {
        self.with(Component::Path, path)
    }

    /// Sets the opaque part.
    #[must_use]
    pub fn opaque(self, opaque: impl Into<String>) -> Self {
        self.with(Component::Opaque, opaque)
    }

    /// Sets the query.
    #[must_use]
    pub fn query(self, query: impl Into<String>) -> Self {
        self.with(Component::Query, query)
    }

    /// Sets the fragment.
    #[must_use]
    pub fn fragment(self, fragment: impl Into<String>) -> Self {
        self.with(Component::Fragment, fragment)
    }

    /// Builds the [`Uri`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidComponentError` if a component does not match the
    /// parser's grammar or the components conflict with each other.
    pub fn build(self) -> Result<Uri<'p>, InvalidComponentError> {
        let mut uri = Uri::empty(self.parser);
        // userinfo first so that explicit user and password refine it
        let mut parts = self.parts;
        parts.sort_by_key(|(c, _)| *c != Component::Userinfo);
        for (component, value) in &parts {
            uri.assign(*component, Some(value.as_str()))?;
        }
        match uri.structure_error() {
            Some((component, reason)) => Err(InvalidComponentError::new(
                component,
                uri.component_value(component),
                reason,
            )),
            None => Ok(uri),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{rfc2396_parser, rfc3986_parser};

    #[test]
    fn build_full_uri() {
        let uri = UriBuilder::new(rfc3986_parser())
            .scheme("HTTP")
            .user("al%40ice")
            .password("pw")
            .host("[::1]")
            .port(8080)
            .path("/a")
            .query("b=c")
            .fragment("d")
            .build()
            .unwrap();
        assert_eq!(uri.to_string(), "http://al%40ice:pw@[::1]:8080/a?b=c#d");
    }

    #[test]
    fn later_value_wins() {
        let uri = UriBuilder::new(rfc3986_parser())
            .path("/a")
            .path("/b")
            .build()
            .unwrap();
        assert_eq!(uri.path(), "/b");
    }

    #[test]
    fn user_refines_userinfo() {
        let uri = UriBuilder::new(rfc3986_parser())
            .user("carol")
            .userinfo("bob:pw")
            .host("h")
            .build()
            .unwrap();
        assert_eq!(uri.user(), Some("carol"));
        assert_eq!(uri.password(), Some("pw"));
    }

    #[test]
    fn invalid_component_is_reported() {
        let err = UriBuilder::new(rfc3986_parser())
            .host("exa mple.com")
            .build()
            .unwrap_err();
        assert_eq!(err.component, Component::Host);
        assert_eq!(err.value, "exa mple.com");
    }

    #[test]
    fn password_without_user_is_rejected() {
        let err = UriBuilder::new(rfc3986_parser())
            .host("h")
            .password("pw")
            .build()
            .unwrap_err();
        assert_eq!(err.component, Component::Password);
        assert_eq!(err.reason, "password requires a user");
    }

    #[test]
    fn legacy_registry() {
        let uri = UriBuilder::new(rfc2396_parser())
            .scheme("foo")
            .registry("reg_name")
            .path("/x")
            .build()
            .unwrap();
        assert_eq!(uri.to_string(), "foo://reg_name/x");
        assert!(
            UriBuilder::new(rfc3986_parser())
                .registry("reg_name")
                .build()
                .is_err()
        );
    }
}
