//! The nine-slot result of splitting a URI reference.

use std::fmt;

/// A named URI component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    /// The scheme
    Scheme,
    /// The userinfo, `user[:password]`
    Userinfo,
    /// The user part of the userinfo
    User,
    /// The password part of the userinfo
    Password,
    /// The host
    Host,
    /// The port
    Port,
    /// The registry-based authority (legacy)
    Registry,
    /// The path
    Path,
    /// The opaque part
    Opaque,
    /// The query
    Query,
    /// The fragment
    Fragment,
}

impl Component {
    /// Returns the lower-case component name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Scheme => "scheme",
            Self::Userinfo => "userinfo",
            Self::User => "user",
            Self::Password => "password",
            Self::Host => "host",
            Self::Port => "port",
            Self::Registry => "registry",
            Self::Path => "path",
            Self::Opaque => "opaque",
            Self::Query => "query",
            Self::Fragment => "fragment",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The components of a URI reference, in the fixed order `scheme, userinfo,
/// host, port, registry, path, opaque, query, fragment`.
///
/// `None` means the component is absent; `Some("")` means it is present and
/// empty (for example the empty path of `http://example.com`).
///
/// # Examples
///
/// ```
/// use uri_grammar::rfc3986_parser;
///
/// let parts = rfc3986_parser().split("http://example.com").unwrap();
/// assert_eq!(
///     parts.into_array(),
///     [
///         Some("http".to_string()),
///         None,
///         Some("example.com".to_string()),
///         None,
///         None,
///         Some(String::new()),
///         None,
///         None,
///         None,
///     ]
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Components {
    /// The scheme, as written
    pub scheme: Option<String>,
    /// The userinfo, without the trailing `@`
    pub userinfo: Option<String>,
    /// The host; IP literals keep their brackets
    pub host: Option<String>,
    /// The port digits, without the leading `:`
    pub port: Option<String>,
    /// The registry-based authority (legacy)
    pub registry: Option<String>,
    /// The path; absent only for opaque URIs
    pub path: Option<String>,
    /// The opaque part
    pub opaque: Option<String>,
    /// The query, without the leading `?`
    pub query: Option<String>,
    /// The fragment, without the leading `#`
    pub fragment: Option<String>,
}

impl Components {
    /// Returns true if any authority slot is present.
    #[must_use]
    pub const fn has_authority(&self) -> bool {
        self.userinfo.is_some() || self.host.is_some() || self.port.is_some() || self.registry.is_some()
    }

    /// Returns the slots as a fixed-order array.
    #[must_use]
    pub fn into_array(self) -> [Option<String>; 9] {
        [
            self.scheme,
            self.userinfo,
            self.host,
            self.port,
            self.registry,
            self.path,
            self.opaque,
            self.query,
            self.fragment,
        ]
    }
}

impl From<Components> for [Option<String>; 9] {
    fn from(components: Components) -> Self {
        components.into_array()
    }
}

impl From<[Option<String>; 9]> for Components {
    fn from(slots: [Option<String>; 9]) -> Self {
        let [scheme, userinfo, host, port, registry, path, opaque, query, fragment] = slots;
        Self {
            scheme,
            userinfo,
            host,
            port,
            registry,
            path,
            opaque,
            query,
            fragment,
        }
    }
}

impl fmt::Display for Components {
    /// Recomposes the reference string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scheme) = &self.scheme {
            write!(f, "{scheme}:")?;
        }
        if let Some(opaque) = &self.opaque {
            f.write_str(opaque)?;
        } else {
            if self.has_authority() {
                f.write_str("//")?;
            }
            if let Some(registry) = &self.registry {
                f.write_str(registry)?;
            } else {
                if let Some(userinfo) = &self.userinfo {
                    write!(f, "{userinfo}@")?;
                }
                if let Some(host) = &self.host {
                    f.write_str(host)?;
                }
                if let Some(port) = &self.port {
                    write!(f, ":{port}")?;
                }
            }
            if let Some(path) = &self.path {
                f.write_str(path)?;
            }
        }
        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn display_full_reference() {
        let parts = Components {
            scheme: s("http"),
            userinfo: s("al%40ice:pw"),
            host: s("[::1]"),
            port: s("8080"),
            path: s("/a/b"),
            query: s("q=1"),
            fragment: s("top"),
            ..Components::default()
        };
        assert_eq!(parts.to_string(), "http://al%40ice:pw@[::1]:8080/a/b?q=1#top");
    }

    #[test]
    fn display_network_path_and_opaque() {
        let net = Components {
            host: s("example.com"),
            path: s(""),
            ..Components::default()
        };
        assert_eq!(net.to_string(), "//example.com");

        let opaque = Components {
            scheme: s("mailto"),
            opaque: s("a@example.com"),
            ..Components::default()
        };
        assert_eq!(opaque.to_string(), "mailto:a@example.com");
    }

    #[test]
    fn empty_host_keeps_authority_marker() {
        let parts = Components {
            scheme: s("file"),
            host: s(""),
            path: s("/etc/hosts"),
            ..Components::default()
        };
        assert_eq!(parts.to_string(), "file:///etc/hosts");
    }

    #[test]
    fn array_conversion_keeps_order() {
        let parts = Components {
            scheme: s("a"),
            fragment: s("f"),
            ..Components::default()
        };
        let array: [Option<String>; 9] = parts.clone().into();
        assert_eq!(array[0], s("a"));
        assert_eq!(array[8], s("f"));
        assert_eq!(Components::from(array), parts);
    }

    #[test]
    fn component_names() {
        assert_eq!(Component::Port.to_string(), "port");
        assert_eq!(Component::Userinfo.name(), "userinfo");
    }
}
