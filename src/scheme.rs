//! Scheme defaults known to the component model.

const DEFAULT_PORTS: &[(&str, u16)] = &[
    ("ftp", 21),
    ("gopher", 70),
    ("http", 80),
    ("https", 443),
    ("ldap", 389),
    ("ldaps", 636),
    ("nntp", 119),
    ("telnet", 23),
    ("ws", 80),
    ("wss", 443),
];

/// Returns the well-known port of a scheme, compared case-insensitively.
///
/// ```
/// use uri_grammar::scheme::default_port;
///
/// assert_eq!(default_port("HTTPS"), Some(443));
/// assert_eq!(default_port("mailto"), None);
/// ```
#[must_use]
pub fn default_port(scheme: &str) -> Option<u16> {
    DEFAULT_PORTS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(scheme))
        .map(|(_, port)| *port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_schemes() {
        assert_eq!(default_port("http"), Some(80));
        assert_eq!(default_port("ftp"), Some(21));
        assert_eq!(default_port("ldaps"), Some(636));
        assert_eq!(default_port("Ws"), Some(80));
    }

    #[test]
    fn unknown_scheme() {
        assert_eq!(default_port(""), None);
        assert_eq!(default_port("urn"), None);
    }
}
