//! Configuration for building a [`Parser`](crate::Parser).

use crate::error::ConfigError;
use crate::pattern::{Generation, PatternSet, Rule};

/// Configuration for a parser instance.
///
/// Selects the grammar generation and lists rule overrides. Overrides apply
/// only to parsers built from this configuration.
///
/// # Examples
///
/// ```
/// use uri_grammar::{Parser, ParserConfig, Rule};
///
/// let config = ParserConfig::rfc2396()
///     .with_override(Rule::Escaped, "%[0-9A-Fa-f]{2}|%u[0-9A-Fa-f]{4}");
/// let parser = Parser::new(config).unwrap();
/// assert!(parser.parse("http://a/b/%uABCD").is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Grammar generation.
    ///
    /// Default: RFC 3986
    pub generation: Generation,

    /// Rule overrides, by rule name, in the order given.
    ///
    /// Names are checked against the generation when the parser is built.
    /// Default: none
    pub overrides: Vec<(String, String)>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::new(Generation::Rfc3986)
    }
}

impl ParserConfig {
    /// Creates a configuration for a generation with no overrides.
    #[must_use]
    pub const fn new(generation: Generation) -> Self {
        Self {
            generation,
            overrides: Vec::new(),
        }
    }

    /// Creates an RFC 2396 configuration.
    #[must_use]
    pub const fn rfc2396() -> Self {
        Self::new(Generation::Rfc2396)
    }

    /// Creates an RFC 3986 configuration.
    #[must_use]
    pub const fn rfc3986() -> Self {
        Self::new(Generation::Rfc3986)
    }

    /// Overrides a rule with regular-expression source.
    #[must_use]
    pub fn with_override(self, rule: Rule, source: impl Into<String>) -> Self {
        self.with_named_override(rule.name(), source)
    }

    /// Overrides a rule given by name, e.g. `"ESCAPED"`.
    #[must_use]
    pub fn with_named_override(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.overrides.push((name.into(), source.into()));
        self
    }

    /// Resolves the rule table this configuration describes.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override names an unknown rule or does not
    /// compile.
    pub fn resolve(self) -> Result<PatternSet, ConfigError> {
        let generation = self.generation;
        let overrides = self
            .overrides
            .into_iter()
            .map(|(name, source)| {
                let rule = name
                    .parse::<Rule>()
                    .map_err(|_| ConfigError::UnknownRule { name, generation: Some(generation) })?;
                Ok((rule, source))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        PatternSet::resolve(generation, &overrides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ParserConfig::default();
        assert_eq!(config.generation, Generation::Rfc3986);
        assert!(config.overrides.is_empty());
    }

    #[test]
    fn builder_pattern() {
        let config = ParserConfig::rfc2396()
            .with_override(Rule::Port, "[0-9]{1,5}")
            .with_named_override("escaped", "%[0-9A-F]{2}");

        assert_eq!(config.generation, Generation::Rfc2396);
        assert_eq!(config.overrides.len(), 2);
        let set = config.resolve().unwrap();
        assert!(set.is_overridden(Rule::Port));
        assert!(set.is_overridden(Rule::Escaped));
    }

    #[test]
    fn unknown_name_reports_generation() {
        let err = ParserConfig::rfc3986()
            .with_named_override("NOPE", ".")
            .resolve()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownRule {
                name: "NOPE".to_string(),
                generation: Some(Generation::Rfc3986),
            }
        );
    }
}
