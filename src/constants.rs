//! Constants shared by the grammar engine.

/// Compiled-program size limit for every grammar matcher, in bytes.
///
/// The composed grammars are large; the `regex` default of 10 MiB is too
/// small once `ESCAPED` overrides are expanded into every dependent rule.
pub const REGEX_SIZE_LIMIT: usize = 64 * (1 << 20);

/// Lazy DFA cache capacity per matcher, in bytes.
pub const DFA_SIZE_LIMIT: usize = 8 * (1 << 20);

/// ASCII whitespace tolerated around a legacy URI reference.
pub(crate) const LEGACY_WHITESPACE: &str = r"[\t\n\x0B\x0C\r ]";
