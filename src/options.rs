//! Parsing options for symbol resolution
//!
//! Resolution is strict by default: any table that points outside the file, or any name that
//! points outside its string table, fails the whole lookup. Permissive mode logs those defects
//! and keeps scanning with what can still be read.

/// Binary parsing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Standard parsing mode - fails on malformed data
    #[default]
    Strict,
    /// Permissive parsing mode - attempts to recover from malformed data
    Permissive,
}

impl ParseMode {
    /// Check if this is permissive mode
    pub(crate) fn is_permissive(&self) -> bool {
        matches!(self, ParseMode::Permissive)
    }
}

/// Common parsing options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOptions {
    /// The parsing mode to use
    pub parse_mode: ParseMode,
}

impl ParseOptions {
    /// Create new ParseOptions with default settings
    pub fn new() -> Self {
        Default::default()
    }

    /// Create ParseOptions with permissive mode enabled
    pub fn permissive() -> Self {
        ParseOptions {
            parse_mode: ParseMode::Permissive,
        }
    }

    /// Create ParseOptions with strict mode enabled
    pub fn strict() -> Self {
        ParseOptions {
            parse_mode: ParseMode::Strict,
        }
    }

    /// Set the parse mode
    pub fn with_parse_mode(mut self, parse_mode: ParseMode) -> Self {
        self.parse_mode = parse_mode;
        self
    }

    /// Check if permissive mode is enabled
    pub fn is_permissive(&self) -> bool {
        self.parse_mode.is_permissive()
    }
}

/// Helper trait to ease permissive parsing fallbacks.
///
/// When `permissive` is true, errors are downgraded to warnings and a default or provided value
/// is used instead; otherwise the original error is propagated.
pub(crate) trait Permissive<T, E> {
    fn or_permissive_and_default(self, permissive: bool, context: &str) -> Result<T, E>;

    fn or_permissive_and_value(self, permissive: bool, context: &str, value: T) -> Result<T, E>;
}

impl<T: Default, E: core::fmt::Display> Permissive<T, E> for Result<T, E> {
    fn or_permissive_and_default(self, permissive: bool, context: &str) -> Result<T, E> {
        self.or_else(|e| {
            if permissive {
                log::warn!("{context}: {e}, continuing with empty/default value");
                Ok(T::default())
            } else {
                Err(e)
            }
        })
    }

    fn or_permissive_and_value(self, permissive: bool, context: &str, value: T) -> Result<T, E> {
        self.or_else(|e| {
            if permissive {
                log::warn!("{context}: {e}, continuing with provided value");
                Ok(value)
            } else {
                Err(e)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn default_is_strict() {
        let opts = ParseOptions::new();
        assert_eq!(opts.parse_mode, ParseMode::Strict);
        assert!(!opts.is_permissive());
        assert!(ParseOptions::permissive().is_permissive());
        assert_eq!(
            ParseOptions::permissive().with_parse_mode(ParseMode::Strict),
            ParseOptions::strict()
        );
    }

    #[test]
    fn permissive_fallbacks() {
        let bad: Result<u64, Error> = Err(Error::Malformed("entsize is 0".into()));
        assert!(matches!(
            bad.or_permissive_and_default(false, "symtab"),
            Err(Error::Malformed(_))
        ));
        let bad: Result<u64, Error> = Err(Error::Malformed("entsize is 0".into()));
        assert_eq!(bad.or_permissive_and_default(true, "symtab").unwrap(), 0);
        let bad: Result<u64, Error> = Err(Error::Malformed("entsize is 0".into()));
        assert_eq!(bad.or_permissive_and_value(true, "symtab", 24).unwrap(), 24);
        let good: Result<u64, Error> = Ok(32);
        assert_eq!(good.or_permissive_and_value(true, "symtab", 24).unwrap(), 32);
    }
}
