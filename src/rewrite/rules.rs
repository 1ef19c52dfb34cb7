//! Ordered text rewrite rules.
//!
//! A [`RuleSet`] is a list of `(pattern, replacement)` pairs applied in order
//! over decoded UTF-8 text. It knows nothing about HTTP; the normalizers decide
//! when a body is eligible and what to do with the result.

use std::borrow::Cow;

use regex::{NoExpand, Regex, RegexBuilder};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("invalid rewrite pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The body is not UTF-8 text, so no substitution is attempted.
    #[error("body is not valid UTF-8: {0}")]
    NotUtf8(#[from] std::str::Utf8Error),
}

/// One substitution: every match of `pattern` becomes `replacement` verbatim.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    pattern: Regex,
    replacement: String,
}

impl RewriteRule {
    /// Rule from a regular expression. `$` in the replacement is not expanded.
    pub fn regex(pattern: &str, replacement: impl Into<String>) -> Result<Self, RewriteError> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            replacement: replacement.into(),
        })
    }

    /// Rule matching `needle` literally.
    pub fn literal(
        needle: &str,
        replacement: impl Into<String>,
        case_insensitive: bool,
    ) -> Result<Self, RewriteError> {
        let pattern = RegexBuilder::new(&regex::escape(needle))
            .case_insensitive(case_insensitive)
            .build()?;
        Ok(Self {
            pattern,
            replacement: replacement.into(),
        })
    }

    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.pattern.replace_all(text, NoExpand(&self.replacement))
    }
}

/// Rules applied in insertion order, each to the output of the previous one.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<RewriteRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<RewriteRule>) -> Self {
        Self { rules }
    }

    pub fn push(&mut self, rule: RewriteRule) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply every rule. Borrowed output means nothing matched.
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        let mut out = Cow::Borrowed(text);
        for rule in &self.rules {
            let replaced = match rule.apply(&out) {
                Cow::Owned(s) => Some(s),
                Cow::Borrowed(_) => None,
            };
            if let Some(s) = replaced {
                out = Cow::Owned(s);
            }
        }
        out
    }

    /// Decode `bytes` as UTF-8 and apply the rules.
    ///
    /// Returns `Ok(None)` when no rule changed anything.
    pub fn rewrite_bytes(&self, bytes: &[u8]) -> Result<Option<String>, RewriteError> {
        let text = std::str::from_utf8(bytes)?;
        Ok(match self.apply(text) {
            Cow::Owned(s) => Some(s),
            Cow::Borrowed(_) => None,
        })
    }
}
