//! The gateway credential and its redaction from observable text.
//!
//! The credential is held only in memory. Neither [`Credential`] nor
//! [`Redactor`] can print it: both `Debug` implementations emit
//! [`REDACTION_MARKER`] instead.

use std::borrow::Cow;
use std::fmt;

use regex::{NoExpand, Regex};

/// Replacement text for every occurrence of the credential.
pub const REDACTION_MARKER: &str = "[REDACTED]";

/// Opaque bearer code sent inside every request envelope.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a raw credential.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the raw credential. Only the envelope builder should call this.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({REDACTION_MARKER})")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTION_MARKER)
    }
}

// ---------------------------------------------------------------------------

#[derive(Clone)]
enum Strategy {
    /// Empty credential: nothing to redact.
    Disabled,
    /// Escaped literal pattern.
    Pattern(Regex),
    /// Plain substring replacement, used only if the escaped pattern exceeds
    /// the regex size limit.
    Literal(String),
}

/// Replaces every literal occurrence of one credential with
/// [`REDACTION_MARKER`].
///
/// The pattern is compiled once, from the escaped credential, so credentials
/// containing metacharacters (`.`, `*`, `+`, `(`, ...) match literally.
#[derive(Clone)]
pub struct Redactor {
    strategy: Strategy,
}

impl Redactor {
    /// Builds a redactor for `credential`.
    pub fn new(credential: &Credential) -> Self {
        Self::for_secret(credential.expose())
    }

    /// Builds a redactor for a raw secret. An empty secret redacts nothing.
    pub fn for_secret(secret: &str) -> Self {
        let strategy = if secret.is_empty() {
            Strategy::Disabled
        } else {
            match Regex::new(&regex::escape(secret)) {
                Ok(pattern) => Strategy::Pattern(pattern),
                Err(_) => Strategy::Literal(secret.to_string()),
            }
        };
        Self { strategy }
    }

    /// Returns `text` with every occurrence of the secret replaced.
    ///
    /// Borrows `text` unchanged when there is nothing to replace.
    pub fn redact<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match &self.strategy {
            Strategy::Disabled => Cow::Borrowed(text),
            Strategy::Pattern(pattern) => pattern.replace_all(text, NoExpand(REDACTION_MARKER)),
            Strategy::Literal(secret) if text.contains(secret.as_str()) => {
                Cow::Owned(text.replace(secret.as_str(), REDACTION_MARKER))
            }
            Strategy::Literal(_) => Cow::Borrowed(text),
        }
    }

    /// Convenience for `redact(text).into_owned()`.
    pub fn redact_owned(&self, text: &str) -> String {
        self.redact(text).into_owned()
    }
}

impl fmt::Debug for Redactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let enabled = !matches!(self.strategy, Strategy::Disabled);
        f.debug_struct("Redactor").field("enabled", &enabled).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_occurrence_is_replaced() {
        let r = Redactor::for_secret("s3cret");
        assert_eq!(
            r.redact("code=s3cret; again s3cret"),
            "code=[REDACTED]; again [REDACTED]"
        );
    }

    #[test]
    fn metacharacters_match_literally() {
        let secret = "a.b*c+(d)?[e]$^|\\";
        let r = Redactor::for_secret(secret);
        let text = format!("invalid code {secret} supplied");
        assert_eq!(r.redact(&text), "invalid code [REDACTED] supplied");
        // `.` must not act as a wildcard.
        assert_eq!(r.redact("aXb*c+(d)?[e]$^|\\"), "aXb*c+(d)?[e]$^|\\");
    }

    #[test]
    fn empty_secret_is_a_no_op() {
        let r = Redactor::for_secret("");
        assert!(matches!(r.redact("anything at all"), Cow::Borrowed("anything at all")));
        assert_eq!(r.redact(""), "");
    }

    #[test]
    fn text_without_the_secret_is_borrowed() {
        let r = Redactor::for_secret("abc");
        assert!(matches!(r.redact("nothing here"), Cow::Borrowed(_)));
    }

    #[test]
    fn literal_fallback_replaces_substrings() {
        let r = Redactor {
            strategy: Strategy::Literal("x.y".to_string()),
        };
        assert_eq!(r.redact("x.y and xzy"), "[REDACTED] and xzy");
    }

    #[test]
    fn debug_output_never_contains_the_secret() {
        let credential = Credential::new("top-secret-code");
        assert!(!format!("{credential:?}").contains("top-secret-code"));
        assert!(!format!("{credential}").contains("top-secret-code"));
        assert!(!format!("{:?}", Redactor::new(&credential)).contains("top-secret-code"));
    }
}
