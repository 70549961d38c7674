use std::error::Error as StdError;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Any failure that cannot be confidently attributed to any other error
    /// category in this enum.
    ///
    /// Use of Internal is never a guarantee the error is not, for example,
    /// due to a user error - merely that it cannot be confidently determined
    /// by the code.
    Internal,

    /// The user provided invalid input (a damaged container, a wrong
    /// password) or asked for something impossible to complete.
    User,
}

/// Fine-grained condition flags for consumers that want to branch on error kinds.
///
/// Every error produced by the codec and key derivation carries one of the
/// first four kinds. The remaining kinds are only produced by the file and
/// passphrase layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Key derivation could not run (invalid parameters or provider failure).
    KeyDerivation,
    /// The container could not be parsed, a required field is missing or has
    /// the wrong shape, or the file name lacks the `.enc` suffix.
    MalformedContainer,
    /// The AEAD tag did not verify. Wrong password and corrupted or
    /// tampered-with data are deliberately indistinguishable.
    AuthenticationFailed,
    /// The cipher or the random source failed while encrypting.
    Encryption,
    /// Passphrase could not be obtained from the configured reader.
    PassphraseUnavailable,
    /// Two passphrase entries that were required to match did not.
    PassphraseMismatch,
    /// Passphrase is shorter than the caller's minimum length policy.
    PassphraseTooShort,
    /// Interaction with the filesystem, stdin/stdout, or other I/O failed.
    Io,
}

#[derive(Debug, Error)]
#[error("{msg}")]
pub struct PasscryptError {
    /// Broad error category, always provided.
    pub category: ErrorCategory,
    /// Optional specific condition tag for consumers that need to
    /// branch their behavior. Any code consuming errors MUST handle
    /// the absence of a defined kind.
    pub kind: Option<ErrorKind>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    msg: String,
}

impl PasscryptError {
    /// Creates a new error with a required category and display message.
    pub fn new(category: ErrorCategory, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: None,
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that also tags the failure with a kind.
    pub fn with_kind(category: ErrorCategory, kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that carries both a kind tag and the originating source error.
    pub fn with_kind_and_source(
        category: ErrorCategory,
        kind: ErrorKind,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    /// Shorthand for a user-caused malformed container error.
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorCategory::User, ErrorKind::MalformedContainer, msg)
    }

    /// The user-facing message carried by the error.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Returns true if the error is tagged with `kind`.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == Some(kind)
    }

    /// Returns the preserved source error if present.
    pub fn source_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// Wraps the current error with a higher-level message while preserving the original as source.
    pub fn with_context(self, msg: impl Into<String>) -> Self {
        let category = self.category;
        let kind = self.kind;
        Self {
            category,
            kind,
            source: Some(Box::new(self)),
            msg: msg.into(),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, PasscryptError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_context_preserves_category_and_kind() {
        let err = PasscryptError::with_kind(
            ErrorCategory::User,
            ErrorKind::AuthenticationFailed,
            "incorrect password or corrupted file",
        )
        .with_context("failed to decrypt");

        assert_eq!(err.category, ErrorCategory::User);
        assert!(err.is(ErrorKind::AuthenticationFailed));
        assert_eq!(err.message(), "failed to decrypt");
        assert_eq!(
            err.source_error().map(|s| s.to_string()),
            Some("incorrect password or corrupted file".to_string())
        );
    }

    #[test]
    fn test_source_is_kept() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let err = PasscryptError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Io,
            "failed to read from x",
            io_err,
        );

        assert_eq!(err.to_string(), "failed to read from x");
        assert_eq!(err.source_error().unwrap().to_string(), "gone");
    }

    #[test]
    fn test_untagged_error() {
        let err = PasscryptError::new(ErrorCategory::Internal, "something odd");
        assert_eq!(err.kind, None);
        assert!(!err.is(ErrorKind::Io));
    }
}
