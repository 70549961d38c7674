//! Passphrase reading for the command-line front end

use crate::error::{ErrorCategory, ErrorKind, PasscryptError, Result};
use std::io::{self, IsTerminal, Read, Write};
use zeroize::Zeroizing;

/// Minimum password length, in characters, enforced when encrypting from the CLI
pub const MIN_PASSPHRASE_CHARS: usize = 8;

/// Trait for reading passphrases from various sources
pub trait PassphraseReader {
    /// Read a passphrase as arbitrary bytes (not necessarily UTF-8)
    ///
    /// Returns the passphrase wrapped in `Zeroizing` to ensure it is securely
    /// wiped from memory when dropped.
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>>;
}

/// Returns a fixed passphrase (for testing)
pub struct ConstantPassphraseReader {
    passphrase: Zeroizing<Vec<u8>>,
}

impl ConstantPassphraseReader {
    pub fn new(passphrase: Vec<u8>) -> Self {
        Self {
            passphrase: Zeroizing::new(passphrase),
        }
    }
}

impl PassphraseReader for ConstantPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        Ok(self.passphrase.clone())
    }
}

/// Reads passphrase from any io::Read source, verbatim
pub struct ReaderPassphraseReader {
    reader: Box<dyn Read>,
}

impl ReaderPassphraseReader {
    pub fn new(reader: Box<dyn Read>) -> Self {
        Self { reader }
    }
}

impl PassphraseReader for ReaderPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        let mut data = Zeroizing::new(Vec::new());
        self.reader.read_to_end(&mut data).map_err(|e| {
            PasscryptError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("error reading passphrase: {}", e),
                e,
            )
        })?;
        Ok(data)
    }
}

/// Reads passphrase from terminal with no echo
pub struct TerminalPassphraseReader {
    prompt: &'static str,
}

impl TerminalPassphraseReader {
    pub fn new() -> Self {
        Self::with_prompt("Password (passcrypt): ")
    }

    pub fn with_prompt(prompt: &'static str) -> Self {
        Self { prompt }
    }
}

impl Default for TerminalPassphraseReader {
    fn default() -> Self {
        Self::new()
    }
}

impl PassphraseReader for TerminalPassphraseReader {
    /// Read passphrase from terminal.
    ///
    /// Terminal input is limited to UTF-8 by rpassword. For non-UTF-8
    /// passphrases, use --passphrase-stdin instead.
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        if !io::stdin().is_terminal() {
            return Err(PasscryptError::with_kind(
                ErrorCategory::User,
                ErrorKind::PassphraseUnavailable,
                "cannot read passphrase from terminal - stdin is not a terminal",
            ));
        }

        let mut stderr = io::stderr();
        stderr
            .write_all(self.prompt.as_bytes())
            .and_then(|()| stderr.flush())
            .map_err(|e| {
                PasscryptError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    format!("failed to write prompt: {}", e),
                    e,
                )
            })?;

        // rpassword returns a plain String; move it into a zeroizing buffer right away
        let passphrase = rpassword::read_password().map_err(|e| {
            PasscryptError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::PassphraseUnavailable,
                format!("failure reading passphrase: {}", e),
                e,
            )
        })?;

        Ok(Zeroizing::new(passphrase.into_bytes()))
    }
}

/// Reads a passphrase twice and requires both entries to match
pub struct ConfirmingPassphraseReader {
    primary: Box<dyn PassphraseReader>,
    confirmation: Box<dyn PassphraseReader>,
}

impl ConfirmingPassphraseReader {
    pub fn new(
        primary: Box<dyn PassphraseReader>,
        confirmation: Box<dyn PassphraseReader>,
    ) -> Self {
        Self {
            primary,
            confirmation,
        }
    }

    /// Prompts twice on the terminal.
    pub fn terminal() -> Self {
        Self::new(
            Box::new(TerminalPassphraseReader::new()),
            Box::new(TerminalPassphraseReader::with_prompt(
                "Confirm password (passcrypt): ",
            )),
        )
    }
}

impl PassphraseReader for ConfirmingPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        let first = self.primary.read_passphrase()?;
        let second = self.confirmation.read_passphrase()?;
        if *first != *second {
            return Err(PasscryptError::with_kind(
                ErrorCategory::User,
                ErrorKind::PassphraseMismatch,
                "passwords do not match",
            ));
        }
        Ok(first)
    }
}

/// Fails unless `passphrase` has at least `min_chars` characters
///
/// Invalid UTF-8 sequences each count as a single character.
pub fn check_min_length(passphrase: &[u8], min_chars: usize) -> Result<()> {
    let chars = String::from_utf8_lossy(passphrase).chars().count();
    if chars < min_chars {
        return Err(PasscryptError::with_kind(
            ErrorCategory::User,
            ErrorKind::PassphraseTooShort,
            format!("password must be at least {} characters long", min_chars),
        ));
    }
    Ok(())
}
