//! passcrypt - password-based file encryption using PBKDF2 and AES-256-GCM
//!
//! The core is [`codec`]: [`encrypt`] turns file bytes, a file name and a
//! password into a self-describing JSON container, [`decrypt`] reverses it,
//! and [`is_valid_container`] checks a candidate without decrypting.
//! [`passphrase`] and [`file_ops`] support the command-line front end.

#![forbid(unsafe_code)]

pub mod codec;
pub mod container;
pub mod error;
pub mod file_ops;
pub mod kdf;
pub mod passphrase;
pub mod size;

pub use codec::{DecryptedPayload, EncryptedPayload, decrypt, encrypt, is_valid_container};
pub use error::{ErrorCategory, ErrorKind, PasscryptError, Result};
pub use size::format_file_size;
