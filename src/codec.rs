//! Encryption/decryption using PBKDF2 + AES-256-GCM
//!
//! This module implements password-based encryption using:
//! - PBKDF2-HMAC-SHA256 for key derivation from the password
//! - AES-256-GCM for authenticated encryption, with no associated data
//!
//! Every encryption draws a fresh 16-byte salt and 12-byte nonce, so a
//! derived key is never used with more than one nonce. The result is
//! serialized as a [`Container`].

use std::fmt;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use crate::container::{self, Container, NONCE_LEN};
use crate::error::{ErrorCategory, ErrorKind, PasscryptError, Result};
use crate::kdf::{self, KdfParams, SALT_LEN};

/// A serialized container and the file name it should be stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedPayload {
    pub bytes: Vec<u8>,
    pub filename: String,
}

/// Plaintext recovered from a container, with the metadata recorded at
/// encryption time.
pub struct DecryptedPayload {
    pub plaintext: Zeroizing<Vec<u8>>,
    pub filename: String,
    pub original_size: u64,
}

impl fmt::Debug for DecryptedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptedPayload")
            .field("plaintext", &format_args!("[{} bytes]", self.plaintext.len()))
            .field("filename", &self.filename)
            .field("original_size", &self.original_size)
            .finish()
    }
}

/// Encrypt `plaintext` under `password` using random salt and nonce
///
/// `filename` is recorded in the container and used to derive the returned
/// output file name.
pub fn encrypt(plaintext: &[u8], filename: &str, password: &[u8]) -> Result<EncryptedPayload> {
    encrypt_with_params(plaintext, filename, password, &KdfParams::default())
}

/// Like [`encrypt`], with custom key derivation parameters.
///
/// Containers do not record the parameters; the result can only be
/// decrypted with [`decrypt_with_params`] and the same parameters.
pub fn encrypt_with_params(
    plaintext: &[u8],
    filename: &str,
    password: &[u8],
    params: &KdfParams,
) -> Result<EncryptedPayload> {
    let mut salt = [0u8; SALT_LEN];
    fill_random(&mut salt)?;

    let mut nonce = [0u8; NONCE_LEN];
    fill_random(&mut nonce)?;

    encrypt_deterministic(plaintext, filename, password, &salt, &nonce, params)
}

/// Encrypt using provided salt and nonce
///
/// This function is ONLY for testing purposes to generate deterministic output.
/// NEVER use this in production - always use `encrypt()` which generates random salt/nonce.
pub fn encrypt_deterministic(
    plaintext: &[u8],
    filename: &str,
    password: &[u8],
    salt: &[u8; SALT_LEN],
    nonce: &[u8; NONCE_LEN],
    params: &KdfParams,
) -> Result<EncryptedPayload> {
    let key = kdf::derive_key(password, salt, params)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|e| {
            PasscryptError::with_kind(
                ErrorCategory::Internal,
                ErrorKind::Encryption,
                format!("encryption failed: {}", e),
            )
        })?;

    let container = Container::new(
        ciphertext,
        *nonce,
        *salt,
        filename.to_string(),
        plaintext.len() as u64,
    );
    let bytes = container.to_bytes()?;

    tracing::debug!(
        plaintext_len = plaintext.len(),
        container_len = bytes.len(),
        "encrypted payload"
    );

    Ok(EncryptedPayload {
        bytes,
        filename: container::encrypted_filename(filename),
    })
}

/// Decrypt a serialized container with a password
///
/// A wrong password and a corrupted or tampered-with container both fail
/// with [`ErrorKind::AuthenticationFailed`]; the two cases are not
/// distinguished.
pub fn decrypt(input: &[u8], password: &[u8]) -> Result<DecryptedPayload> {
    decrypt_with_params(input, password, &KdfParams::default())
}

/// Like [`decrypt`], with custom key derivation parameters.
pub fn decrypt_with_params(
    input: &[u8],
    password: &[u8],
    params: &KdfParams,
) -> Result<DecryptedPayload> {
    let container = Container::parse(input)?;

    // Reject before the slow key derivation; the size is not covered by the tag.
    container.check_original_size()?;

    let key = kdf::derive_key(password, container.salt(), params)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

    let plaintext = cipher
        .decrypt(Nonce::from_slice(container.nonce()), container.ciphertext())
        .map_err(|_| {
            tracing::debug!(
                ciphertext_len = container.ciphertext().len(),
                "authentication tag mismatch"
            );
            PasscryptError::with_kind(
                ErrorCategory::User,
                ErrorKind::AuthenticationFailed,
                "incorrect password or corrupted file",
            )
        })?;
    let plaintext = Zeroizing::new(plaintext);

    tracing::debug!(plaintext_len = plaintext.len(), "decrypted payload");

    let (filename, original_size) = container.into_parts();
    Ok(DecryptedPayload {
        plaintext,
        filename,
        original_size,
    })
}

/// Returns true if `input` looks like a decryptable container.
///
/// `filename` must end in `.enc` and `input` must parse as a container with
/// all fields present and well formed. The password is not checked, so
/// decryption can still fail with [`ErrorKind::AuthenticationFailed`].
pub fn is_valid_container(input: &[u8], filename: &str) -> bool {
    if !container::has_container_suffix(filename) {
        return false;
    }

    match Container::parse(input) {
        Ok(_) => true,
        Err(e) => {
            tracing::debug!(error = %e, "rejected container candidate");
            false
        }
    }
}

fn fill_random(dest: &mut [u8]) -> Result<()> {
    OsRng.try_fill_bytes(dest).map_err(|e| {
        PasscryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Encryption,
            "random source unavailable",
            e,
        )
    })
}
