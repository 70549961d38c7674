//! Password-based key derivation
//!
//! Keys are derived with PBKDF2-HMAC-SHA256. The iteration count is part of
//! the container format (it is not recorded in the container), so anything
//! other than [`KdfParams::default`] only makes sense for tests and
//! benchmarks.

use std::fmt;

use hmac::Hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{ErrorCategory, ErrorKind, PasscryptError, Result};

/// Length of salt in bytes
pub const SALT_LEN: usize = 16;

/// Length of derived key in bytes
pub const KEY_LEN: usize = 32;

/// PBKDF2 iteration count used by the container format
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Tunable key derivation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    iterations: u32,
}

impl KdfParams {
    /// Creates parameters with a custom iteration count. Zero is rejected.
    pub fn new(iterations: u32) -> Result<Self> {
        if iterations == 0 {
            return Err(PasscryptError::with_kind(
                ErrorCategory::Internal,
                ErrorKind::KeyDerivation,
                "PBKDF2 iteration count must be at least 1",
            ));
        }
        Ok(Self { iterations })
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: PBKDF2_ITERATIONS,
        }
    }
}

/// A 256-bit AES key derived from a password.
///
/// Zeroized on drop.
pub struct DerivedKey {
    bytes: Zeroizing<[u8; KEY_LEN]>,
}

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Derive a 32-byte key from a password and salt using PBKDF2-HMAC-SHA256
pub fn derive_key(
    password: &[u8],
    salt: &[u8; SALT_LEN],
    params: &KdfParams,
) -> Result<DerivedKey> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::pbkdf2::<Hmac<Sha256>>(password, salt, params.iterations, key.as_mut_slice())
        .map_err(|e| {
            PasscryptError::with_kind(
                ErrorCategory::Internal,
                ErrorKind::KeyDerivation,
                format!("PBKDF2 key derivation failed: {}", e),
            )
        })?;

    tracing::trace!(iterations = params.iterations, "derived key");
    Ok(DerivedKey { bytes: key })
}
