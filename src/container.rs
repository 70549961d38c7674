//! Container serialization
//!
//! A container is a single compact JSON object, fields in this order:
//! - encryptedData: ciphertext with the 16-byte GCM tag appended, as an array
//!   of decimal byte values
//! - iv: the 12-byte nonce, same encoding
//! - salt: the 16-byte key derivation salt, same encoding
//! - filename: the original file name, unmodified
//! - originalSize: plaintext length in bytes
//!
//! Unknown fields are ignored when parsing.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCategory, ErrorKind, PasscryptError, Result};
use crate::kdf::SALT_LEN;

/// Length of the AES-GCM nonce in bytes
pub const NONCE_LEN: usize = 12;

/// Length of the AES-GCM authentication tag in bytes
pub const TAG_LEN: usize = 16;

/// File name suffix marking a container
pub const CONTAINER_SUFFIX: &str = ".enc";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    #[serde(rename = "encryptedData")]
    ciphertext: Vec<u8>,
    #[serde(rename = "iv")]
    nonce: [u8; NONCE_LEN],
    salt: [u8; SALT_LEN],
    #[serde(rename = "filename")]
    original_filename: String,
    original_size: u64,
}

impl Container {
    pub(crate) fn new(
        ciphertext: Vec<u8>,
        nonce: [u8; NONCE_LEN],
        salt: [u8; SALT_LEN],
        original_filename: String,
        original_size: u64,
    ) -> Self {
        Self {
            ciphertext,
            nonce,
            salt,
            original_filename,
            original_size,
        }
    }

    /// Parse and structurally validate a serialized container.
    ///
    /// Fails with [`ErrorKind::MalformedContainer`] if the input is not JSON,
    /// a required field is absent or has the wrong type or length, or the
    /// ciphertext is too short to hold an authentication tag.
    pub fn parse(input: &[u8]) -> Result<Self> {
        let container: Container = serde_json::from_slice(input).map_err(|e| {
            PasscryptError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::MalformedContainer,
                format!("invalid container: {}", e),
                e,
            )
        })?;

        if container.ciphertext.len() < TAG_LEN {
            return Err(PasscryptError::malformed(format!(
                "invalid container: encrypted data is {} bytes, shorter than the {}-byte authentication tag",
                container.ciphertext.len(),
                TAG_LEN
            )));
        }

        Ok(container)
    }

    /// Serialize to the on-disk representation.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| {
            PasscryptError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Encryption,
                "failed to serialize container",
                e,
            )
        })
    }

    /// Check that the recorded original size agrees with the ciphertext length.
    pub fn check_original_size(&self) -> Result<()> {
        let plaintext_len = self.ciphertext.len().saturating_sub(TAG_LEN) as u64;
        if plaintext_len != self.original_size {
            return Err(PasscryptError::malformed(format!(
                "invalid container: recorded original size {} does not match encrypted data ({} bytes)",
                self.original_size, plaintext_len
            )));
        }
        Ok(())
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    pub fn original_filename(&self) -> &str {
        &self.original_filename
    }

    pub fn original_size(&self) -> u64 {
        self.original_size
    }

    pub(crate) fn into_parts(self) -> (String, u64) {
        (self.original_filename, self.original_size)
    }
}

/// Returns true if `filename` carries the container suffix.
///
/// This is a necessary, not a sufficient, condition for being a container.
pub fn has_container_suffix(filename: &str) -> bool {
    filename.ends_with(CONTAINER_SUFFIX)
}

/// Derive the container file name for an input file name.
///
/// The final extension (the last `.` and everything after it) is replaced
/// by `.enc`. Names without an extension, names ending in a bare `.`, and
/// dotfiles such as `.profile` keep their full name.
pub fn encrypted_filename(filename: &str) -> String {
    let stem = match filename.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < filename.len() && !filename[idx..].contains('/') => {
            &filename[..idx]
        }
        _ => filename,
    };
    format!("{}{}", stem, CONTAINER_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Container {
        Container::new(
            (0..18).collect(),
            [1u8; NONCE_LEN],
            [2u8; SALT_LEN],
            "notes.txt".to_string(),
            2,
        )
    }

    #[test]
    fn test_exact_serialization() {
        let bytes = sample().to_bytes().unwrap();

        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            concat!(
                r#"{"encryptedData":[0,1,2,3,4,5,6,7,8,9,10,11,12,13,14,15,16,17],"#,
                r#""iv":[1,1,1,1,1,1,1,1,1,1,1,1],"#,
                r#""salt":[2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2],"#,
                r#""filename":"notes.txt","originalSize":2}"#
            )
        );
    }

    #[test]
    fn test_parse_serialized() {
        let container = sample();
        let parsed = Container::parse(&container.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed, container);
        assert_eq!(parsed.original_filename(), "notes.txt");
        assert_eq!(parsed.original_size(), 2);
    }

    fn sample_value() -> serde_json::Value {
        serde_json::from_slice(&sample().to_bytes().unwrap()).unwrap()
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let mut value = sample_value();
        value["version"] = json!(3);
        let parsed = Container::parse(value.to_string().as_bytes()).unwrap();
        assert_eq!(parsed, sample());
    }

    fn sample_with(field: &str, replacement: Option<serde_json::Value>) -> Vec<u8> {
        let mut value = sample_value();
        let object = value.as_object_mut().unwrap();
        match replacement {
            Some(v) => object.insert(field.to_string(), v),
            None => object.remove(field),
        };
        value.to_string().into_bytes()
    }

    #[test]
    fn test_missing_fields() {
        for field in ["encryptedData", "iv", "salt", "filename", "originalSize"] {
            let err = Container::parse(&sample_with(field, None))
                .expect_err("expected missing field to be rejected");
            assert_eq!(err.kind, Some(ErrorKind::MalformedContainer), "field {}", field);
            assert!(err.to_string().contains(field), "{}", err);
        }
    }

    #[test]
    fn test_wrong_types() {
        let cases = [
            ("encryptedData", json!("not an array")),
            ("encryptedData", json!([0, 1, 256, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14])),
            ("encryptedData", json!([-1, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14])),
            ("iv", json!(["a", 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1])),
            ("iv", json!([1.5, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1])),
            ("salt", json!(null)),
            ("filename", json!(42)),
            ("originalSize", json!(-2)),
            ("originalSize", json!("2")),
        ];

        for (field, replacement) in cases {
            let err = Container::parse(&sample_with(field, Some(replacement.clone())))
                .expect_err("expected wrong type to be rejected");
            assert_eq!(
                err.kind,
                Some(ErrorKind::MalformedContainer),
                "{} = {}",
                field,
                replacement
            );
        }
    }

    #[test]
    fn test_wrong_lengths() {
        let short_iv = sample_with("iv", Some(json!(vec![1u8; 11])));
        let long_salt = sample_with("salt", Some(json!(vec![2u8; 17])));
        let short_ciphertext = sample_with("encryptedData", Some(json!(vec![0u8; 15])));

        for input in [short_iv, long_salt, short_ciphertext] {
            let err = Container::parse(&input).expect_err("expected wrong length to be rejected");
            assert_eq!(err.kind, Some(ErrorKind::MalformedContainer));
        }
    }

    #[test]
    fn test_tag_only_ciphertext_accepted() {
        let input = sample_with("encryptedData", Some(json!(vec![0u8; 16])));
        assert!(Container::parse(&input).is_ok());
    }

    #[test]
    fn test_not_json() {
        let inputs: [&[u8]; 5] = [b"", b"armored:abc", b"{", b"[]", &[0xff, 0xfe, 0x00]];
        for input in inputs {
            let err = Container::parse(input).expect_err("expected garbage to be rejected");
            assert_eq!(err.kind, Some(ErrorKind::MalformedContainer));
        }
    }

    #[test]
    fn test_check_original_size() {
        assert!(sample().check_original_size().is_ok());

        let lying = sample_with("originalSize", Some(json!(3)));
        let lying = Container::parse(&lying).unwrap();
        let err = lying.check_original_size().expect_err("expected size mismatch");
        assert_eq!(err.kind, Some(ErrorKind::MalformedContainer));
    }

    #[test]
    fn test_encrypted_filename() {
        assert_eq!(encrypted_filename("report.pdf"), "report.enc");
        assert_eq!(encrypted_filename("archive.tar.gz"), "archive.tar.enc");
        assert_eq!(encrypted_filename("README"), "README.enc");
        assert_eq!(encrypted_filename("trailing."), "trailing..enc");
        assert_eq!(encrypted_filename(".profile"), ".profile.enc");
        assert_eq!(encrypted_filename("photo.enc"), "photo.enc");
        assert_eq!(encrypted_filename("v1.2/data"), "v1.2/data.enc");
        assert_eq!(encrypted_filename(""), ".enc");
    }

    #[test]
    fn test_has_container_suffix() {
        assert!(has_container_suffix("report.enc"));
        assert!(has_container_suffix(".enc"));
        assert!(!has_container_suffix("report.pdf"));
        assert!(!has_container_suffix("report.ENC"));
        assert!(!has_container_suffix("report.enc.bak"));
    }
}
