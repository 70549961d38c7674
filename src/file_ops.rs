//! File encryption/decryption operations
//!
//! This module provides file-level operations on top of the codec: reading
//! inputs, choosing output names, and writing results atomically with
//! owner-only permissions.

use crate::codec;
use crate::container::{self, Container};
use crate::error::{ErrorCategory, ErrorKind, PasscryptError, Result};
use crate::passphrase::{self, PassphraseReader};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Metadata of a container, readable without the password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSummary {
    pub original_filename: String,
    pub original_size: u64,
    pub encrypted_len: usize,
}

/// Encrypt a file with a password
///
/// Reads plaintext from `input_path`, encrypts it using a password from
/// `passphrase_reader`, and writes the container. The output goes to
/// `output` if it names a file, into `output` under the derived name
/// (`report.pdf` becomes `report.enc`) if it names a directory, and next to
/// the input under the derived name if it is `None`.
///
/// An existing file is only replaced when `output` names it explicitly; a
/// derived output path that already exists is an error.
///
/// Passwords shorter than [`passphrase::MIN_PASSPHRASE_CHARS`] are refused.
/// Returns the path written.
pub fn encrypt_file(
    input_path: &Path,
    output: Option<&Path>,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<PathBuf> {
    let filename = file_name(input_path)?;
    let plaintext = fs::read(input_path).map_err(|e| read_error(input_path, e))?;
    let passphrase = passphrase_reader.read_passphrase()?;
    passphrase::check_min_length(&passphrase, passphrase::MIN_PASSPHRASE_CHARS)?;

    let payload = codec::encrypt(&plaintext, &filename, &passphrase)
        .map_err(|e| e.with_context("encryption failed"))?;

    let (output_path, overwrite) = resolve_output(input_path, output, &payload.filename)?;
    write_file_atomic(&output_path, &payload.bytes, overwrite)
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;

    tracing::info!(
        input = %input_path.display(),
        output = %output_path.display(),
        "encrypted file"
    );
    Ok(output_path)
}

/// Decrypt a container file with a password
///
/// The input name must end in `.enc`. The plaintext goes to `output` if it
/// names a file, and otherwise (into the `output` directory, or next to the
/// input) under the file name recorded in the container. Only the final
/// component of the recorded name is used, so a container cannot direct the
/// output into another directory, and a file already present under that
/// name is never replaced.
///
/// Returns the path written.
pub fn decrypt_file(
    input_path: &Path,
    output: Option<&Path>,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<PathBuf> {
    let input_name = file_name(input_path)?;
    if !container::has_container_suffix(&input_name) {
        return Err(PasscryptError::with_kind(
            ErrorCategory::User,
            ErrorKind::MalformedContainer,
            format!(
                "{} is not a container: name does not end in {}",
                input_path.display(),
                container::CONTAINER_SUFFIX
            ),
        ));
    }

    let input = fs::read(input_path).map_err(|e| read_error(input_path, e))?;
    let passphrase = passphrase_reader.read_passphrase()?;
    let payload =
        codec::decrypt(&input, &passphrase).map_err(|e| e.with_context("failed to decrypt"))?;

    let name = safe_output_name(&payload.filename, &input_name);
    let (output_path, overwrite) = resolve_output(input_path, output, &name)?;
    write_file_atomic(&output_path, &payload.plaintext, overwrite)
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;

    tracing::info!(
        input = %input_path.display(),
        output = %output_path.display(),
        "decrypted file"
    );
    Ok(output_path)
}

/// Read the unencrypted metadata of a container file.
pub fn inspect_file(input_path: &Path) -> Result<ContainerSummary> {
    let input = fs::read(input_path).map_err(|e| read_error(input_path, e))?;
    let container = Container::parse(&input)
        .map_err(|e| e.with_context(format!("failed to inspect {}", input_path.display())))?;

    Ok(ContainerSummary {
        original_filename: container.original_filename().to_string(),
        original_size: container.original_size(),
        encrypted_len: input.len(),
    })
}

/// Returns whether the file at `input_path` is a valid container candidate.
///
/// Only failing to read the file is an error.
pub fn check_file(input_path: &Path) -> Result<bool> {
    let input = fs::read(input_path).map_err(|e| read_error(input_path, e))?;
    let name = file_name(input_path)?;
    Ok(codec::is_valid_container(&input, &name))
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            PasscryptError::with_kind(
                ErrorCategory::User,
                ErrorKind::Io,
                format!("{} does not name a file", path.display()),
            )
        })
}

/// Reduce a file name recorded in a container to a bare, usable file name.
fn safe_output_name(recorded: &str, input_name: &str) -> String {
    let recorded = recorded.rsplit(['/', '\\']).next().unwrap_or_default();
    if !recorded.is_empty() && recorded != "." && recorded != ".." {
        return recorded.to_string();
    }

    match input_name.strip_suffix(container::CONTAINER_SUFFIX) {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => "decrypted".to_string(),
    }
}

/// Pick the output path, and whether an existing file there may be replaced.
///
/// Only an output path given explicitly by the caller may be overwritten.
fn resolve_output(
    input_path: &Path,
    output: Option<&Path>,
    name: &str,
) -> Result<(PathBuf, bool)> {
    let (output_path, overwrite) = match output {
        Some(path) if path.is_dir() => (path.join(name), false),
        Some(path) => (path.to_path_buf(), true),
        None => (input_path.with_file_name(name), false),
    };

    if output_path == input_path {
        return Err(PasscryptError::with_kind(
            ErrorCategory::User,
            ErrorKind::Io,
            format!(
                "refusing to overwrite input file {}; choose an output path",
                input_path.display()
            ),
        ));
    }
    Ok((output_path, overwrite))
}

/// Write a file atomically (tempfile + fsync + rename) with mode 0o600 on Unix
///
/// Either the previous file or the complete new file exists afterwards,
/// never a partial one. Unless `overwrite` is set, an existing file at `path`
/// is left alone and reported as a user error.
fn write_file_atomic(path: &Path, contents: &[u8], overwrite: bool) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut temp_file = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
        PasscryptError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Io,
            format!("failed to create tempfile in {}", dir.display()),
            e,
        )
    })?;

    temp_file.write_all(contents).map_err(|e| {
        PasscryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to write to tempfile",
            e,
        )
    })?;
    // Flush and fsync() such that the rename later, if it succeeds, will
    // always point to a valid file.
    temp_file.flush().map_err(|e| {
        PasscryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to flush tempfile",
            e,
        )
    })?;
    temp_file.as_file().sync_all().map_err(|e| {
        PasscryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to sync file prior to rename",
            e,
        )
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp_file
            .as_file()
            .set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(|e| {
                PasscryptError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    "failed to set tempfile permissions",
                    e,
                )
            })?;
    }

    let persisted = if overwrite {
        temp_file.persist(path)
    } else {
        temp_file.persist_noclobber(path)
    };
    persisted.map_err(|e| {
        if e.error.kind() == io::ErrorKind::AlreadyExists {
            PasscryptError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Io,
                format!(
                    "refusing to overwrite existing file {}; choose an output path",
                    path.display()
                ),
                e.error,
            )
        } else {
            PasscryptError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("failed to rename to target file {}", path.display()),
                e.error,
            )
        }
    })?;
    Ok(())
}

fn read_error(path: &Path, err: io::Error) -> PasscryptError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    PasscryptError::with_kind_and_source(
        category,
        ErrorKind::Io,
        format!("failed to read from {}", path.display()),
        err,
    )
}
