//! Golden test vector validation
//!
//! Each vector fixes the salt, nonce and iteration count, and records the exact
//! container bytes an encryption must produce.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use passcrypt::codec;
use passcrypt::kdf::KdfParams;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct GoldenVector {
    plaintext: String,
    passphrase: String,
    salt: String,
    nonce: String,
    iterations: u32,
    filename: String,
    output_filename: String,
    container: String,
    comment: String,
}

fn load_golden_vectors() -> Result<Vec<GoldenVector>, serde_json::Error> {
    let json_data = include_str!("../testdata/golden-vectors.json");
    serde_json::from_str(json_data)
}

/// Check a single vector, returning a description of the first mismatch.
fn check_vector(vector: &GoldenVector) -> Result<(), String> {
    let decode = |field: &str, value: &str| {
        BASE64_STANDARD
            .decode(value)
            .map_err(|e| format!("failed to decode {}: {}", field, e))
    };
    let expected_plaintext = decode("plaintext", &vector.plaintext)?;
    let passphrase = decode("passphrase", &vector.passphrase)?;
    let salt: [u8; 16] = decode("salt", &vector.salt)?
        .try_into()
        .map_err(|v: Vec<u8>| format!("salt must be 16 bytes, got {}", v.len()))?;
    let nonce: [u8; 12] = decode("nonce", &vector.nonce)?
        .try_into()
        .map_err(|v: Vec<u8>| format!("nonce must be 12 bytes, got {}", v.len()))?;
    let params = KdfParams::new(vector.iterations).map_err(|e| e.to_string())?;

    // Deterministic encryption produces the exact container
    let encrypted = codec::encrypt_deterministic(
        &expected_plaintext,
        &vector.filename,
        &passphrase,
        &salt,
        &nonce,
        &params,
    )
    .map_err(|e| format!("failed to encrypt - {}", e))?;

    let actual = String::from_utf8(encrypted.bytes).map_err(|e| e.to_string())?;
    if actual != vector.container {
        return Err(format!(
            "container mismatch\n  Expected: {}\n  Actual:   {}",
            vector.container, actual
        ));
    }
    if encrypted.filename != vector.output_filename {
        return Err(format!(
            "output filename mismatch: expected {}, got {}",
            vector.output_filename, encrypted.filename
        ));
    }

    // The recorded container also decrypts and validates
    if !codec::is_valid_container(vector.container.as_bytes(), &vector.output_filename) {
        return Err("container rejected by is_valid_container".to_string());
    }
    let decrypted = codec::decrypt_with_params(vector.container.as_bytes(), &passphrase, &params)
        .map_err(|e| format!("failed to decrypt - {}", e))?;

    if *decrypted.plaintext != expected_plaintext {
        return Err(format!(
            "plaintext mismatch: expected length {}, actual length {}",
            expected_plaintext.len(),
            decrypted.plaintext.len()
        ));
    }
    if decrypted.filename != vector.filename {
        return Err(format!(
            "filename mismatch: expected {}, got {}",
            vector.filename, decrypted.filename
        ));
    }

    Ok(())
}

/// Run golden vector tests on specified indices
///
/// If `indices` is None, tests all vectors. Otherwise tests only
/// the specified indices.
fn run_golden_vector_tests(indices: Option<&[usize]>) {
    let vectors = load_golden_vectors().expect("failed to load golden vectors");

    let selected: Vec<usize> = match indices {
        Some(idx) => {
            for &i in idx {
                assert!(
                    i < vectors.len(),
                    "Index {} is out of bounds (only {} vectors available)",
                    i,
                    vectors.len()
                );
            }
            idx.to_vec()
        }
        None => (0..vectors.len()).collect(),
    };

    println!("Testing {} golden vectors", selected.len());

    let mut failed = 0;
    for &i in &selected {
        let vector = &vectors[i];
        if let Err(msg) = check_vector(vector) {
            eprintln!("Vector {}: FAILED - {}", i, msg);
            eprintln!("  Comment: {}", vector.comment);
            failed += 1;
        }
    }

    println!(
        "Results: {} passed, {} failed out of {} total",
        selected.len() - failed,
        failed,
        selected.len()
    );

    assert_eq!(failed, 0, "Some golden vectors failed validation");
    assert!(!selected.is_empty(), "No golden vectors were tested");
}

/// Test a small subset of diverse golden vectors for regular testing.
#[test]
fn test_golden_vectors_subset() {
    // Empty plaintext, non-ASCII names, and the reduced iteration counts
    let test_indices = [0, 6, 10, 11];
    run_golden_vector_tests(Some(&test_indices));
}

/// Test all golden vectors (run with --ignored flag)
///
/// Run with: cargo test test_all_golden_vectors -- --ignored
#[test]
#[ignore]
fn test_all_golden_vectors() {
    run_golden_vector_tests(None);
}
