//! passcrypt CLI - password-based file encryption
//!
//! Command-line interface for encrypting and decrypting files using
//! AES-256-GCM with PBKDF2 key derivation.

use clap::{ArgAction, Parser, Subcommand};
use std::error::Error as StdError;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use passcrypt::PasscryptError;
use passcrypt::file_ops;
use passcrypt::format_file_size;
use passcrypt::passphrase::{
    ConfirmingPassphraseReader, PassphraseReader, ReaderPassphraseReader,
    TerminalPassphraseReader,
};

#[derive(Parser)]
#[command(name = "passcrypt")]
#[command(version)]
#[command(about = "Password-based file encryption.", long_about = None)]
struct Cli {
    /// Read password from stdin instead of from terminal
    #[arg(long, global = true, env = "PASSCRYPT_PASSPHRASE_STDIN")]
    passphrase_stdin: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a file into a .enc container
    #[command(alias = "e")]
    Encrypt {
        /// Path to the file whose contents is to be encrypted
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output file or directory (default: next to the input, extension replaced by .enc)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Decrypt a .enc container
    #[command(alias = "d")]
    Decrypt {
        /// Path to the container to decrypt
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output file or directory (default: next to the input, under the recorded name)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Check whether a file is a valid container, without decrypting it
    #[command(alias = "c")]
    Check {
        /// Path to the candidate container
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
    },

    /// Show the metadata recorded in a container
    Inspect {
        /// Path to the container
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", error_chain(&e));
            process::exit(1);
        }
    }
}

/// Runs the selected command. `Ok(false)` means a negative answer from
/// `check`, which is not an error but still exits non-zero.
fn run(cli: Cli) -> passcrypt::Result<bool> {
    match cli.command {
        Commands::Encrypt { input, output } => {
            let mut reader: Box<dyn PassphraseReader> = if cli.passphrase_stdin {
                stdin_reader()
            } else {
                Box::new(ConfirmingPassphraseReader::terminal())
            };
            let written = file_ops::encrypt_file(&input, output.as_deref(), &mut *reader)?;
            println!("{}", written.display());
        }
        Commands::Decrypt { input, output } => {
            let mut reader: Box<dyn PassphraseReader> = if cli.passphrase_stdin {
                stdin_reader()
            } else {
                Box::new(TerminalPassphraseReader::new())
            };
            let written = file_ops::decrypt_file(&input, output.as_deref(), &mut *reader)?;
            println!("{}", written.display());
        }
        Commands::Check { input } => {
            if !file_ops::check_file(&input)? {
                println!("{}: not a valid container", input.display());
                return Ok(false);
            }
            println!("{}: valid container", input.display());
        }
        Commands::Inspect { input } => {
            let summary = file_ops::inspect_file(&input)?;
            println!("filename:       {}", summary.original_filename);
            println!(
                "original size:  {} ({} bytes)",
                format_file_size(summary.original_size),
                summary.original_size
            );
            println!(
                "container size: {}",
                format_file_size(summary.encrypted_len as u64)
            );
        }
    }
    Ok(true)
}

fn stdin_reader() -> Box<dyn PassphraseReader> {
    Box::new(ReaderPassphraseReader::new(Box::new(std::io::stdin())))
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // stdout carries command output; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn error_chain(err: &PasscryptError) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(s) = source {
        // Several messages already embed their source's text
        let text = s.to_string();
        if !msg.ends_with(&text) {
            msg.push_str(": ");
            msg.push_str(&text);
        }
        source = s.source();
    }
    msg
}
