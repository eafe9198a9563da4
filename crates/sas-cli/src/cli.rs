//! CLI command definitions and argument parsing

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::debug;

use sas_core::{api, Config, CoreError, Keyring};

use crate::ExitCode;

/// SAS CLI - sign and verify messages with mesh identities
#[derive(Parser, Debug)]
#[command(name = "sas-cli")]
#[command(version, about = "Sign and verify messages with mesh identities")]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Keyring file (overrides config)
    #[arg(long, global = true, env = "SAS_KEYRING")]
    pub keyring: Option<PathBuf>,

    /// Keyring PIN (overrides config)
    #[arg(long, global = true, env = "SAS_PIN", hide_env_values = true)]
    pub pin: Option<String>,

    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign a message; prints the SID and the hex signature
    Sign {
        /// Identity to sign as (a new identity is created when omitted)
        #[arg(long)]
        sid: Option<String>,

        /// Message text
        message: String,
    },

    /// Verify a signature against a signing public key
    Verify {
        /// Signing public key (64 hex characters)
        sas: String,

        /// Signature (128 hex characters)
        signature: String,

        /// Message text
        message: String,
    },

    /// Manage keyring identities
    Identity {
        #[command(subcommand)]
        action: IdentityAction,
    },

    /// Print a sample configuration file
    SampleConfig,
}

/// Identity subcommands
#[derive(Subcommand, Debug)]
pub enum IdentityAction {
    /// List identities visible under the PIN
    List,
    /// Create a new identity
    Create,
    /// Print the raw signing key of an identity (keep it secret)
    ExportKey {
        /// Identity SID (64 hex characters)
        sid: String,
    },
}

impl Cli {
    /// Execute the CLI command with a pre-loaded configuration
    pub fn execute_with_config(self, config: Config) -> anyhow::Result<ExitCode> {
        let keyring_path = config.keyring.path.clone();
        let pin = config.keyring.pin.as_str();

        match self.command {
            Commands::Sign { sid, message } => {
                match api::sign_as(sid.as_deref(), message.as_bytes(), keyring_path.as_deref(), pin) {
                    Ok(out) => {
                        println!("{}", out.sid);
                        println!("{}", out.signature_hex);
                        Ok(ExitCode::Success)
                    }
                    Err(e) => Ok(report(e)),
                }
            }
            Commands::Verify {
                sas,
                signature,
                message,
            } => match api::verify(&sas, &signature, message.as_bytes()) {
                Ok(true) => {
                    println!("verified");
                    Ok(ExitCode::Success)
                }
                Ok(false) => {
                    println!("signature did not verify");
                    Ok(ExitCode::VerificationFailed)
                }
                Err(e) => Ok(report(e)),
            },
            Commands::Identity { action } => {
                let path = match keyring_path {
                    Some(path) => path,
                    None => Keyring::default_path()
                        .context("no default keyring location; pass --keyring")?,
                };
                execute_identity(action, path, pin)
            }
            Commands::SampleConfig => {
                print!("{}", Config::sample_config());
                Ok(ExitCode::Success)
            }
        }
    }
}

fn execute_identity(action: IdentityAction, path: PathBuf, pin: &str) -> anyhow::Result<ExitCode> {
    match action {
        IdentityAction::List => {
            let mut keyring = Keyring::open(&path)
                .with_context(|| format!("opening keyring {}", path.display()))?;
            let count = keyring.unlock(pin)?;
            debug!(count, path = %path.display(), "Listing identities");

            for identity in keyring.identities() {
                println!("{}:{}", identity.sid(), hex::encode(identity.sas_public()));
            }
            Ok(ExitCode::Success)
        }
        IdentityAction::Create => {
            let mut keyring = Keyring::open(&path)
                .with_context(|| format!("opening keyring {}", path.display()))?;
            let identity = match keyring.create_identity(pin) {
                Ok(identity) => identity,
                Err(e) => return Ok(report(e.into())),
            };
            println!("{}:{}", identity.sid(), hex::encode(identity.sas_public()));
            Ok(ExitCode::Success)
        }
        IdentityAction::ExportKey { sid } => {
            match api::export_signing_key(&sid, Some(path.as_path()), pin) {
                Ok(key) => {
                    println!("{}", key.as_str());
                    Ok(ExitCode::Success)
                }
                Err(e) => Ok(report(e)),
            }
        }
    }
}

fn report(err: CoreError) -> ExitCode {
    let code = ExitCode::from(err.kind());
    eprintln!("Error: {err}");
    debug!(kind = %err.kind(), exit = code.name(), "Command failed");
    code
}
