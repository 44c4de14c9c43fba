//! Donation Village service entry point

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lib_identity::{create_did, derive_wallet, verify_credential, VerifiableCredential};
use lib_storage::BackendMode;
use village::config::{load_configuration, CliArgs};
use village::{api, AppContext};

#[derive(Debug, Parser)]
#[command(name = "village", version, about = "Donation Village service")]
struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// TOML configuration file
        #[arg(short, long, env = "VILLAGE_CONFIG")]
        config: Option<PathBuf>,
        /// Local database directory
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Storage backend (local | supabase)
        #[arg(long)]
        backend: Option<BackendMode>,
        /// Listening port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the wallet address and DID derived from an email
    DeriveWallet {
        email: String,
        #[arg(long, default_value_t = lib_identity::constants::ARBITRUM_SEPOLIA_CHAIN_ID)]
        chain_id: u64,
    },
    /// Check the proof of a credential stored as JSON
    VerifyCredential { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| cli.log_level.clone());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Command::Serve {
            config,
            data_dir,
            backend,
            port,
        } => {
            let args = CliArgs {
                config,
                data_dir,
                backend,
                port,
            };
            let config = load_configuration(&args).await?;
            let ctx = AppContext::from_config(config).await?;
            api::serve(Arc::new(ctx)).await
        }
        Command::DeriveWallet { email, chain_id } => {
            let wallet = derive_wallet(&email).context("Failed to derive wallet")?;
            println!("address: {}", wallet.address());
            println!("did:     {}", create_did(&wallet.address(), chain_id));
            Ok(())
        }
        Command::VerifyCredential { file } => {
            let raw = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let credential: VerifiableCredential =
                serde_json::from_str(&raw).context("Not a verifiable credential")?;
            if verify_credential(&credential) {
                println!("valid: signed by {}", signer_of(&credential));
                Ok(())
            } else {
                anyhow::bail!("credential proof is missing or invalid")
            }
        }
    }
}

fn signer_of(credential: &VerifiableCredential) -> &str {
    credential
        .proof
        .as_ref()
        .map(|p| p.verification_method.as_str())
        .unwrap_or("<unknown>")
}
