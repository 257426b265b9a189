//! XSACert - Main entry point
//!
//! Manages the local key and certificate store used for ACME provisioning.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use xsacert::{ArtifactKind, ArtifactStore, Config};

/// XSACert - ACME certificate manager
#[derive(Parser, Debug)]
#[command(name = "xsacert")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long = "config", env = "XSACERT_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Storage directory, overriding the configuration file
    #[arg(short = 'S', long = "storage", env = "XSACERT_STORAGE", global = true)]
    storage: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load the ACME account key for an email, generating it on first use
    Account {
        /// Email address
        #[arg(short = 'e', long = "email")]
        email: String,
    },
    /// Relabel an account key written by an earlier release as PKCS#8
    MigrateAccountKey {
        /// Email address
        #[arg(short = 'e', long = "email")]
        email: String,
    },
    /// Store a key and certificates obtained by an ACME client, then build the chain
    Install {
        /// Domain the certificate was issued for
        #[arg(short = 'd', long = "domain")]
        domain: String,

        /// Domain private key (PEM or DER, PKCS#1 or PKCS#8)
        #[arg(long = "key")]
        key: PathBuf,

        /// Leaf certificate (PEM)
        #[arg(long = "cert")]
        cert: PathBuf,

        /// Issuer certificate (PEM)
        #[arg(long = "issuer")]
        issuer: PathBuf,

        /// Skip full-chain assembly
        #[arg(long = "no-chain")]
        no_chain: bool,
    },
    /// Assemble the full chain from stored leaf and issuer certificates
    Chain {
        /// Domain
        #[arg(short = 'd', long = "domain")]
        domain: String,
    },
    /// Print the path an artifact is stored at
    Path {
        /// Domain or email address
        #[arg(short = 'n', long = "name")]
        name: String,

        /// Artifact tag (e.g. certificate, full-chain)
        #[arg(short = 't', long = "tag")]
        tag: String,
    },
    /// List stored artifacts
    List,
    /// Validate configuration and exit
    CheckConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbose flag
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_deref(), cli.storage)?;
    let cwd = std::env::current_dir().context("Failed to determine working directory")?;
    let store = ArtifactStore::from_config(&config, &cwd).context("Failed to load trust anchor")?;

    match cli.command {
        Commands::Account { email } => {
            store
                .get_or_create_user_key(&email)
                .with_context(|| format!("Failed to load account key for {}", email))?;
            let path = store.path_for(&email, ArtifactKind::UserPrivateKey)?;
            println!("{}", path.display());
        }
        Commands::MigrateAccountKey { email } => {
            let path = store
                .migrate_user_key(&email)
                .with_context(|| format!("Failed to migrate account key for {}", email))?;
            println!("{}", path.display());
        }
        Commands::Install {
            domain,
            key,
            cert,
            issuer,
            no_chain,
        } => install(&store, &domain, &key, &cert, &issuer, no_chain)?,
        Commands::Chain { domain } => {
            let path = store
                .assemble_full_chain(&domain)
                .with_context(|| format!("Failed to assemble chain for {}", domain))?;
            println!("{}", path.display());
        }
        Commands::Path { name, tag } => {
            if ArtifactKind::from_tag(&tag).is_none() {
                warn!(tag = %tag, "Tag is not one of the artifact types this tool writes");
            }
            println!("{}", store.resolve_path(&name, &tag)?.display());
        }
        Commands::List => {
            for artifact in store.list_artifacts()? {
                println!("{}\t{}\t{}", artifact.name, artifact.kind, artifact.path.display());
            }
        }
        Commands::CheckConfig => {
            info!(
                storage = %store.root().display(),
                naming = ?config.storage.naming,
                user_key_label = ?config.storage.user_key_label,
                anchor = %store.anchor().id(),
                api_server = %config.dns.api_server,
                "Configuration test successful"
            );
            println!("xsacert: configuration is valid");
        }
    }

    Ok(())
}

/// Load configuration with priority: CLI/env overrides > file > defaults
fn load_config(path: Option<&Path>, storage: Option<PathBuf>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_file(path).context("Failed to load configuration file")?,
        None => Config::default(),
    };

    if let Some(storage) = storage {
        config.storage.dir = storage;
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

fn install(
    store: &ArtifactStore,
    domain: &str,
    key: &Path,
    cert: &Path,
    issuer: &Path,
    no_chain: bool,
) -> Result<()> {
    let read = |path: &Path| {
        fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
    };
    let key_bytes = read(key)?;
    let cert_bytes = read(cert)?;
    let issuer_bytes = read(issuer)?;

    store
        .store_domain_private_key(domain, &key_bytes)
        .context("Failed to store domain private key")?;
    store
        .store_certificate(domain, &cert_bytes, ArtifactKind::Certificate)
        .context("Failed to store certificate")?;
    store
        .store_certificate(domain, &issuer_bytes, ArtifactKind::IssuerCertificate)
        .context("Failed to store issuer certificate")?;

    if no_chain {
        info!(domain = %domain, "Skipping full-chain assembly");
        return Ok(());
    }

    let chain = store
        .assemble_full_chain(domain)
        .context("Failed to assemble full chain")?;
    println!("{}", chain.display());
    Ok(())
}
