//! Keysniff - identify cryptographic files from their bytes
//!
//! Reports whether a file is a keystore (JKS, JCEKS, PKCS #12, BKS, UBER,
//! BCFKS), a certificate, CSR or CRL, a private key in one of several
//! encodings, a public key, or a JAR archive.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use keysniff::cli::{self, Cli, Commands};
use keysniff::config::{Config, LogFormat};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = if config_path.exists() {
        Config::load_from(&config_path)?
    } else {
        Config::default()
    };

    // Initialize logging
    let level = if cli.verbose {
        "debug"
    } else {
        config.general.log_level.as_str()
    };
    let filter = EnvFilter::from_default_env().add_directive(format!("keysniff={level}").parse()?);
    match config.general.log_format {
        LogFormat::Compact => tracing_subscriber::registry()
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr).compact())
            .with(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).json())
            .with(filter)
            .init(),
    }

    let success = match &cli.command {
        Commands::Examine(args) => cli::run_examine(args, &config)?,
        Commands::Keystore(args) => cli::run_keystore(args, &config)?,
        Commands::Config(args) => {
            cli::run_config(args, &config_path, &config)?;
            true
        }
    };

    if !success {
        std::process::exit(1);
    }
    Ok(())
}
