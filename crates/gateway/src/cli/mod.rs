pub mod config;
pub mod token;

use clap::{Parser, Subcommand};

/// Dot Hub gateway: magic-link login and the "Ask Dot" intent endpoint.
#[derive(Debug, Parser)]
#[command(name = "hub-gateway", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the gateway server (default when no subcommand is given).
    Serve,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Mint or inspect signed identity tokens.
    #[command(subcommand)]
    Token(TokenCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

#[derive(Debug, Subcommand)]
pub enum TokenCommand {
    /// Issue a token and print the login link (and a job deep link with --job).
    Issue {
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "ALL")]
        client_code: String,
        #[arg(long, default_value = "there")]
        first_name: String,
        /// `Client WIP` or `Full`.
        #[arg(long, default_value = "Client WIP")]
        access: String,
        /// Also print a deep link to this job number.
        #[arg(long)]
        job: Option<String>,
    },
    /// Verify a token and print the identity it carries.
    Inspect {
        token: String,
    },
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path specified by `HUB_CONFIG` (or
/// `config.toml` by default).  Returns the parsed [`Config`] and the
/// path that was used.
///
/// [`Config`]: hub_domain::config::Config
pub fn load_config() -> anyhow::Result<(hub_domain::config::Config, String)> {
    let config_path = std::env::var("HUB_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        hub_domain::config::Config::default()
    };

    Ok((config, config_path))
}
