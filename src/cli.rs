//! Command-line interface parsing for the mandi binary
//!
//! Two subcommands: `serve` runs the price proxy, `dashboard` opens the
//! terminal price dashboard. Flags here override the matching environment
//! variables.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::{DashboardConfig, ProxyConfig};
use crate::i18n::Language;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified language code is not supported
    #[error("Invalid language: '{0}'. Valid languages: en, te, hi")]
    InvalidLanguage(String),
}

/// Mandi prices - AGMARKNET commodity prices from the terminal
#[derive(Parser, Debug)]
#[command(name = "mandi")]
#[command(about = "AGMARKNET market price proxy and terminal dashboard")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the secrets-holding price proxy
    Serve {
        /// Address to listen on (overrides PROXY_BIND_ADDR)
        #[arg(long, value_name = "ADDR")]
        bind: Option<SocketAddr>,
    },
    /// Open the terminal price dashboard
    ///
    /// Examples:
    ///   mandi dashboard            # Language from MANDI_LANG, default English
    ///   mandi dashboard --lang te  # Telugu
    ///   mandi dashboard --lang hi  # Hindi
    Dashboard {
        /// Display language: en, te or hi (overrides MANDI_LANG)
        #[arg(long, value_name = "LANG")]
        lang: Option<String>,
    },
}

/// Overrides taken from the command line, applied on top of the environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupConfig {
    pub bind_addr: Option<SocketAddr>,
    pub language: Option<Language>,
}

/// Parses a language argument into a Language.
///
/// # Arguments
/// * `s` - The language code from the CLI
///
/// # Returns
/// * `Ok(Language)` if the string names a supported language
/// * `Err(CliError::InvalidLanguage)` otherwise
pub fn parse_language_arg(s: &str) -> Result<Language, CliError> {
    Language::from_code(s).ok_or_else(|| CliError::InvalidLanguage(s.to_string()))
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with the overrides the user gave
    /// * `Err(CliError)` if an invalid language was specified
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        match &cli.command {
            Command::Serve { bind } => Ok(StartupConfig {
                bind_addr: *bind,
                language: None,
            }),
            Command::Dashboard { lang: None } => Ok(StartupConfig::default()),
            Command::Dashboard { lang: Some(code) } => Ok(StartupConfig {
                bind_addr: None,
                language: Some(parse_language_arg(code)?),
            }),
        }
    }

    pub fn apply_to_proxy(&self, config: &mut ProxyConfig) {
        if let Some(addr) = self.bind_addr {
            config.bind_addr = addr;
        }
    }

    pub fn apply_to_dashboard(&self, config: &mut DashboardConfig) {
        if let Some(language) = self.language {
            config.language = language;
        }
    }
}
