//! Command-line interface definition.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokengate::config::{default_config_path, GateConfig, ResponseMode};

/// NFT-gated PDF access server.
#[derive(Parser, Debug)]
#[command(name = "tokengate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Address to listen on.
    #[arg(long, env = "TOKENGATE_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// JSON-RPC endpoint used for `eth_call`.
    #[arg(long, env = "RPC_URL", hide_env_values = true)]
    pub rpc_url: Option<String>,

    /// NFT contract address.
    #[arg(long, env = "NFT_CONTRACT")]
    pub contract: Option<String>,

    /// Content identifier of the document.
    #[arg(long, env = "DOCS_CID")]
    pub docs_cid: Option<String>,

    /// Gateway base URL.
    #[arg(long, env = "GATEWAY_URL")]
    pub gateway_url: Option<String>,

    /// File path inside the CID.
    #[arg(long, env = "DOCS_FILE")]
    pub docs_file: Option<String>,

    /// Token id (switches the ownership check to ERC-1155).
    #[arg(long, env = "TOKEN_ID")]
    pub token_id: Option<String>,

    /// Response mode.
    #[arg(long, value_enum, env = "TOKENGATE_MODE")]
    pub mode: Option<CliMode>,

    /// Probe candidate paths inside the CID.
    #[arg(long, env = "TOKENGATE_DISCOVER_PATH")]
    pub discover_path: bool,

    /// Accept an address without a signature.
    #[arg(long, env = "TOKENGATE_ALLOW_UNSIGNED")]
    pub allow_unsigned: bool,

    /// Require signed messages to embed an issued nonce.
    #[arg(long, env = "TOKENGATE_REQUIRE_NONCE")]
    pub require_nonce: bool,

    /// `eth_call` timeout in seconds.
    #[arg(long, env = "TOKENGATE_RPC_TIMEOUT")]
    pub rpc_timeout: Option<u64>,

    /// Document download timeout in seconds.
    #[arg(long, env = "TOKENGATE_FETCH_TIMEOUT")]
    pub fetch_timeout: Option<u64>,

    /// Per-candidate probe timeout in seconds.
    #[arg(long, env = "TOKENGATE_PROBE_TIMEOUT")]
    pub probe_timeout: Option<u64>,

    /// Log level, overriding the config file. `RUST_LOG` wins over both.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Emit logs as JSON.
    #[arg(long)]
    pub json_logs: bool,

    /// Path to configuration file.
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

/// Response mode CLI enum.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliMode {
    /// Return the PDF bytes.
    Proxy,
    /// Return the document URL.
    Redirect,
}

impl Cli {
    /// Config file to load: the explicit one, else the platform default if
    /// it exists.
    #[must_use]
    pub fn config_path(&self) -> Option<PathBuf> {
        self.config
            .clone()
            .or_else(|| default_config_path().filter(|p| p.exists()))
    }

    /// Convert CLI arguments into a `GateConfig`.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file is specified but cannot be loaded.
    pub fn into_config(self) -> color_eyre::Result<GateConfig> {
        let mut config = if let Some(path) = self.config_path() {
            GateConfig::from_file(&path)?
        } else {
            GateConfig::default()
        };

        // Override with CLI arguments / environment
        if let Some(listen) = self.listen {
            config.listen = listen;
        }
        if self.rpc_url.is_some() {
            config.rpc_url = self.rpc_url;
        }
        if self.contract.is_some() {
            config.contract_address = self.contract;
        }
        if self.docs_cid.is_some() {
            config.docs_cid = self.docs_cid;
        }
        if let Some(gateway_url) = self.gateway_url {
            config.gateway_url = gateway_url;
        }
        if self.docs_file.is_some() {
            config.docs_file = self.docs_file;
        }
        if self.token_id.is_some() {
            config.token_id = self.token_id;
        }
        if let Some(mode) = self.mode {
            config.mode = mode.into();
        }

        config.discover_path |= self.discover_path;
        config.auth.allow_unsigned |= self.allow_unsigned;
        config.auth.require_nonce |= self.require_nonce;

        if let Some(secs) = self.rpc_timeout {
            config.timeouts.rpc_secs = secs;
        }
        if let Some(secs) = self.fetch_timeout {
            config.timeouts.fetch_secs = secs;
        }
        if let Some(secs) = self.probe_timeout {
            config.timeouts.probe_secs = secs;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }

        Ok(config)
    }
}

impl From<CliMode> for ResponseMode {
    fn from(m: CliMode) -> Self {
        match m {
            CliMode::Proxy => Self::Proxy,
            CliMode::Redirect => Self::Redirect,
        }
    }
}
