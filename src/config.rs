//! Configuration for tokengate.
//!
//! [`GateConfig`] is what the operator writes (TOML file, CLI flags,
//! environment). [`GateConfig::validate`] turns it into [`GateSettings`],
//! the immutable, fully-typed form the gate runs on.

use crate::address::Address;
use crate::chain::abi::parse_token_id;
use crate::error::{Error, Result};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Gateway used when none is configured.
pub const DEFAULT_GATEWAY_URL: &str = "https://gateway.pinata.cloud/ipfs";

/// How a granted request gets the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    /// Fetch the PDF from the gateway and return its bytes.
    #[default]
    Proxy,
    /// Return `{ "url": ... }` and let the caller fetch it.
    Redirect,
}

/// Gate configuration as written by the operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Address the HTTP server binds to.
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// JSON-RPC endpoint (`RPC_URL`).
    #[serde(default)]
    pub rpc_url: Option<String>,

    /// NFT contract address (`NFT_CONTRACT`).
    #[serde(default)]
    pub contract_address: Option<String>,

    /// Content identifier of the document (`DOCS_CID`).
    #[serde(default)]
    pub docs_cid: Option<String>,

    /// Gateway base URL (`GATEWAY_URL`).
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,

    /// File path inside the CID (`DOCS_FILE`).
    #[serde(default)]
    pub docs_file: Option<String>,

    /// Token id; when set, ownership uses ERC-1155 `balanceOf` (`TOKEN_ID`).
    #[serde(default)]
    pub token_id: Option<String>,

    /// Per-token document paths. Keys are token ids; a request naming one
    /// of them gets that path instead of `docs_file`.
    #[serde(default)]
    pub token_paths: BTreeMap<String, String>,

    /// Response mode.
    #[serde(default)]
    pub mode: ResponseMode,

    /// Probe candidate paths instead of trusting `docs_file`.
    #[serde(default)]
    pub discover_path: bool,

    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Outbound call timeouts.
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Accept an address without a signature. Lets anyone probe any
    /// address's ownership status.
    #[serde(default)]
    pub allow_unsigned: bool,

    /// Require signed messages to embed a nonce issued by `GET ?nonce=1`.
    #[serde(default)]
    pub require_nonce: bool,

    /// Nonce lifetime in seconds.
    #[serde(default = "default_nonce_ttl")]
    pub nonce_ttl_secs: u64,

    /// Maximum number of outstanding nonces.
    #[serde(default = "default_nonce_capacity")]
    pub nonce_capacity: usize,
}

/// Outbound call timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// `eth_call` timeout in seconds.
    #[serde(default = "default_rpc_timeout")]
    pub rpc_secs: u64,

    /// Document download timeout in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_secs: u64,

    /// Per-candidate probe timeout in seconds.
    #[serde(default = "default_probe_timeout")]
    pub probe_secs: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            rpc_url: None,
            contract_address: None,
            docs_cid: None,
            gateway_url: default_gateway_url(),
            docs_file: None,
            token_id: None,
            token_paths: BTreeMap::new(),
            mode: ResponseMode::default(),
            discover_path: false,
            auth: AuthConfig::default(),
            timeouts: TimeoutConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            allow_unsigned: false,
            require_nonce: false,
            nonce_ttl_secs: default_nonce_ttl(),
            nonce_capacity: default_nonce_capacity(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            rpc_secs: default_rpc_timeout(),
            fetch_secs: default_fetch_timeout(),
            probe_secs: default_probe_timeout(),
        }
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8888))
}

fn default_gateway_url() -> String {
    DEFAULT_GATEWAY_URL.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_nonce_ttl() -> u64 {
    300 // 5 minutes
}

const fn default_nonce_capacity() -> usize {
    10_000
}

const fn default_rpc_timeout() -> u64 {
    8
}

const fn default_fetch_timeout() -> u64 {
    15
}

const fn default_probe_timeout() -> u64 {
    5
}

/// Default config file: `<platform config dir>/tokengate/config.toml`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "tokengate")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

impl GateConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Save configuration to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_file(&self, path: &std::path::Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Environment names of required settings that are unset or blank.
    #[must_use]
    pub fn missing(&self) -> Vec<&'static str> {
        let blank = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());
        let mut missing = Vec::new();
        if blank(&self.rpc_url) {
            missing.push("RPC_URL");
        }
        if blank(&self.contract_address) {
            missing.push("NFT_CONTRACT");
        }
        if blank(&self.docs_cid) {
            missing.push("DOCS_CID");
        }
        missing
    }

    /// Check the configuration and build the settings the gate runs on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingConfig`] naming every absent required value,
    /// or [`Error::Config`] for values present but invalid.
    pub fn validate(&self) -> Result<GateSettings> {
        let missing = self.missing();
        if !missing.is_empty() {
            return Err(Error::MissingConfig(missing));
        }

        let rpc_url = self.rpc_url.clone().unwrap_or_default();
        let docs_cid = self.docs_cid.clone().unwrap_or_default();
        let contract = self
            .contract_address
            .as_deref()
            .unwrap_or_default()
            .trim()
            .parse::<Address>()
            .map_err(|_| Error::Config("NFT_CONTRACT is not a valid address".to_string()))?;

        let token_id = self
            .token_id
            .as_deref()
            .map(parse_token_id)
            .transpose()
            .map_err(|_| Error::Config("TOKEN_ID is not a valid integer".to_string()))?;

        let token_paths = self
            .token_paths
            .iter()
            .map(|(id, path)| {
                parse_token_id(id)
                    .map(|id| (id, path.trim_matches('/').to_string()))
                    .map_err(|_| Error::Config(format!("token_paths key {id:?} is not a token id")))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        if self.gateway_url.trim().is_empty() {
            return Err(Error::Config("GATEWAY_URL is empty".to_string()));
        }

        for (name, secs) in [
            ("timeouts.rpc_secs", self.timeouts.rpc_secs),
            ("timeouts.fetch_secs", self.timeouts.fetch_secs),
            ("timeouts.probe_secs", self.timeouts.probe_secs),
        ] {
            if secs == 0 {
                return Err(Error::Config(format!("{name} must be at least 1")));
            }
        }
        if self.auth.require_nonce && self.auth.nonce_ttl_secs == 0 {
            return Err(Error::Config("auth.nonce_ttl_secs must be at least 1".to_string()));
        }

        Ok(GateSettings {
            rpc_url,
            contract,
            docs_cid: docs_cid.trim().to_string(),
            gateway_url: self.gateway_url.trim().trim_end_matches('/').to_string(),
            docs_file: self
                .docs_file
                .as_deref()
                .map(|f| f.trim_matches('/').to_string())
                .filter(|f| !f.is_empty()),
            token_id,
            token_paths,
            mode: self.mode,
            discover_path: self.discover_path,
            allow_unsigned: self.auth.allow_unsigned,
            require_nonce: self.auth.require_nonce,
            nonce_ttl: Duration::from_secs(self.auth.nonce_ttl_secs),
            nonce_capacity: self.auth.nonce_capacity,
            rpc_timeout: Duration::from_secs(self.timeouts.rpc_secs),
            fetch_timeout: Duration::from_secs(self.timeouts.fetch_secs),
            probe_timeout: Duration::from_secs(self.timeouts.probe_secs),
        })
    }
}

/// Validated, immutable gate settings.
#[derive(Clone)]
pub struct GateSettings {
    /// JSON-RPC endpoint. Secret: not printed by `Debug`.
    pub rpc_url: String,
    /// NFT contract.
    pub contract: Address,
    /// Content identifier.
    pub docs_cid: String,
    /// Gateway base URL without trailing slash.
    pub gateway_url: String,
    /// Static file path inside the CID.
    pub docs_file: Option<String>,
    /// Default token id (ERC-1155 when set).
    pub token_id: Option<BigUint>,
    /// Per-token document paths.
    pub token_paths: BTreeMap<BigUint, String>,
    /// Response mode.
    pub mode: ResponseMode,
    /// Probe candidate paths.
    pub discover_path: bool,
    /// Accept unsigned address claims.
    pub allow_unsigned: bool,
    /// Require nonce binding in signed messages.
    pub require_nonce: bool,
    /// Nonce lifetime.
    pub nonce_ttl: Duration,
    /// Maximum outstanding nonces.
    pub nonce_capacity: usize,
    /// `eth_call` timeout.
    pub rpc_timeout: Duration,
    /// Document download timeout.
    pub fetch_timeout: Duration,
    /// Per-probe timeout.
    pub probe_timeout: Duration,
}

impl GateSettings {
    /// Whether `id` is a token id this gate serves.
    #[must_use]
    pub fn is_gated_token(&self, id: &BigUint) -> bool {
        self.token_id.as_ref() == Some(id) || self.token_paths.contains_key(id)
    }
}

impl std::fmt::Debug for GateSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateSettings")
            .field("rpc_url", &"<redacted>")
            .field("contract", &self.contract)
            .field("docs_cid", &self.docs_cid)
            .field("gateway_url", &self.gateway_url)
            .field("docs_file", &self.docs_file)
            .field("token_id", &self.token_id)
            .field("token_paths", &self.token_paths)
            .field("mode", &self.mode)
            .field("discover_path", &self.discover_path)
            .field("allow_unsigned", &self.allow_unsigned)
            .field("require_nonce", &self.require_nonce)
            .field("rpc_timeout", &self.rpc_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn complete() -> GateConfig {
        GateConfig {
            rpc_url: Some("https://rpc.example/v2/key".into()),
            contract_address: Some("0x1c1509ED7DF9eFB38C513089964C400380f8B704".into()),
            docs_cid: Some("bafybeigdyrzt".into()),
            ..GateConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = GateConfig::default();
        assert_eq!(config.gateway_url, DEFAULT_GATEWAY_URL);
        assert_eq!(config.mode, ResponseMode::Proxy);
        assert_eq!(config.timeouts.rpc_secs, 8);
        assert!(!config.auth.allow_unsigned);
        assert!(!config.auth.require_nonce);
    }

    #[test]
    fn test_missing_enumerates_all() {
        let err = GateConfig::default().validate().unwrap_err();
        match err {
            Error::MissingConfig(missing) => {
                assert_eq!(missing, vec!["RPC_URL", "NFT_CONTRACT", "DOCS_CID"]);
            }
            other => panic!("unexpected error: {other}"),
        }

        let partial = GateConfig {
            docs_cid: Some("   ".into()),
            ..complete()
        };
        assert_eq!(partial.missing(), vec!["DOCS_CID"]);
    }

    #[test]
    fn test_validate_complete() {
        let settings = complete().validate().unwrap();
        assert_eq!(
            settings.contract.to_string(),
            "0x1c1509ed7df9efb38c513089964c400380f8b704"
        );
        assert_eq!(settings.rpc_timeout, Duration::from_secs(8));
        assert!(settings.token_id.is_none());
        assert!(!format!("{settings:?}").contains("rpc.example"));
    }

    #[test]
    fn test_invalid_contract() {
        let config = GateConfig {
            contract_address: Some("0x1234".into()),
            ..complete()
        };
        assert!(matches!(config.validate().unwrap_err(), Error::Config(_)));
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let mut config = complete();
        config.timeouts.rpc_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(&err, Error::Config(msg) if msg.contains("rpc_secs")), "{err}");

        let mut config = complete();
        config.timeouts.probe_secs = 0;
        assert!(matches!(config.validate().unwrap_err(), Error::Config(_)));

        let mut config = complete();
        config.auth.require_nonce = true;
        config.auth.nonce_ttl_secs = 0;
        assert!(matches!(config.validate().unwrap_err(), Error::Config(_)));
    }

    #[test]
    fn test_token_settings() {
        let mut config = complete();
        config.token_id = Some("1".into());
        config.token_paths.insert("0x02".into(), "/tier2/guide.pdf".into());
        let settings = config.validate().unwrap();

        assert!(settings.is_gated_token(&BigUint::from(1u8)));
        assert!(settings.is_gated_token(&BigUint::from(2u8)));
        assert!(!settings.is_gated_token(&BigUint::from(3u8)));
        assert_eq!(settings.token_paths[&BigUint::from(2u8)], "tier2/guide.pdf");
    }

    #[test]
    fn test_toml_roundtrip_via_file() {
        let mut config = complete();
        config.mode = ResponseMode::Redirect;
        config.docs_file = Some("docs.pdf".into());

        let file = NamedTempFile::new().unwrap();
        config.to_file(file.path()).unwrap();
        let loaded = GateConfig::from_file(file.path()).unwrap();

        assert_eq!(loaded.mode, ResponseMode::Redirect);
        assert_eq!(loaded.docs_file.as_deref(), Some("docs.pdf"));
        assert_eq!(loaded.rpc_url, config.rpc_url);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: GateConfig = toml::from_str(
            r#"
            docs_cid = "bafy"
            mode = "redirect"

            [auth]
            require_nonce = true
            "#,
        )
        .unwrap();
        assert_eq!(config.mode, ResponseMode::Redirect);
        assert!(config.auth.require_nonce);
        assert_eq!(config.auth.nonce_ttl_secs, 300);
        assert_eq!(config.gateway_url, DEFAULT_GATEWAY_URL);
    }
}
