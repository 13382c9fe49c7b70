use std::{
    net::{IpAddr, SocketAddr},
    path::{Path, PathBuf},
    str::FromStr,
};

use alloy_primitives::B256;
use eyre::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::{
    builder::BuilderConfig,
    common::BlockInfo,
    engine::DEFAULT_AUTH_PORT,
    hardforks::{HardforkMilestone, HardforkSchedule},
};

/// Node configuration.
///
/// Layered, each source overriding the previous one: built in defaults, the TOML
/// config file, `TILLER_` prefixed environment variables, and the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Network preset selecting the default hard fork schedule and genesis
    pub network: String,
    /// Hard fork milestones layered over the network preset
    #[serde(default)]
    pub hardforks: Vec<HardforkMilestone>,
    /// Address the engine RPC server binds to
    pub rpc_addr: String,
    /// Port the engine RPC server binds to
    pub rpc_port: u16,
    /// Location of the chain database
    pub data_dir: PathBuf,
    /// Port of the Prometheus exporter; metrics are off when unset
    pub metrics_port: Option<u16>,
    /// Directory for daily rolling log files; file logging is off when unset
    pub log_dir: Option<PathBuf>,
    /// Payload build job timing
    #[serde(default)]
    pub builder: BuilderConfig,
    /// Genesis block, overriding the network preset
    pub genesis: Option<BlockInfo>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: "mainnet".to_string(),
            hardforks: Vec::new(),
            rpc_addr: "127.0.0.1".to_string(),
            rpc_port: DEFAULT_AUTH_PORT,
            data_dir: default_data_dir(),
            metrics_port: None,
            log_dir: None,
            builder: BuilderConfig::default(),
            genesis: None,
        }
    }
}

impl Config {
    /// Loads the configuration from `config_path`, the environment and `cli_config`.
    ///
    /// A missing config file is not an error.
    pub fn new(config_path: &Path, cli_config: CliConfig) -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("TILLER_").split("__"))
            .merge(cli_config.as_provider());

        Ok(figment.extract()?)
    }

    /// The engine RPC socket address.
    pub fn rpc_socket(&self) -> Result<SocketAddr> {
        let ip = IpAddr::from_str(&self.rpc_addr)
            .map_err(|e| eyre::eyre!("invalid rpc_addr {}: {}", self.rpc_addr, e))?;
        Ok(SocketAddr::new(ip, self.rpc_port))
    }

    /// The hard fork schedule: the network preset with configured overrides on top.
    ///
    /// Networks without a preset must configure every milestone themselves.
    pub fn schedule(&self) -> Result<HardforkSchedule> {
        match HardforkSchedule::for_network(&self.network) {
            Some(preset) => Ok(preset.with_overrides(self.hardforks.iter().cloned())),
            None if !self.hardforks.is_empty() => {
                Ok(HardforkSchedule::new(self.hardforks.iter().cloned()))
            }
            None => eyre::bail!(
                "network {} has no hard fork preset and none are configured",
                self.network
            ),
        }
    }

    /// The genesis block: the configured one, or the network preset's.
    pub fn genesis(&self) -> Result<BlockInfo> {
        if let Some(genesis) = self.genesis {
            return Ok(genesis);
        }

        let (hash, timestamp) = match self.network.to_ascii_lowercase().as_str() {
            "mainnet" => (
                "0xd4e56740f876aef8c010b86a40d5f56745a118d0906a34e69aec8c0db1cb8fa3",
                0,
            ),
            "sepolia" => (
                "0x25a5cc106eea7138acab33231d7160d69cb777ee0c2c553fcddf5138993e6dd9",
                1633267481,
            ),
            "holesky" => (
                "0xb5f7f912443c940f21fd611f12828d75b534364ed9e95ca4e307729a4661bde4",
                1695902400,
            ),
            _ => eyre::bail!(
                "network {} has no genesis preset and none is configured",
                self.network
            ),
        };

        Ok(BlockInfo::new(B256::from_str(hash)?, 0, B256::ZERO, timestamp))
    }
}

/// Command line overrides. Only values that were set are layered on top.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CliConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

impl CliConfig {
    pub fn as_provider(&self) -> Serialized<&Self> {
        Serialized::defaults(self)
    }
}

/// `~/.tiller/tiller.toml`
pub fn default_config_path() -> PathBuf {
    tiller_home().join("tiller.toml")
}

/// `~/.tiller/data`
pub fn default_data_dir() -> PathBuf {
    tiller_home().join("data")
}

fn tiller_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tiller")
}
