use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use eyre::Result;

use tiller::{
    backend::Database,
    builder::EmptyPayloadBuilder,
    config::{default_config_path, CliConfig, Config},
    forkchoice::ForkchoiceEngine,
    rpc, telemetry,
    version::Version,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    let config = cli.to_config()?;

    let _guard = telemetry::init(verbose, config.log_dir.as_deref())?;
    let mut shutdown = telemetry::register_shutdown()?;
    if let Some(port) = config.metrics_port {
        telemetry::init_metrics(port)?;
    }

    tracing::info!(target: "tiller", "starting {} on {}", Version::build(), config.network);

    let schedule = config.schedule()?;
    for milestone in schedule.milestones() {
        tracing::debug!(target: "tiller", "{} at timestamp {}", milestone.name, milestone.timestamp);
    }

    let db = Database::new(&config.data_dir)?;
    let heads = db.init_genesis(config.genesis()?)?;
    tracing::info!(target: "tiller", head = %heads.head.hash, number = heads.head.number, "loaded canonical head");

    let engine = Arc::new(ForkchoiceEngine::new(
        Arc::new(db.clone()),
        Arc::new(schedule),
        Arc::new(EmptyPayloadBuilder),
        config.builder,
    )?);
    let (_, handle) = rpc::run_server(config.rpc_socket()?, engine).await?;

    while !*shutdown.borrow() {
        if shutdown.changed().await.is_err() {
            break;
        }
    }

    handle.stop()?;
    handle.stopped().await;
    db.flush_async().await?;
    Ok(())
}

#[derive(Parser)]
#[clap(version, about = "Execution layer fork choice handler")]
pub struct Cli {
    /// Network preset: mainnet, sepolia, holesky or devnet
    #[clap(short, long, env = "TILLER_NETWORK")]
    network: Option<String>,
    /// Path of the TOML config file
    #[clap(short, long)]
    config: Option<PathBuf>,
    #[clap(long)]
    data_dir: Option<PathBuf>,
    #[clap(long)]
    rpc_addr: Option<String>,
    #[clap(long)]
    rpc_port: Option<u16>,
    #[clap(long)]
    metrics_port: Option<u16>,
    #[clap(long)]
    log_dir: Option<PathBuf>,
    #[clap(short, long)]
    verbose: bool,
}

impl Cli {
    pub fn to_config(self) -> Result<Config> {
        let config_path = self.config.clone().unwrap_or_else(default_config_path);
        let cli_config = CliConfig {
            network: self.network,
            rpc_addr: self.rpc_addr,
            rpc_port: self.rpc_port,
            data_dir: self.data_dir,
            metrics_port: self.metrics_port,
            log_dir: self.log_dir,
        };

        Config::new(&config_path, cli_config)
    }
}
