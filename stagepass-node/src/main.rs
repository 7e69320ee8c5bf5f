mod args_parse;
mod coordination;
mod node_state;
mod peer_client;
mod replication;
mod server;
mod service_configuration;


use std::fs::read_to_string;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::args_parse::Args;
use crate::coordination::{election, gossip};
use crate::node_state::NodeState;
use crate::service_configuration::{LoadConfiguration, ServiceConfiguration};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    // Load the configuration from the specified YAML file
    let config_content = read_to_string(Path::new(&args.config_file))
        .context(format!("Failed to read config file: {}", args.config_file))?;
    let load_config: LoadConfiguration = serde_yaml::from_str(&config_content)?;
    let mut service_config: ServiceConfiguration = load_config.try_into()?;

    // Command-line arguments override the values from the config file
    if let Some(host) = args.host.clone() {
        service_config.host = host;
    }
    if let Some(port) = args.port {
        service_config.port = port;
    }
    if let Some(user_service_addr) = args.user_service_addr.clone() {
        service_config.user_service_addr = user_service_addr;
    }
    if let Some(seeds) = args.seed_list() {
        service_config.event_seeds = seeds;
    }

    let state = NodeState::new(&service_config)?;
    info!(
        cluster = %state.cluster_name(),
        addr = %state.self_addr(),
        "starting stagepass event-service node"
    );

    let listener = TcpListener::bind(state.self_addr())
        .await
        .context(format!("Failed to bind to {}", state.self_addr()))?;

    let server_handle = tokio::spawn(server::serve(state.clone(), listener));
    tokio::spawn(gossip::run(state.clone()));

    // Resolve leadership before serving purchases: standing alone this node
    // self-promotes, joining a cluster it ends up secondary to the
    // highest-ranked live peer.
    state.role().begin_candidacy();
    election::run(&state).await;

    // A fresh secondary pulls the full ledger from the primary it just found.
    replication::sync_ledger_from_primary(&state).await;

    server_handle.await??;
    Ok(())
}
