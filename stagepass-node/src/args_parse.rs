use clap::Parser;

/// Command-line arguments. Anything given here overrides the config file.
#[derive(Parser, Debug)]
#[command(name = "stagepass-node", about = "Stagepass event-ticketing service node")]
pub(crate) struct Args {
    /// Path to the YAML config file
    #[arg(long)]
    pub(crate) config_file: String,

    /// Listening host, overrides `node.host`
    #[arg(long)]
    pub(crate) host: Option<String>,

    /// Listening port, overrides `node.port`
    #[arg(long)]
    pub(crate) port: Option<u16>,

    /// User-account service address, overrides `user_service_addr`
    #[arg(long)]
    pub(crate) user_service_addr: Option<String>,

    /// Comma-separated event-service seed addresses, overrides `seeds.event_services`
    #[arg(long)]
    pub(crate) seed_nodes: Option<String>,
}

impl Args {
    pub(crate) fn seed_list(&self) -> Option<Vec<String>> {
        self.seed_nodes.as_ref().map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|addr| !addr.is_empty())
                .map(str::to_owned)
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_list_splits_and_trims() {
        let args = Args::parse_from([
            "stagepass-node",
            "--config-file",
            "node.yml",
            "--seed-nodes",
            "127.0.0.1:4001, 127.0.0.1:4002,",
        ]);
        assert_eq!(
            args.seed_list().unwrap(),
            vec!["127.0.0.1:4001", "127.0.0.1:4002"]
        );
    }
}
