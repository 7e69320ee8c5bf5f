use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Configuration settings loaded from the config file.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct LoadConfiguration {
    /// Stagepass cluster name
    pub(crate) cluster_name: String,
    /// This node's listening address
    pub(crate) node: NodeConfig,
    /// Initial peer lists, merged into the registries on boot
    #[serde(default)]
    pub(crate) seeds: SeedConfig,
    /// User-account service address (`host:port`) for ticket credits
    pub(crate) user_service_addr: String,
    /// Gossip cycle interval in seconds (default 10)
    pub(crate) gossip_interval_secs: Option<u64>,
    /// Election retry backoff in seconds (default 3)
    pub(crate) election_backoff_secs: Option<u64>,
    /// Outbound peer call timeout in milliseconds (default 3000)
    pub(crate) request_timeout_ms: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct NodeConfig {
    /// Hostname or IP address this node listens on and advertises to peers
    pub(crate) host: String,
    /// Listening port
    pub(crate) port: u16,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct SeedConfig {
    /// Known event-service peers (`host:port`)
    #[serde(default)]
    pub(crate) event_services: Vec<String>,
    /// Known front-end-service peers (`host:port`)
    #[serde(default)]
    pub(crate) frontend_services: Vec<String>,
}

/// Validated runtime configuration of the node.
#[derive(Debug, Clone)]
pub(crate) struct ServiceConfiguration {
    pub(crate) cluster_name: String,
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) event_seeds: Vec<String>,
    pub(crate) frontend_seeds: Vec<String>,
    pub(crate) user_service_addr: String,
    pub(crate) gossip_interval: Duration,
    pub(crate) election_backoff: Duration,
    pub(crate) request_timeout: Duration,
}

impl ServiceConfiguration {
    /// The address this node advertises to peers; also its election rank key.
    pub(crate) fn advertised_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Implementing the TryFrom trait to transform LoadConfiguration into ServiceConfiguration
impl TryFrom<LoadConfiguration> for ServiceConfiguration {
    type Error = anyhow::Error;

    fn try_from(config: LoadConfiguration) -> Result<Self> {
        if config.cluster_name.is_empty() {
            return Err(anyhow!("cluster_name must not be empty"));
        }
        if config.node.host.is_empty() {
            return Err(anyhow!("node.host must not be empty"));
        }
        if config.node.port == 0 {
            return Err(anyhow!("node.port must not be 0"));
        }
        if config.user_service_addr.is_empty() {
            return Err(anyhow!("user_service_addr must not be empty"));
        }

        let gossip_interval = Duration::from_secs(config.gossip_interval_secs.unwrap_or(10));
        let election_backoff = Duration::from_secs(config.election_backoff_secs.unwrap_or(3));
        let request_timeout = Duration::from_millis(config.request_timeout_ms.unwrap_or(3000));
        if gossip_interval.is_zero() || election_backoff.is_zero() || request_timeout.is_zero() {
            return Err(anyhow!("intervals and timeouts must be greater than zero"));
        }

        Ok(ServiceConfiguration {
            cluster_name: config.cluster_name,
            host: config.node.host,
            port: config.node.port,
            event_seeds: config.seeds.event_services,
            frontend_seeds: config.seeds.frontend_services,
            user_service_addr: config.user_service_addr,
            gossip_interval,
            election_backoff,
            request_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_load_with_defaults() {
        let yaml = r#"
cluster_name: stagepass-local
node:
  host: 127.0.0.1
  port: 4000
user_service_addr: 127.0.0.1:9090
"#;
        let load: LoadConfiguration = serde_yaml::from_str(yaml).unwrap();
        let config: ServiceConfiguration = load.try_into().unwrap();
        assert_eq!(config.advertised_addr(), "127.0.0.1:4000");
        assert_eq!(config.gossip_interval, Duration::from_secs(10));
        assert_eq!(config.election_backoff, Duration::from_secs(3));
        assert_eq!(config.request_timeout, Duration::from_millis(3000));
        assert!(config.event_seeds.is_empty());
    }

    #[test]
    fn yaml_load_with_seeds_and_overridden_intervals() {
        let yaml = r#"
cluster_name: stagepass-local
node:
  host: 127.0.0.1
  port: 4000
seeds:
  event_services:
    - 127.0.0.1:4001
    - 127.0.0.1:4002
  frontend_services:
    - 127.0.0.1:8080
user_service_addr: 127.0.0.1:9090
gossip_interval_secs: 2
election_backoff_secs: 1
request_timeout_ms: 500
"#;
        let load: LoadConfiguration = serde_yaml::from_str(yaml).unwrap();
        let config: ServiceConfiguration = load.try_into().unwrap();
        assert_eq!(config.event_seeds.len(), 2);
        assert_eq!(config.frontend_seeds.len(), 1);
        assert_eq!(config.gossip_interval, Duration::from_secs(2));
        assert_eq!(config.request_timeout, Duration::from_millis(500));
    }

    #[test]
    fn rejects_zero_port() {
        let yaml = r#"
cluster_name: stagepass-local
node:
  host: 127.0.0.1
  port: 0
user_service_addr: 127.0.0.1:9090
"#;
        let load: LoadConfiguration = serde_yaml::from_str(yaml).unwrap();
        let result: Result<ServiceConfiguration> = load.try_into();
        assert!(result.is_err());
    }
}
