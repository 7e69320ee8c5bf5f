use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use stagepass_core::clock::LamportClock;
use stagepass_core::ledger::EventStore;
use stagepass_core::membership::{ServiceKind, ServiceRegistry};
use stagepass_core::role::{NodeRole, RoleCell};

use crate::peer_client::PeerClient;
use crate::service_configuration::ServiceConfiguration;

/// Shared context of one node, constructed once at startup and passed by
/// `Arc` into every component: the HTTP handlers, the gossip loop, the
/// election coordinator and the replication path.
#[derive(Debug)]
pub(crate) struct NodeState {
    cluster_name: String,
    self_addr: String,
    port: u16,
    role: RoleCell,
    event_peers: ServiceRegistry,
    frontend_peers: ServiceRegistry,
    events: EventStore,
    clock: LamportClock,
    user_service_addr: String,
    client: PeerClient,
    gossip_interval: Duration,
    election_backoff: Duration,
}

impl NodeState {
    pub(crate) fn new(config: &ServiceConfiguration) -> Result<Arc<Self>> {
        let event_peers = ServiceRegistry::new(ServiceKind::Event);
        let frontend_peers = ServiceRegistry::new(ServiceKind::FrontEnd);

        // the node is always a member of its own event-service registry
        let self_addr = config.advertised_addr();
        event_peers.add(self_addr.clone());
        for seed in &config.event_seeds {
            event_peers.add(seed.clone());
        }
        for seed in &config.frontend_seeds {
            frontend_peers.add(seed.clone());
        }

        Ok(Arc::new(Self {
            cluster_name: config.cluster_name.clone(),
            self_addr,
            port: config.port,
            role: RoleCell::new(NodeRole::Secondary),
            event_peers,
            frontend_peers,
            events: EventStore::new(),
            clock: LamportClock::new(),
            user_service_addr: config.user_service_addr.clone(),
            client: PeerClient::new(config.request_timeout)?,
            gossip_interval: config.gossip_interval,
            election_backoff: config.election_backoff,
        }))
    }

    pub(crate) fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    pub(crate) fn self_addr(&self) -> &str {
        &self.self_addr
    }

    pub(crate) fn port(&self) -> u16 {
        self.port
    }

    pub(crate) fn is_self(&self, addr: &str) -> bool {
        self.self_addr == addr
    }

    pub(crate) fn role(&self) -> &RoleCell {
        &self.role
    }

    pub(crate) fn event_peers(&self) -> &ServiceRegistry {
        &self.event_peers
    }

    pub(crate) fn frontend_peers(&self) -> &ServiceRegistry {
        &self.frontend_peers
    }

    pub(crate) fn registry(&self, kind: ServiceKind) -> &ServiceRegistry {
        match kind {
            ServiceKind::Event => &self.event_peers,
            ServiceKind::FrontEnd => &self.frontend_peers,
        }
    }

    pub(crate) fn events(&self) -> &EventStore {
        &self.events
    }

    pub(crate) fn clock(&self) -> &LamportClock {
        &self.clock
    }

    pub(crate) fn user_service_addr(&self) -> &str {
        &self.user_service_addr
    }

    pub(crate) fn client(&self) -> &PeerClient {
        &self.client
    }

    pub(crate) fn gossip_interval(&self) -> Duration {
        self.gossip_interval
    }

    pub(crate) fn election_backoff(&self) -> Duration {
        self.election_backoff
    }
}
