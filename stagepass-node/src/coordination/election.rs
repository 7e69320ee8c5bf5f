//! Bully leader election.
//!
//! Rank is the address's position in the sorted membership snapshot; the
//! highest-ranked live node wins. A node that finds no live peer above
//! itself self-promotes and announces; otherwise it waits for the winner's
//! announcement, retrying after a fixed backoff while still a candidate.

use std::sync::Arc;

use futures::future::join_all;
use stagepass_core::membership::ServiceKind;
use stagepass_core::role::NodeRole;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::node_state::NodeState;

/// Enter the candidate state and run an election in the background, unless
/// one is already in progress on this node.
pub(crate) fn trigger(state: &Arc<NodeState>) {
    if state.role().begin_candidacy() {
        info!("entering candidate state");
        let state = state.clone();
        tokio::spawn(async move {
            run(&state).await;
        });
    }
}

/// Drive one election to completion. The caller must have put the node into
/// the candidate state; on return the role is PRIMARY or SECONDARY.
pub(crate) async fn run(state: &Arc<NodeState>) {
    loop {
        let members = state.event_peers().snapshot();
        let higher: Vec<String> = members
            .into_iter()
            .filter(|peer| peer.as_str() > state.self_addr())
            .collect();

        // no service ranks higher, so this node gets to be the new primary
        if higher.is_empty() {
            promote(state);
            return;
        }

        // probe every higher-ranked peer concurrently and join all results
        let probes = higher.into_iter().map(|peer| {
            let state = state.clone();
            async move {
                debug!(peer = %peer, "sending election probe");
                let alive = state.client().probe(&peer).await;
                (peer, alive)
            }
        });

        let mut replied = false;
        for (peer, alive) in join_all(probes).await {
            if alive {
                debug!(peer = %peer, "peer with higher rank replied");
                replied = true;
            } else {
                warn!(peer = %peer, "no reply from peer, removing from membership");
                state.event_peers().remove(&peer);
            }
        }

        if !replied {
            promote(state);
            return;
        }

        // a higher-ranked peer is alive; wait for its announcement, retry
        // if still a candidate after the backoff
        sleep(state.election_backoff()).await;
        if state.role().get() != NodeRole::Candidate {
            return;
        }
        debug!("no announcement received, retrying election");
    }
}

/// Become the primary and announce it to every other known service. The
/// announcements are fire-and-forget: delivery is never waited on, and an
/// unreachable target is dropped from its registry.
fn promote(state: &Arc<NodeState>) {
    info!("no higher-ranked peer alive, promoting to primary");
    state.role().set(NodeRole::Primary);
    state.event_peers().set_primary(state.self_addr());

    announce_to(state, ServiceKind::Event);
    announce_to(state, ServiceKind::FrontEnd);
}

fn announce_to(state: &Arc<NodeState>, kind: ServiceKind) {
    for peer in state.registry(kind).snapshot() {
        if state.is_self(&peer) {
            continue;
        }
        debug!(peer = %peer, service = %kind, "sending primary announcement");
        let state = state.clone();
        tokio::spawn(async move {
            if !state.client().announce(&peer, state.port()).await {
                warn!(peer = %peer, service = %kind, "announcement failed, removing from membership");
                state.registry(kind).remove(&peer);
            }
        });
    }
}
