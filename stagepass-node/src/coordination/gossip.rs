//! Gossip-based membership dissemination and failure detection.
//!
//! Full-state push-pull anti-entropy: every cycle this node greets every
//! event-service peer with its own address and merges back each peer's
//! complete membership view. Peers that fail the exchange are collected and
//! removed only after the whole cycle joins, so a removal cannot race a
//! concurrent greet task re-adding the same address. Losing the primary
//! turns the node into a candidate and resolves the election before the
//! loop resumes.

use std::sync::Arc;

use futures::future::join_all;
use stagepass_core::message::MembershipEntry;
use stagepass_core::role::NodeRole;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::coordination::election;
use crate::node_state::NodeState;

/// Periodic gossip loop; runs for the lifetime of the node. Cycles are
/// skipped while an election is in flight.
pub(crate) async fn run(state: Arc<NodeState>) {
    loop {
        if state.role().get() != NodeRole::Candidate {
            cycle(&state).await;
        }
        sleep(state.gossip_interval()).await;
    }
}

/// One gossip cycle: greet all peers, merge their views, then apply the
/// deferred removals.
pub(crate) async fn cycle(state: &Arc<NodeState>) {
    let members = state.event_peers().snapshot();
    let greets = members
        .into_iter()
        .filter(|peer| !state.is_self(peer))
        .map(|peer| {
            let state = state.clone();
            async move {
                debug!(peer = %peer, "starting gossip exchange");
                let view = state.client().greet(&peer, state.port()).await;
                (peer, view)
            }
        });

    let mut to_remove = Vec::new();
    for (peer, view) in join_all(greets).await {
        match view {
            Ok(entries) => merge(state, entries),
            Err(error) => {
                debug!(peer = %peer, %error, "gossip exchange failed");
                to_remove.push(peer);
            }
        }
    }

    for peer in to_remove {
        info!(peer = %peer, "removing unreachable peer from membership");
        state.event_peers().remove(&peer);

        // start an election if the removed peer was the primary
        if state.event_peers().primary().as_deref() == Some(peer.as_str()) {
            warn!(peer = %peer, "primary is unreachable, entering candidate state");
            state.role().set(NodeRole::Candidate);
            election::run(state).await;
        }
    }
}

/// Merge a peer's membership view into the local registries. Adds are
/// idempotent; the primary flag is not taken over from gossip, leadership
/// only changes through announcements.
fn merge(state: &Arc<NodeState>, entries: Vec<MembershipEntry>) {
    for entry in entries {
        if state.registry(entry.service).add(entry.address.clone()) {
            debug!(service = %entry.service, address = %entry.address, "learned peer via gossip");
        }
    }
}
