//! Purchase acceptance and primary/secondary replication.
//!
//! On the primary, every purchase is serialized behind the Lamport clock's
//! exclusive lock: apply to the ledger, credit the user account, assign the
//! timestamp, then fan the stamped operation out to the secondaries without
//! waiting for delivery. A failed credit is compensated before the lock is
//! released, so a rejection never leaves a partial effect. On a secondary
//! the same endpoint applies replicated purchases keyed by the carried
//! timestamp.

use std::sync::Arc;

use stagepass_core::errors::{PurchaseError, Result};
use stagepass_core::ledger::ReplicaOutcome;
use stagepass_core::message::{CreateEventRequest, CreditRequest, EventSnapshot, PurchaseRequest};
use stagepass_core::role::NodeRole;
use tracing::{debug, info, warn};

use crate::node_state::NodeState;

/// Handle `POST /purchase/{event_id}`. Dispatches on the node's current
/// role: a primary accepts and orders the purchase, a secondary applies a
/// replicated one.
pub(crate) async fn handle_purchase(
    state: &Arc<NodeState>,
    path_event_id: u64,
    request: PurchaseRequest,
) -> Result<()> {
    if request.event_id != path_event_id {
        return Err(PurchaseError::InvalidRequest(format!(
            "event id mismatch between path ({}) and body ({})",
            path_event_id, request.event_id
        )));
    }
    if request.tickets <= 0 {
        return Err(PurchaseError::InvalidRequest(
            "tickets must be positive".into(),
        ));
    }

    match state.role().get() {
        NodeRole::Primary => accept(state, request).await,
        _ => apply_replica(state, request),
    }
}

/// Primary path: ledger apply, user credit, timestamp assignment and
/// replication fan-out, all under the clock's write lock.
async fn accept(state: &Arc<NodeState>, request: PurchaseRequest) -> Result<()> {
    let event = state
        .events()
        .get(request.event_id)
        .ok_or(PurchaseError::EventNotFound(request.event_id))?;

    // serializes purchase acceptance cluster-wide; held across the credit
    // call so the assigned timestamps follow the commit order
    let mut clock = state.clock().lock().await;

    if !event.purchase(request.tickets) {
        return Err(PurchaseError::InsufficientTickets {
            event_id: request.event_id,
            delta: request.tickets,
        });
    }

    let credited = state
        .client()
        .credit_user(
            state.user_service_addr(),
            request.user_id,
            &CreditRequest {
                event_id: request.event_id,
                tickets: request.tickets,
            },
        )
        .await;

    if !credited {
        // compensate before releasing the clock; the counter never advanced
        warn!(event_id = request.event_id, uuid = %request.uuid, "credit rejected, rolling back purchase");
        event.purchase(-request.tickets);
        return Err(PurchaseError::CreditRejected);
    }

    let timestamp = clock.assign();
    info!(
        event_id = request.event_id,
        uuid = %request.uuid,
        tickets = request.tickets,
        timestamp,
        "purchase accepted"
    );

    let stamped = PurchaseRequest {
        timestamp: Some(timestamp),
        ..request
    };
    fan_out_purchase(state, stamped);
    Ok(())
}

/// Secondary path: apply a purchase the primary already ordered. The
/// carried timestamp guards against duplicate and out-of-order delivery;
/// replays are dropped without an error so the sender never retries.
fn apply_replica(state: &Arc<NodeState>, request: PurchaseRequest) -> Result<()> {
    let timestamp = request.timestamp.ok_or(PurchaseError::NotPrimary)?;
    let event = state
        .events()
        .get(request.event_id)
        .ok_or(PurchaseError::EventNotFound(request.event_id))?;

    match event.apply_replicated(request.uuid, request.tickets, timestamp) {
        ReplicaOutcome::Applied => {
            debug!(event_id = request.event_id, uuid = %request.uuid, timestamp, "replicated purchase applied");
            Ok(())
        }
        ReplicaOutcome::Duplicate | ReplicaOutcome::Stale => {
            debug!(event_id = request.event_id, uuid = %request.uuid, timestamp, "replicated purchase already covered, dropped");
            Ok(())
        }
        ReplicaOutcome::Rejected => Err(PurchaseError::InsufficientTickets {
            event_id: request.event_id,
            delta: request.tickets,
        }),
    }
}

/// Fire-and-forget fan-out of a stamped purchase to every other event
/// service. No acknowledgment, no retry: a missed delta stays missing until
/// the secondary's next ledger bootstrap.
fn fan_out_purchase(state: &Arc<NodeState>, stamped: PurchaseRequest) {
    for peer in state.event_peers().snapshot() {
        if state.is_self(&peer) {
            continue;
        }
        let state = state.clone();
        let stamped = stamped.clone();
        tokio::spawn(async move {
            if !state.client().replicate_purchase(&peer, &stamped).await {
                debug!(peer = %peer, uuid = %stamped.uuid, "replication delivery dropped");
            }
        });
    }
}

/// Handle `POST /events`. A body without an event id is a client creation,
/// only valid on the primary, which assigns the id and replicates the
/// completed body. A body carrying an id is the internal replica variant.
pub(crate) fn handle_create(
    state: &Arc<NodeState>,
    request: CreateEventRequest,
) -> Result<EventSnapshot> {
    if request.event_name.trim().is_empty() {
        return Err(PurchaseError::InvalidRequest(
            "eventname must not be empty".into(),
        ));
    }
    if request.num_tickets <= 0 {
        return Err(PurchaseError::InvalidRequest(
            "numtickets must be positive".into(),
        ));
    }

    match request.event_id {
        Some(event_id) => {
            // replicated creation with the id the primary assigned
            state.events().insert_replica(
                event_id,
                request.event_name.clone(),
                request.user_id,
                request.num_tickets,
            );
            let event = state
                .events()
                .get(event_id)
                .ok_or(PurchaseError::EventNotFound(event_id))?;
            Ok(event.snapshot())
        }
        None => {
            if state.role().get() != NodeRole::Primary {
                return Err(PurchaseError::NotPrimary);
            }
            let event =
                state
                    .events()
                    .create(request.event_name.clone(), request.user_id, request.num_tickets);
            info!(event_id = event.event_id(), name = %request.event_name, "event created");

            let replica_body = CreateEventRequest {
                event_id: Some(event.event_id()),
                ..request
            };
            fan_out_creation(state, replica_body);
            Ok(event.snapshot())
        }
    }
}

fn fan_out_creation(state: &Arc<NodeState>, body: CreateEventRequest) {
    for peer in state.event_peers().snapshot() {
        if state.is_self(&peer) {
            continue;
        }
        let state = state.clone();
        let body = body.clone();
        tokio::spawn(async move {
            if !state.client().replicate_creation(&peer, &body).await {
                debug!(peer = %peer, "event creation replication dropped");
            }
        });
    }
}

/// Bootstrap the ledger from the current primary. Runs once after the
/// startup election: a node that came up as a secondary with an empty store
/// restores the primary's full event list, `purchased` counters included.
pub(crate) async fn sync_ledger_from_primary(state: &Arc<NodeState>) {
    if state.role().get() != NodeRole::Secondary || !state.events().is_empty() {
        return;
    }
    let Some(primary) = state.event_peers().primary() else {
        return;
    };
    if state.is_self(&primary) {
        return;
    }

    match state.client().fetch_ledger(&primary).await {
        Ok(snapshots) => {
            let restored = snapshots
                .iter()
                .filter(|snap| state.events().restore(snap))
                .count();
            info!(primary = %primary, restored, "ledger bootstrapped from primary");
        }
        Err(error) => {
            warn!(primary = %primary, %error, "ledger bootstrap failed, starting empty");
        }
    }
}
