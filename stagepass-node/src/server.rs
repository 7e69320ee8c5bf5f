//! HTTP surface of the node: the peer-facing election and gossip endpoints
//! plus the event and purchase API.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use stagepass_core::errors::PurchaseError;
use stagepass_core::message::{Announcement, CreateEventRequest, Greeting, PurchaseRequest};
use stagepass_core::role::NodeRole;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::coordination::election;
use crate::node_state::NodeState;
use crate::replication;

pub(crate) fn router(state: Arc<NodeState>) -> Router {
    Router::new()
        .route("/election", get(election_probe).post(election_announce))
        .route("/greet", post(greet))
        .route("/purchase/:event_id", post(purchase))
        .route("/events", post(create_event).get(list_events))
        .route("/events/:event_id", get(get_event))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub(crate) async fn serve(state: Arc<NodeState>, listener: TcpListener) -> anyhow::Result<()> {
    let app = router(state);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

/// GET /election — a lower-ranked peer asks whether anyone senior is alive.
/// The reply itself is the answer; if this node is not already running an
/// election it starts its own, so leadership resolves upwards.
async fn election_probe(State(state): State<Arc<NodeState>>) -> StatusCode {
    election::trigger(&state);
    StatusCode::OK
}

/// POST /election — a peer announces itself as the new primary.
async fn election_announce(
    State(state): State<Arc<NodeState>>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    Json(body): Json<Announcement>,
) -> StatusCode {
    let primary = format!("{}:{}", remote.ip(), body.port);
    info!(primary = %primary, "received primary announcement, becoming secondary");
    state.event_peers().set_primary(primary);
    state.role().set(NodeRole::Secondary);
    StatusCode::OK
}

/// POST /greet — gossip exchange: register the caller and hand back this
/// node's full merged membership view.
async fn greet(
    State(state): State<Arc<NodeState>>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    Json(body): Json<Greeting>,
) -> impl IntoResponse {
    let caller = format!("{}:{}", remote.ip(), body.port);
    state.event_peers().add(caller);

    let mut view = state.event_peers().view();
    view.extend(state.frontend_peers().view());
    Json(view)
}

/// POST /purchase/{event_id} — purchase acceptance on the primary,
/// replicated apply on a secondary.
async fn purchase(
    State(state): State<Arc<NodeState>>,
    Path(event_id): Path<u64>,
    Json(body): Json<PurchaseRequest>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    replication::handle_purchase(&state, event_id, body)
        .await
        .map(|()| StatusCode::OK)
        .map_err(map_error)
}

/// POST /events — event creation on the primary, replica insert elsewhere.
async fn create_event(
    State(state): State<Arc<NodeState>>,
    Json(body): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    replication::handle_create(&state, body)
        .map(Json)
        .map_err(map_error)
}

/// GET /events — full ledger snapshot; also the backup format a joining
/// secondary restores from.
async fn list_events(State(state): State<Arc<NodeState>>) -> impl IntoResponse {
    Json(state.events().snapshot_all())
}

/// GET /events/{event_id}
async fn get_event(
    State(state): State<Arc<NodeState>>,
    Path(event_id): Path<u64>,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    match state.events().get(event_id) {
        Some(event) => Ok(Json(event.snapshot())),
        None => Err(map_error(PurchaseError::EventNotFound(event_id))),
    }
}

fn map_error(err: PurchaseError) -> (StatusCode, Json<Value>) {
    let status = match err {
        PurchaseError::EventNotFound(_) => StatusCode::NOT_FOUND,
        PurchaseError::InvalidRequest(_)
        | PurchaseError::InsufficientTickets { .. }
        | PurchaseError::NotPrimary
        | PurchaseError::CreditRejected => StatusCode::BAD_REQUEST,
    };
    (status, Json(serde_json::json!({ "error": err.to_string() })))
}
