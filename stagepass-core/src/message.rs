use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::membership::ServiceKind;

/// One row of a node's merged membership view, exchanged during gossip and
/// served back to greeters. Field names are the wire contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipEntry {
    pub service: ServiceKind,
    pub address: String,
    pub primary: bool,
}

/// Body of `POST /greet`: the caller identifies itself by listening port,
/// its host is taken from the connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Greeting {
    pub port: u16,
}

/// Body of `POST /election`: the announcer declares itself the new primary,
/// identified by listening port plus the connection's remote host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
    pub port: u16,
}

/// Body of `POST /purchase/{eventid}`.
///
/// A front-end purchase carries no timestamp; the primary assigns one under
/// the Lamport lock and forwards the stamped copy to secondaries, which use
/// it to reject duplicate or out-of-order replication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRequest {
    pub uuid: Uuid,
    #[serde(rename = "eventid")]
    pub event_id: u64,
    #[serde(rename = "userid")]
    pub user_id: u64,
    pub tickets: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

/// Body of the user-account credit call, `POST {user}/{userid}/tickets/add`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditRequest {
    #[serde(rename = "eventid")]
    pub event_id: u64,
    pub tickets: i64,
}

/// Body of `POST /events`. A front-end creation carries no `eventid`; the
/// primary assigns the next id and forwards the completed body to
/// secondaries, which insert it as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    #[serde(rename = "eventname")]
    pub event_name: String,
    #[serde(rename = "userid")]
    pub user_id: u64,
    #[serde(rename = "numtickets")]
    pub num_tickets: i64,
    #[serde(rename = "eventid", skip_serializing_if = "Option::is_none")]
    pub event_id: Option<u64>,
}

/// Consistent read of one event's ledger state. Doubles as the backup
/// format a joining secondary restores from (`purchased` included).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSnapshot {
    #[serde(rename = "eventid")]
    pub event_id: u64,
    #[serde(rename = "eventname")]
    pub event_name: String,
    #[serde(rename = "userid")]
    pub user_id: u64,
    pub avail: i64,
    pub purchased: i64,
}
