use std::time::Duration;

use anyhow::Result;
use stagepass_core::message::{
    Announcement, CreateEventRequest, CreditRequest, EventSnapshot, Greeting, MembershipEntry,
    PurchaseRequest,
};

/// Outbound HTTP surface towards peers and the user-account service.
///
/// One shared client with a bounded per-request timeout; a timeout, a
/// connection error and a non-success status are all the same outcome —
/// the peer is presumed dead.
#[derive(Debug, Clone)]
pub(crate) struct PeerClient {
    http: reqwest::Client,
}

impl PeerClient {
    pub(crate) fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    /// Election probe: "is anyone ranked at least as high as you alive?".
    /// A successful reply carries no payload, it only signals liveness.
    pub(crate) async fn probe(&self, peer: &str) -> bool {
        let url = format!("http://{}/election", peer);
        match self.http.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// Primary announcement towards one peer (event or front-end service).
    pub(crate) async fn announce(&self, peer: &str, own_port: u16) -> bool {
        let url = format!("http://{}/election", peer);
        match self
            .http
            .post(&url)
            .json(&Announcement { port: own_port })
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// Gossip exchange: send our listening port, get back the peer's full
    /// merged membership view.
    pub(crate) async fn greet(&self, peer: &str, own_port: u16) -> Result<Vec<MembershipEntry>> {
        let url = format!("http://{}/greet", peer);
        let resp = self
            .http
            .post(&url)
            .json(&Greeting { port: own_port })
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    /// Fire-and-forget replication of a timestamped purchase to a secondary.
    pub(crate) async fn replicate_purchase(&self, peer: &str, stamped: &PurchaseRequest) -> bool {
        let url = format!("http://{}/purchase/{}", peer, stamped.event_id);
        match self.http.post(&url).json(stamped).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// Fire-and-forget replication of an event creation to a secondary.
    pub(crate) async fn replicate_creation(&self, peer: &str, body: &CreateEventRequest) -> bool {
        let url = format!("http://{}/events", peer);
        match self.http.post(&url).json(body).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// Synchronous credit of purchased tickets to the user's account.
    /// Anything but success means the purchase must be rolled back.
    pub(crate) async fn credit_user(
        &self,
        user_service: &str,
        user_id: u64,
        body: &CreditRequest,
    ) -> bool {
        let url = format!("http://{}/{}/tickets/add", user_service, user_id);
        match self.http.post(&url).json(body).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// Full ledger snapshot from a peer, used by a joining secondary to
    /// bootstrap its event store from the primary.
    pub(crate) async fn fetch_ledger(&self, peer: &str) -> Result<Vec<EventSnapshot>> {
        let url = format!("http://{}/events", peer);
        let resp = self.http.get(&url).send().await?.error_for_status()?;
        Ok(resp.json().await?)
    }
}
