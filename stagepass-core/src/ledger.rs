use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use uuid::Uuid;

use crate::message::EventSnapshot;

/// Outcome of applying a replicated purchase on a secondary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicaOutcome {
    /// Delta applied, last-applied marker advanced.
    Applied,
    /// Same uuid as the last applied operation: already done, no-op.
    Duplicate,
    /// Timestamp not newer than the last applied one: dropped.
    Stale,
    /// Delta would violate the ledger invariant: dropped.
    Rejected,
}

#[derive(Debug)]
struct Counters {
    avail: i64,
    purchased: i64,
    /// Timestamp and uuid of the last replicated purchase applied here.
    /// Guards a secondary against duplicate or out-of-order replication.
    last_applied: Option<(u64, Uuid)>,
}

/// One event's ticket inventory. Immutable identity plus counters under an
/// exclusive lock; `avail + purchased == total` holds after every mutation.
#[derive(Debug)]
pub struct TicketEvent {
    event_id: u64,
    event_name: String,
    user_id: u64,
    total: i64,
    counters: RwLock<Counters>,
}

impl TicketEvent {
    pub fn new(event_id: u64, event_name: impl Into<String>, user_id: u64, total: i64) -> Self {
        Self {
            event_id,
            event_name: event_name.into(),
            user_id,
            total,
            counters: RwLock::new(Counters {
                avail: total,
                purchased: 0,
                last_applied: None,
            }),
        }
    }

    /// Rebuild an event from a backup snapshot, `purchased` seed included.
    pub fn from_snapshot(snap: &EventSnapshot) -> Self {
        let total = snap.avail + snap.purchased;
        Self {
            event_id: snap.event_id,
            event_name: snap.event_name.clone(),
            user_id: snap.user_id,
            total,
            counters: RwLock::new(Counters {
                avail: snap.avail,
                purchased: snap.purchased,
                last_applied: None,
            }),
        }
    }

    pub fn event_id(&self) -> u64 {
        self.event_id
    }

    /// Atomic check-and-update. Positive delta is a purchase, negative is a
    /// rollback; both counters must stay non-negative for it to apply.
    pub fn purchase(&self, delta: i64) -> bool {
        let mut counters = self.counters.write().unwrap();
        if counters.avail - delta >= 0 && counters.purchased + delta >= 0 {
            counters.avail -= delta;
            counters.purchased += delta;
            true
        } else {
            false
        }
    }

    /// Secondary-side apply of a replicated purchase, keyed by the timestamp
    /// the primary assigned. Replays with a timestamp not beyond the last
    /// applied one never mutate the counters.
    pub fn apply_replicated(&self, uuid: Uuid, delta: i64, timestamp: u64) -> ReplicaOutcome {
        let mut counters = self.counters.write().unwrap();
        if let Some((last_ts, last_uuid)) = counters.last_applied {
            if timestamp <= last_ts {
                return if uuid == last_uuid {
                    ReplicaOutcome::Duplicate
                } else {
                    ReplicaOutcome::Stale
                };
            }
        }
        if counters.avail - delta >= 0 && counters.purchased + delta >= 0 {
            counters.avail -= delta;
            counters.purchased += delta;
            counters.last_applied = Some((timestamp, uuid));
            ReplicaOutcome::Applied
        } else {
            ReplicaOutcome::Rejected
        }
    }

    /// Consistent read of the ledger state for serialization.
    pub fn snapshot(&self) -> EventSnapshot {
        let counters = self.counters.read().unwrap();
        EventSnapshot {
            event_id: self.event_id,
            event_name: self.event_name.clone(),
            user_id: self.user_id,
            avail: counters.avail,
            purchased: counters.purchased,
        }
    }
}

/// All events known to this node. Cross-event purchases never contend: the
/// map shards access and each event carries its own lock.
#[derive(Debug, Default)]
pub struct EventStore {
    events: DashMap<u64, Arc<TicketEvent>>,
    next_id: AtomicU64,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Primary-side creation: assigns the next event id.
    pub fn create(&self, event_name: impl Into<String>, user_id: u64, total: i64) -> Arc<TicketEvent> {
        let event_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let event = Arc::new(TicketEvent::new(event_id, event_name, user_id, total));
        self.events.insert(event_id, event.clone());
        event
    }

    /// Secondary-side creation with the id the primary assigned. Returns
    /// `false` if the id already exists (duplicate replication).
    pub fn insert_replica(
        &self,
        event_id: u64,
        event_name: impl Into<String>,
        user_id: u64,
        total: i64,
    ) -> bool {
        self.bump_next_id(event_id);
        match self.events.entry(event_id) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(Arc::new(TicketEvent::new(event_id, event_name, user_id, total)));
                true
            }
        }
    }

    /// Restore one event from a backup snapshot, skipping ids already known.
    pub fn restore(&self, snap: &EventSnapshot) -> bool {
        self.bump_next_id(snap.event_id);
        match self.events.entry(snap.event_id) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(Arc::new(TicketEvent::from_snapshot(snap)));
                true
            }
        }
    }

    pub fn get(&self, event_id: u64) -> Option<Arc<TicketEvent>> {
        self.events.get(&event_id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Ledger snapshot of every event, ordered by id. Serves listings and
    /// the backup pull a joining secondary performs.
    pub fn snapshot_all(&self) -> Vec<EventSnapshot> {
        let mut snaps: Vec<EventSnapshot> = self
            .events
            .iter()
            .map(|entry| entry.value().snapshot())
            .collect();
        snaps.sort_by_key(|snap| snap.event_id);
        snaps
    }

    // Keep local id assignment ahead of any id learned from the primary.
    fn bump_next_id(&self, seen: u64) {
        self.next_id.fetch_max(seen + 1, Ordering::SeqCst);
    }
}
