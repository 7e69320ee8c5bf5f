use std::collections::BTreeSet;
use std::sync::RwLock;

use crate::message::MembershipEntry;

/// The service kinds a registry can track. Wire values match the upstream
/// gossip payload, so a peer's merged view round-trips unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ServiceKind {
    #[serde(rename = "Event")]
    Event,
    #[serde(rename = "FrontEnd")]
    FrontEnd,
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceKind::Event => write!(f, "Event"),
            ServiceKind::FrontEnd => write!(f, "FrontEnd"),
        }
    }
}

#[derive(Debug, Default)]
struct RegistryInner {
    // BTreeSet keeps addresses deduplicated and sorted; iteration order is
    // the election rank order (highest address = highest rank).
    members: BTreeSet<String>,
    primary: Option<String>,
}

/// Thread-safe membership registry for one service kind.
///
/// Addresses are opaque `host:port` strings ordered lexicographically. The
/// primary pointer is tracked alongside the set; during failover it may
/// briefly reference an address that was already removed.
#[derive(Debug)]
pub struct ServiceRegistry {
    kind: ServiceKind,
    inner: RwLock<RegistryInner>,
}

impl ServiceRegistry {
    pub fn new(kind: ServiceKind) -> Self {
        Self {
            kind,
            inner: RwLock::new(RegistryInner::default()),
        }
    }

    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    pub fn contains(&self, addr: &str) -> bool {
        self.inner.read().unwrap().members.contains(addr)
    }

    /// Idempotent insert. Returns `true` only if the address was new.
    pub fn add(&self, addr: impl Into<String>) -> bool {
        self.inner.write().unwrap().members.insert(addr.into())
    }

    pub fn remove(&self, addr: &str) -> bool {
        self.inner.write().unwrap().members.remove(addr)
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().members.is_empty()
    }

    /// Point-in-time copy of the membership in rank order. Callers iterate
    /// this across blocking network calls, so it must never be a live view.
    pub fn snapshot(&self) -> Vec<String> {
        self.inner.read().unwrap().members.iter().cloned().collect()
    }

    pub fn set_primary(&self, addr: impl Into<String>) {
        self.inner.write().unwrap().primary = Some(addr.into());
    }

    pub fn primary(&self) -> Option<String> {
        self.inner.read().unwrap().primary.clone()
    }

    /// Full membership view for gossip responses: one entry per member,
    /// flagged whether it is the current primary.
    pub fn view(&self) -> Vec<MembershipEntry> {
        let inner = self.inner.read().unwrap();
        inner
            .members
            .iter()
            .map(|addr| MembershipEntry {
                service: self.kind,
                address: addr.clone(),
                primary: inner.primary.as_deref() == Some(addr.as_str()),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_idempotent() {
        let registry = ServiceRegistry::new(ServiceKind::Event);
        assert!(registry.add("127.0.0.1:4000"));
        assert!(!registry.add("127.0.0.1:4000"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn snapshot_is_sorted_and_detached() {
        let registry = ServiceRegistry::new(ServiceKind::Event);
        registry.add("127.0.0.1:4002");
        registry.add("127.0.0.1:4000");
        registry.add("127.0.0.1:4001");

        let snap = registry.snapshot();
        assert_eq!(snap, vec!["127.0.0.1:4000", "127.0.0.1:4001", "127.0.0.1:4002"]);

        // mutation after the snapshot must not be visible in the copy
        registry.remove("127.0.0.1:4001");
        assert_eq!(snap.len(), 3);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn primary_may_outlive_membership() {
        let registry = ServiceRegistry::new(ServiceKind::Event);
        registry.add("127.0.0.1:4000");
        registry.set_primary("127.0.0.1:4000");
        registry.remove("127.0.0.1:4000");
        assert_eq!(registry.primary().as_deref(), Some("127.0.0.1:4000"));
    }

    #[test]
    fn view_flags_the_primary() {
        let registry = ServiceRegistry::new(ServiceKind::Event);
        registry.add("127.0.0.1:4000");
        registry.add("127.0.0.1:4001");
        registry.set_primary("127.0.0.1:4001");

        let view = registry.view();
        assert_eq!(view.len(), 2);
        assert!(!view[0].primary);
        assert!(view[1].primary);
        assert!(view.iter().all(|e| e.service == ServiceKind::Event));
    }
}
