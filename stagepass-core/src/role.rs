use std::sync::atomic::{AtomicU8, Ordering};

/// Replication role of a node. Exactly one value at a time, process-wide;
/// flipped by the election coordinator and, on primary loss, by gossip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    /// Election in progress on this node.
    Candidate,
    /// Single writer: accepts purchases, assigns timestamps, replicates.
    Primary,
    /// Applies replicated purchases, never advances the clock.
    Secondary,
}

/// Lock-free holder for the node role. Reads are advisory: a transition
/// racing a read is harmless because every operation re-checks the role at
/// the point it matters.
#[derive(Debug)]
pub struct RoleCell(AtomicU8);

const CANDIDATE: u8 = 0;
const PRIMARY: u8 = 1;
const SECONDARY: u8 = 2;

impl RoleCell {
    pub fn new(role: NodeRole) -> Self {
        Self(AtomicU8::new(encode(role)))
    }

    pub fn get(&self) -> NodeRole {
        decode(self.0.load(Ordering::SeqCst))
    }

    pub fn set(&self, role: NodeRole) {
        self.0.store(encode(role), Ordering::SeqCst);
    }

    /// Enter the candidate state unless already in it. Returns `true` if this
    /// call performed the transition, so exactly one election gets started
    /// per trigger burst.
    pub fn begin_candidacy(&self) -> bool {
        self.0.swap(CANDIDATE, Ordering::SeqCst) != CANDIDATE
    }
}

fn encode(role: NodeRole) -> u8 {
    match role {
        NodeRole::Candidate => CANDIDATE,
        NodeRole::Primary => PRIMARY,
        NodeRole::Secondary => SECONDARY,
    }
}

fn decode(raw: u8) -> NodeRole {
    match raw {
        CANDIDATE => NodeRole::Candidate,
        PRIMARY => NodeRole::Primary,
        _ => NodeRole::Secondary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let cell = RoleCell::new(NodeRole::Secondary);
        assert_eq!(cell.get(), NodeRole::Secondary);
        cell.set(NodeRole::Primary);
        assert_eq!(cell.get(), NodeRole::Primary);
    }

    #[test]
    fn candidacy_starts_once() {
        let cell = RoleCell::new(NodeRole::Secondary);
        assert!(cell.begin_candidacy());
        assert!(!cell.begin_candidacy());
        assert_eq!(cell.get(), NodeRole::Candidate);
    }
}
