pub(crate) mod election;
pub(crate) mod gossip;
