pub mod clock;
pub mod errors;
pub mod ledger;
pub mod membership;
pub mod message;
pub mod role;
