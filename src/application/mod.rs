//! Application layer: the four orchestrating components and the keyed lock
//! registry they use for per-safe, per-payment, and per-fee serialization.

pub mod catalog;
pub mod enforcer;
pub mod ledger;
pub mod lifecycle;
pub mod locks;
