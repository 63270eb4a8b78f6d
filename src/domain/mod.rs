//! Pure domain types and invariants: money, safes, the immutable transaction
//! log, fee templates, per-trainee payments, schedules, and the storage and
//! collaborator ports.

pub mod fee;
pub mod id;
pub mod money;
pub mod payment;
pub mod ports;
pub mod safe;
pub mod schedule;
pub mod transaction;
