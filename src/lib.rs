//! Treasury core for a training-center back office: monetary safes with an
//! immutable transaction log, fee fan-out into per-trainee obligations, the
//! payment lifecycle, and deadline-driven restriction enforcement.

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;

pub use error::{Result, TreasuryError};
