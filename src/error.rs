use crate::domain::id::{FeeId, PaymentId, SafeId, UserId};
use rust_decimal::Decimal;
use std::time::Duration;
use thiserror::Error;

/// Errors produced by the treasury core.
///
/// Every mutating operation is all-or-nothing: any of these errors guarantees
/// that no state change took place, so callers may retry freely.
#[derive(Error, Debug)]
pub enum TreasuryError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    #[error("safe {0} not found")]
    SafeNotFound(SafeId),

    #[error("fee {0} not found")]
    FeeNotFound(FeeId),

    #[error("payment {0} not found")]
    PaymentNotFound(PaymentId),

    #[error("fee {0} has already been applied")]
    AlreadyApplied(FeeId),

    #[error("payment {0} is closed and accepts no further changes")]
    ClosedPayment(PaymentId),

    #[error("payment {payment}: amount {amount} exceeds remaining {remaining}")]
    RejectedExcessPayment {
        payment: PaymentId,
        amount: Decimal,
        remaining: Decimal,
    },

    #[error("transfer source and target are the same safe: {0}")]
    SameSafeTransfer(SafeId),

    #[error("insufficient funds in safe {safe}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        safe: SafeId,
        balance: Decimal,
        requested: Decimal,
    },

    #[error("could not acquire lock within {0:?}, retry later")]
    Busy(Duration),

    #[error("actor {actor} may not perform {operation}")]
    Forbidden {
        actor: UserId,
        operation: &'static str,
    },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TreasuryError {
    pub fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TreasuryError>;
