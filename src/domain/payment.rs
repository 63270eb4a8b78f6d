use crate::domain::id::{FeeId, PaymentId, TraineeId};
use crate::domain::money::{Amount, Balance};
use crate::error::{Result, TreasuryError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    PartiallyPaid,
    Paid,
    Cancelled,
}

impl PaymentStatus {
    /// Terminal statuses accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::Cancelled)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::PartiallyPaid => "partially_paid",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// A per-trainee obligation created when a fee is applied.
///
/// State machine: PENDING → PARTIALLY_PAID → PAID, or PENDING → CANCELLED.
/// `status` is always the pure function of `(paid_amount, amount, cancelled)`
/// computed by [`derive_status`]; mutation only happens through `record` and
/// `cancel`, which keep that in sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraineePayment {
    pub id: PaymentId,
    pub fee_id: FeeId,
    pub trainee_id: TraineeId,
    pub amount: Amount,
    pub paid_amount: Balance,
    pub status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Status as a pure function of the paid/owed amounts and the cancel flag.
pub fn derive_status(paid: Decimal, amount: Decimal, cancelled: bool) -> PaymentStatus {
    if cancelled {
        PaymentStatus::Cancelled
    } else if paid >= amount {
        PaymentStatus::Paid
    } else if paid > Decimal::ZERO {
        PaymentStatus::PartiallyPaid
    } else {
        PaymentStatus::Pending
    }
}

impl TraineePayment {
    pub fn new(id: PaymentId, fee_id: FeeId, trainee_id: TraineeId, amount: Amount) -> Self {
        Self {
            id,
            fee_id,
            trainee_id,
            amount,
            paid_amount: Balance::ZERO,
            status: PaymentStatus::Pending,
            paid_at: None,
            notes: None,
        }
    }

    pub fn remaining(&self) -> Decimal {
        self.amount.value() - self.paid_amount.value()
    }

    /// Applies a payment of `amount`, moving the status forward.
    ///
    /// Rejects closed payments and any amount above the remaining balance,
    /// with no change on failure.
    pub fn record(&mut self, amount: Amount, now: DateTime<Utc>) -> Result<()> {
        if self.status.is_terminal() {
            return Err(TreasuryError::ClosedPayment(self.id));
        }
        let remaining = self.remaining();
        if amount.value() > remaining {
            return Err(TreasuryError::RejectedExcessPayment {
                payment: self.id,
                amount: amount.value(),
                remaining,
            });
        }
        self.paid_amount += amount.into();
        self.status = derive_status(self.paid_amount.value(), self.amount.value(), false);
        if self.status == PaymentStatus::Paid {
            self.paid_at = Some(now);
        }
        Ok(())
    }

    /// Cancels the obligation. Legal only while PENDING with nothing paid.
    pub fn cancel(&mut self) -> Result<()> {
        if self.status.is_terminal() {
            return Err(TreasuryError::ClosedPayment(self.id));
        }
        if self.status != PaymentStatus::Pending || self.paid_amount != Balance::ZERO {
            return Err(TreasuryError::Validation(format!(
                "payment {} cannot be cancelled after money has been received",
                self.id
            )));
        }
        self.status = PaymentStatus::Cancelled;
        Ok(())
    }
}
