use crate::application::ledger::SafeLedger;
use crate::application::locks::LockRegistry;
use crate::domain::id::{PaymentId, SafeId, UserId};
use crate::domain::money::Amount;
use crate::domain::payment::{PaymentStatus, TraineePayment};
use crate::domain::ports::{AccessPolicy, TreasuryStoreArc};
use crate::error::{Result, TreasuryError};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

/// Owner of trainee payment rows.
///
/// Accepts full and partial payments, derives the status, and posts the
/// matching ledger transaction through the ledger. The payment-row update and
/// the ledger posting land in one atomic store write, performed while the
/// per-payment lock is held so the amount-vs-remaining check cannot race.
pub struct PaymentLifecycle {
    store: TreasuryStoreArc,
    ledger: Arc<SafeLedger>,
    access: Arc<dyn AccessPolicy>,
    payment_locks: LockRegistry<PaymentId>,
}

impl PaymentLifecycle {
    pub fn new(
        store: TreasuryStoreArc,
        ledger: Arc<SafeLedger>,
        access: Arc<dyn AccessPolicy>,
    ) -> Self {
        Self {
            store,
            ledger,
            access,
            payment_locks: LockRegistry::new(Duration::from_secs(5)),
        }
    }

    fn authorize(&self, actor: UserId, operation: &'static str) -> Result<()> {
        if self.access.can_perform(actor, operation) {
            Ok(())
        } else {
            Err(TreasuryError::Forbidden { actor, operation })
        }
    }

    pub async fn get_payment(&self, id: PaymentId) -> Result<TraineePayment> {
        self.store
            .get_payment(id)
            .await?
            .ok_or(TreasuryError::PaymentNotFound(id))
    }

    /// Records a full or partial payment against an open obligation.
    ///
    /// Rejects amounts above the remaining balance (`RejectedExcessPayment`)
    /// and closed payments (`ClosedPayment`), with no effect. On success the
    /// status moves to PARTIALLY_PAID or PAID and the credited safe receives
    /// a linked PAYMENT transaction in the same commit.
    pub async fn record_payment(
        &self,
        payment_id: PaymentId,
        amount: Decimal,
        safe_id: SafeId,
        actor: UserId,
        notes: Option<String>,
    ) -> Result<PaymentStatus> {
        self.authorize(actor, "record_payment")?;
        let amount = Amount::new(amount)?;

        let _guard = self.payment_locks.acquire(payment_id).await?;

        // Re-read under the lock: the remaining check and the update must sit
        // in the same critical section.
        let mut payment = self.get_payment(payment_id).await?;
        payment.record(amount, Utc::now())?;
        if let Some(notes) = notes {
            payment.notes = Some(notes);
        }
        let status = payment.status;

        self.ledger
            .post_payment_credit(payment, amount, safe_id, actor)
            .await?;
        tracing::info!(
            payment = %payment_id,
            amount = %amount.value(),
            %status,
            "recorded payment"
        );
        Ok(status)
    }

    /// Cancels a PENDING obligation with nothing paid. Terminal.
    pub async fn cancel_payment(&self, payment_id: PaymentId, actor: UserId) -> Result<()> {
        self.authorize(actor, "cancel_payment")?;
        let _guard = self.payment_locks.acquire(payment_id).await?;

        let mut payment = self.get_payment(payment_id).await?;
        payment.cancel()?;
        self.store.put_payment(payment).await?;
        tracing::info!(payment = %payment_id, "cancelled payment");
        Ok(())
    }
}
