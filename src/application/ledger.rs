use crate::application::locks::LockRegistry;
use crate::domain::id::{SafeId, TransactionId, UserId};
use crate::domain::money::{Amount, Balance};
use crate::domain::payment::TraineePayment;
use crate::domain::ports::{AccessPolicy, TreasuryStoreArc};
use crate::domain::safe::{Currency, Safe, SafeCategory};
use crate::domain::transaction::{Transaction, TransactionKind, TransactionLink};
use crate::error::{Result, TreasuryError};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Owner of safes and the immutable transaction log.
///
/// The only component allowed to mutate balances. Every posting validates
/// under the per-safe locks and commits the balance deltas together with the
/// transaction row in one atomic store write.
pub struct SafeLedger {
    store: TreasuryStoreArc,
    access: Arc<dyn AccessPolicy>,
    safe_locks: LockRegistry<SafeId>,
}

impl SafeLedger {
    pub fn new(store: TreasuryStoreArc, access: Arc<dyn AccessPolicy>) -> Self {
        Self {
            store,
            access,
            safe_locks: LockRegistry::new(DEFAULT_LOCK_TIMEOUT),
        }
    }

    fn authorize(&self, actor: UserId, operation: &'static str) -> Result<()> {
        if self.access.can_perform(actor, operation) {
            Ok(())
        } else {
            Err(TreasuryError::Forbidden { actor, operation })
        }
    }

    /// Creates a safe. Negative opening balances are only accepted for
    /// categories that permit overdraft (DEBT, EXPENSE).
    pub async fn create_safe(
        &self,
        name: &str,
        description: Option<String>,
        category: SafeCategory,
        initial_balance: Decimal,
        currency: Currency,
        actor: UserId,
    ) -> Result<SafeId> {
        self.authorize(actor, "create_safe")?;
        let id = SafeId(self.store.allocate_id().await?);
        let safe = Safe::new(
            id,
            name,
            description,
            category,
            Balance::new(initial_balance),
            currency,
        )?;
        self.store.put_safe(safe).await?;
        tracing::info!(safe = %id, %category, "created safe");
        Ok(id)
    }

    /// Posts a transaction against the ledger.
    ///
    /// Shape rules per kind are enforced by [`Transaction::new`]; sufficiency
    /// is checked on the debited safe under its lock. The balance updates and
    /// the log append land atomically or not at all.
    pub async fn post_transaction(
        &self,
        kind: TransactionKind,
        amount: Decimal,
        source: Option<SafeId>,
        target: Option<SafeId>,
        link: Option<TransactionLink>,
        actor: UserId,
    ) -> Result<TransactionId> {
        self.authorize(actor, "post_transaction")?;
        let amount = Amount::new(amount)?;
        let id = TransactionId(self.store.allocate_id().await?);
        let tx = Transaction::new(id, kind, amount, source, target, link, actor, Utc::now())?;

        let involved: Vec<SafeId> = source.into_iter().chain(target).collect();
        let _guards = self.safe_locks.acquire_ordered(involved).await?;

        let mut updated = Vec::with_capacity(2);
        if let Some(src) = tx.source {
            let mut safe = self.load(src).await?;
            safe.debit(amount)?;
            updated.push(safe);
        }
        if let Some(dst) = tx.target {
            let mut safe = self.load(dst).await?;
            safe.credit(amount);
            updated.push(safe);
        }

        self.store.apply_ledger(updated, tx).await?;
        tracing::info!(tx = %id, ?kind, amount = %amount.value(), "posted transaction");
        Ok(id)
    }

    /// Credits `safe_id` with a PAYMENT posting and commits the caller's
    /// updated payment row in the same atomic write. Used by the payment
    /// lifecycle, which holds the payment lock across this call.
    pub(crate) async fn post_payment_credit(
        &self,
        payment: TraineePayment,
        amount: Amount,
        safe_id: SafeId,
        actor: UserId,
    ) -> Result<TransactionId> {
        let id = TransactionId(self.store.allocate_id().await?);
        let tx = Transaction::new(
            id,
            TransactionKind::Payment,
            amount,
            None,
            Some(safe_id),
            Some(TransactionLink::Payment(payment.id)),
            actor,
            Utc::now(),
        )?;

        let _guard = self.safe_locks.acquire(safe_id).await?;
        let mut safe = self.load(safe_id).await?;
        safe.credit(amount);

        self.store.commit_payment(payment, safe, tx).await?;
        Ok(id)
    }

    pub async fn get_balance(&self, safe_id: SafeId) -> Result<Balance> {
        Ok(self.load(safe_id).await?.balance)
    }

    pub async fn get_safe(&self, safe_id: SafeId) -> Result<Safe> {
        self.load(safe_id).await
    }

    pub async fn list_safes(&self) -> Result<Vec<Safe>> {
        let mut safes = self.store.all_safes().await?;
        safes.sort_by_key(|s| s.id);
        Ok(safes)
    }

    /// Audit trail for one safe, oldest first.
    pub async fn transactions_for_safe(&self, safe_id: SafeId) -> Result<Vec<Transaction>> {
        self.load(safe_id).await?;
        self.store.transactions_for_safe(safe_id).await
    }

    async fn load(&self, id: SafeId) -> Result<Safe> {
        self.store
            .get_safe(id)
            .await?
            .ok_or(TreasuryError::SafeNotFound(id))
    }
}
