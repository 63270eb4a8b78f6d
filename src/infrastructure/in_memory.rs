use crate::domain::fee::TraineeFee;
use crate::domain::id::{FeeId, PaymentId, SafeId};
use crate::domain::payment::TraineePayment;
use crate::domain::ports::TreasuryStore;
use crate::domain::safe::Safe;
use crate::domain::schedule::PaymentSchedule;
use crate::domain::transaction::Transaction;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    next_id: u64,
    safes: HashMap<SafeId, Safe>,
    transactions: Vec<Transaction>,
    fees: HashMap<FeeId, TraineeFee>,
    payments: HashMap<PaymentId, TraineePayment>,
    schedules: HashMap<FeeId, PaymentSchedule>,
}

/// Thread-safe in-memory store.
///
/// One `RwLock` guards the whole state, so the atomic combos hold trivially
/// and every read is a consistent snapshot. Ideal for tests and small
/// deployments where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryTreasuryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryTreasuryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full transaction log, oldest first. Used by reconciliation tests.
    pub async fn transaction_log(&self) -> Vec<Transaction> {
        self.state.read().await.transactions.clone()
    }
}

#[async_trait]
impl TreasuryStore for InMemoryTreasuryStore {
    async fn allocate_id(&self) -> Result<u64> {
        let mut state = self.state.write().await;
        state.next_id += 1;
        Ok(state.next_id)
    }

    async fn put_safe(&self, safe: Safe) -> Result<()> {
        self.state.write().await.safes.insert(safe.id, safe);
        Ok(())
    }

    async fn get_safe(&self, id: SafeId) -> Result<Option<Safe>> {
        Ok(self.state.read().await.safes.get(&id).cloned())
    }

    async fn all_safes(&self) -> Result<Vec<Safe>> {
        Ok(self.state.read().await.safes.values().cloned().collect())
    }

    async fn transactions_for_safe(&self, safe: SafeId) -> Result<Vec<Transaction>> {
        Ok(self
            .state
            .read()
            .await
            .transactions
            .iter()
            .filter(|tx| tx.touches(safe))
            .cloned()
            .collect())
    }

    async fn apply_ledger(&self, safes: Vec<Safe>, tx: Transaction) -> Result<()> {
        let mut state = self.state.write().await;
        for safe in safes {
            state.safes.insert(safe.id, safe);
        }
        state.transactions.push(tx);
        Ok(())
    }

    async fn put_fee(&self, fee: TraineeFee) -> Result<()> {
        self.state.write().await.fees.insert(fee.id, fee);
        Ok(())
    }

    async fn get_fee(&self, id: FeeId) -> Result<Option<TraineeFee>> {
        Ok(self.state.read().await.fees.get(&id).cloned())
    }

    async fn apply_fee_fanout(&self, fee: TraineeFee, payments: Vec<TraineePayment>) -> Result<()> {
        let mut state = self.state.write().await;
        state.fees.insert(fee.id, fee);
        for payment in payments {
            state.payments.insert(payment.id, payment);
        }
        Ok(())
    }

    async fn put_payment(&self, payment: TraineePayment) -> Result<()> {
        self.state.write().await.payments.insert(payment.id, payment);
        Ok(())
    }

    async fn get_payment(&self, id: PaymentId) -> Result<Option<TraineePayment>> {
        Ok(self.state.read().await.payments.get(&id).cloned())
    }

    async fn payments_for_fee(&self, fee: FeeId) -> Result<Vec<TraineePayment>> {
        let state = self.state.read().await;
        let mut payments: Vec<TraineePayment> = state
            .payments
            .values()
            .filter(|p| p.fee_id == fee)
            .cloned()
            .collect();
        payments.sort_by_key(|p| p.id);
        Ok(payments)
    }

    async fn commit_payment(
        &self,
        payment: TraineePayment,
        safe: Safe,
        tx: Transaction,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        state.payments.insert(payment.id, payment);
        state.safes.insert(safe.id, safe);
        state.transactions.push(tx);
        Ok(())
    }

    async fn put_schedule(&self, schedule: PaymentSchedule) -> Result<()> {
        self.state
            .write()
            .await
            .schedules
            .insert(schedule.fee_id, schedule);
        Ok(())
    }

    async fn schedule_for_fee(&self, fee: FeeId) -> Result<Option<PaymentSchedule>> {
        Ok(self.state.read().await.schedules.get(&fee).cloned())
    }

    async fn payment_with_schedule(
        &self,
        id: PaymentId,
    ) -> Result<Option<(TraineePayment, Option<PaymentSchedule>)>> {
        let state = self.state.read().await;
        Ok(state.payments.get(&id).map(|payment| {
            let sched = state.schedules.get(&payment.fee_id).cloned();
            (payment.clone(), sched)
        }))
    }

    async fn fee_payments_with_schedule(
        &self,
        fee: FeeId,
    ) -> Result<(Vec<TraineePayment>, Option<PaymentSchedule>)> {
        let state = self.state.read().await;
        let mut payments: Vec<TraineePayment> = state
            .payments
            .values()
            .filter(|p| p.fee_id == fee)
            .cloned()
            .collect();
        payments.sort_by_key(|p| p.id);
        Ok((payments, state.schedules.get(&fee).cloned()))
    }
}
