use crate::domain::fee::TraineeFee;
use crate::domain::id::{FeeId, PaymentId, ProgramId, SafeId, TraineeId, UserId};
use crate::domain::payment::TraineePayment;
use crate::domain::safe::Safe;
use crate::domain::schedule::{NonPaymentAction, PaymentSchedule};
use crate::domain::transaction::Transaction;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Durable storage for every treasury record.
///
/// Single-record reads and writes plus three atomic combos. The combos are
/// the store's atomicity contract: either every row in the call is written or
/// none is. The snapshot reads return records observed in one consistent
/// view, so enforcement never sees a payment and a schedule from different
/// moments.
#[async_trait]
pub trait TreasuryStore: Send + Sync {
    /// Hands out the next id from a single monotonically increasing sequence.
    async fn allocate_id(&self) -> Result<u64>;

    async fn put_safe(&self, safe: Safe) -> Result<()>;
    async fn get_safe(&self, id: SafeId) -> Result<Option<Safe>>;
    async fn all_safes(&self) -> Result<Vec<Safe>>;

    /// Append-only transaction log filtered to entries touching `safe`.
    async fn transactions_for_safe(&self, safe: SafeId) -> Result<Vec<Transaction>>;

    /// Atomically writes the updated safes and appends the transaction.
    async fn apply_ledger(&self, safes: Vec<Safe>, tx: Transaction) -> Result<()>;

    async fn put_fee(&self, fee: TraineeFee) -> Result<()>;
    async fn get_fee(&self, id: FeeId) -> Result<Option<TraineeFee>>;

    /// Atomically writes the applied fee and all fanned-out payment rows.
    async fn apply_fee_fanout(&self, fee: TraineeFee, payments: Vec<TraineePayment>) -> Result<()>;

    async fn put_payment(&self, payment: TraineePayment) -> Result<()>;
    async fn get_payment(&self, id: PaymentId) -> Result<Option<TraineePayment>>;
    async fn payments_for_fee(&self, fee: FeeId) -> Result<Vec<TraineePayment>>;

    /// Atomically writes the updated payment row, the credited safe, and the
    /// appended ledger transaction.
    async fn commit_payment(
        &self,
        payment: TraineePayment,
        safe: Safe,
        tx: Transaction,
    ) -> Result<()>;

    async fn put_schedule(&self, schedule: PaymentSchedule) -> Result<()>;
    async fn schedule_for_fee(&self, fee: FeeId) -> Result<Option<PaymentSchedule>>;

    /// One consistent snapshot of a payment and its fee's schedule.
    async fn payment_with_schedule(
        &self,
        id: PaymentId,
    ) -> Result<Option<(TraineePayment, Option<PaymentSchedule>)>>;

    /// One consistent snapshot of all payments under a fee and its schedule.
    async fn fee_payments_with_schedule(
        &self,
        fee: FeeId,
    ) -> Result<(Vec<TraineePayment>, Option<PaymentSchedule>)>;
}

pub type TreasuryStoreArc = Arc<dyn TreasuryStore>;

/// Enrollment lookup, supplied by the program administration service.
#[async_trait]
pub trait ProgramDirectory: Send + Sync {
    async fn enrolled_trainees(
        &self,
        program: ProgramId,
        academic_year: &str,
    ) -> Result<Vec<TraineeId>>;
}

/// External consumer of enforcement decisions (attendance, platform, quiz
/// gates). `set_restricted` sets an absolute state, so repeating a call with
/// the same arguments is a no-op on the receiving side.
#[async_trait]
pub trait RestrictionGate: Send + Sync {
    async fn set_restricted(
        &self,
        trainee: TraineeId,
        action: NonPaymentAction,
        restricted: bool,
    ) -> Result<()>;
}

/// Injected capability predicate. Role names and hierarchies live with the
/// caller; the core only asks yes or no.
pub trait AccessPolicy: Send + Sync {
    fn can_perform(&self, actor: UserId, operation: &'static str) -> bool;
}

/// Policy that permits everything, for callers enforcing access upstream.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl AccessPolicy for AllowAll {
    fn can_perform(&self, _actor: UserId, _operation: &'static str) -> bool {
        true
    }
}
