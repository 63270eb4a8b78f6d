use crate::application::locks::LockRegistry;
use crate::domain::fee::TraineeFee;
use crate::domain::id::{FeeId, PaymentId, ProgramId, SafeId, UserId};
use crate::domain::money::Amount;
use crate::domain::payment::TraineePayment;
use crate::domain::ports::{AccessPolicy, ProgramDirectory, TreasuryStoreArc};
use crate::error::{Result, TreasuryError};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

/// Fee templates and their fan-out into per-trainee payment obligations.
///
/// Applying a fee resolves the enrolled trainee set through the injected
/// directory and creates one PENDING payment per trainee, together with the
/// fee's applied flag, in a single atomic store write. A per-fee lock keeps
/// concurrent applies from both passing the applied check.
pub struct FeeCatalog {
    store: TreasuryStoreArc,
    directory: Arc<dyn ProgramDirectory>,
    access: Arc<dyn AccessPolicy>,
    fee_locks: LockRegistry<FeeId>,
}

impl FeeCatalog {
    pub fn new(
        store: TreasuryStoreArc,
        directory: Arc<dyn ProgramDirectory>,
        access: Arc<dyn AccessPolicy>,
    ) -> Self {
        Self {
            store,
            directory,
            access,
            fee_locks: LockRegistry::new(Duration::from_secs(5)),
        }
    }

    fn authorize(&self, actor: UserId, operation: &'static str) -> Result<()> {
        if self.access.can_perform(actor, operation) {
            Ok(())
        } else {
            Err(TreasuryError::Forbidden { actor, operation })
        }
    }

    /// Defines a new, unapplied fee. The destination safe must exist.
    #[allow(clippy::too_many_arguments)]
    pub async fn define_fee(
        &self,
        name: &str,
        amount: Decimal,
        kind: &str,
        academic_year: &str,
        program_id: ProgramId,
        safe_id: SafeId,
        allow_multiple_apply: bool,
        actor: UserId,
    ) -> Result<FeeId> {
        self.authorize(actor, "define_fee")?;
        let amount = Amount::new(amount)?;
        if self.store.get_safe(safe_id).await?.is_none() {
            return Err(TreasuryError::SafeNotFound(safe_id));
        }
        let id = FeeId(self.store.allocate_id().await?);
        let fee = TraineeFee::new(
            id,
            name,
            amount,
            kind,
            academic_year,
            program_id,
            safe_id,
            allow_multiple_apply,
        )?;
        self.store.put_fee(fee).await?;
        tracing::info!(fee = %id, amount = %amount.value(), "defined fee");
        Ok(id)
    }

    pub async fn get_fee(&self, id: FeeId) -> Result<TraineeFee> {
        self.store
            .get_fee(id)
            .await?
            .ok_or(TreasuryError::FeeNotFound(id))
    }

    /// Fans the fee out into one PENDING payment per enrolled trainee.
    ///
    /// Fails with `AlreadyApplied` when the fee was applied before and
    /// re-application is not allowed. The whole fan-out is atomic: any
    /// failure partway leaves zero new rows and the fee unchanged.
    pub async fn apply_fee(&self, fee_id: FeeId, actor: UserId) -> Result<Vec<PaymentId>> {
        self.authorize(actor, "apply_fee")?;
        let _guard = self.fee_locks.acquire(fee_id).await?;

        let mut fee = self.get_fee(fee_id).await?;
        fee.mark_applied(actor, Utc::now())?;

        let trainees = self
            .directory
            .enrolled_trainees(fee.program_id, &fee.academic_year)
            .await?;

        let mut payments = Vec::with_capacity(trainees.len());
        for trainee in trainees {
            let payment_id = PaymentId(self.store.allocate_id().await?);
            payments.push(TraineePayment::new(payment_id, fee_id, trainee, fee.amount));
        }
        let created: Vec<PaymentId> = payments.iter().map(|p| p.id).collect();

        self.store.apply_fee_fanout(fee, payments).await?;
        tracing::info!(fee = %fee_id, payments = created.len(), "applied fee");
        Ok(created)
    }
}
