use crate::domain::id::{FeeId, PaymentId, ScheduleId, UserId};
use crate::domain::ports::{AccessPolicy, RestrictionGate, TreasuryStoreArc};
use crate::domain::schedule::{self, Enforcement, NonPaymentAction, PaymentSchedule};
use crate::error::{Result, TreasuryError};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Summary of one `reconcile` pass over a fee's payments.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub evaluated: usize,
    pub restricted: usize,
    pub warned: usize,
}

/// Attaches deadline configurations to fees and turns the pure enforcement
/// predicate into gate updates.
///
/// The decision itself is [`schedule::evaluate`], a side-effect-free
/// function; this component only fetches consistent snapshots and pushes
/// absolute restricted/unrestricted states to the external gates, which makes
/// `reconcile` idempotent.
pub struct ScheduleEnforcer {
    store: TreasuryStoreArc,
    gate: Arc<dyn RestrictionGate>,
    access: Arc<dyn AccessPolicy>,
}

impl ScheduleEnforcer {
    pub fn new(
        store: TreasuryStoreArc,
        gate: Arc<dyn RestrictionGate>,
        access: Arc<dyn AccessPolicy>,
    ) -> Self {
        Self {
            store,
            gate,
            access,
        }
    }

    fn authorize(&self, actor: UserId, operation: &'static str) -> Result<()> {
        if self.access.can_perform(actor, operation) {
            Ok(())
        } else {
            Err(TreasuryError::Forbidden { actor, operation })
        }
    }

    /// Attaches a schedule to a fee, replacing any existing one.
    #[allow(clippy::too_many_arguments)]
    pub async fn attach_schedule(
        &self,
        fee_id: FeeId,
        payment_start: Option<DateTime<Utc>>,
        payment_end: Option<DateTime<Utc>>,
        grace_period_days: u32,
        actions: BTreeSet<NonPaymentAction>,
        action_enabled: bool,
        notes: Option<String>,
        actor: UserId,
    ) -> Result<ScheduleId> {
        self.authorize(actor, "attach_schedule")?;
        if self.store.get_fee(fee_id).await?.is_none() {
            return Err(TreasuryError::FeeNotFound(fee_id));
        }
        let id = ScheduleId(self.store.allocate_id().await?);
        let sched = PaymentSchedule::new(
            id,
            fee_id,
            payment_start,
            payment_end,
            grace_period_days,
            actions,
            action_enabled,
            notes,
        )?;
        self.store.put_schedule(sched).await?;
        tracing::info!(fee = %fee_id, schedule = %id, "attached schedule");
        Ok(id)
    }

    /// Evaluates one payment against its fee's schedule at `now`.
    ///
    /// Reads the payment and the schedule from a single store snapshot, so a
    /// payment that just turned PAID is never seen with a stale status.
    pub async fn evaluate(&self, payment_id: PaymentId, now: DateTime<Utc>) -> Result<Enforcement> {
        let (payment, sched) = self
            .store
            .payment_with_schedule(payment_id)
            .await?
            .ok_or(TreasuryError::PaymentNotFound(payment_id))?;
        Ok(schedule::evaluate(sched.as_ref(), &payment, now))
    }

    /// Re-evaluates every payment under a fee and pushes the resulting
    /// restriction states to the gates.
    ///
    /// Each gated action is set to an absolute bool, so running this twice in
    /// the same state repeats the same writes with no extra effect. It has no
    /// internal timer; the caller decides the cadence.
    pub async fn reconcile(&self, fee_id: FeeId, now: DateTime<Utc>) -> Result<ReconcileReport> {
        if self.store.get_fee(fee_id).await?.is_none() {
            return Err(TreasuryError::FeeNotFound(fee_id));
        }
        let (payments, sched) = self.store.fee_payments_with_schedule(fee_id).await?;

        let mut report = ReconcileReport::default();
        for payment in payments {
            // Terminal payments evaluate to None, which withdraws any
            // restriction still in force for that trainee.
            let enforcement = schedule::evaluate(sched.as_ref(), &payment, now);
            report.evaluated += 1;
            match &enforcement {
                Enforcement::Warn => report.warned += 1,
                Enforcement::Active(_) => report.restricted += 1,
                Enforcement::None => {}
            }
            for action in NonPaymentAction::GATED {
                let restricted = is_restricted(&enforcement, action);
                self.gate
                    .set_restricted(payment.trainee_id, action, restricted)
                    .await?;
            }
        }
        tracing::info!(
            fee = %fee_id,
            evaluated = report.evaluated,
            restricted = report.restricted,
            "reconciled schedule"
        );
        Ok(report)
    }
}

/// Whether a concrete gated action is in force under the given enforcement.
/// DISABLE_ALL covers every gated action; NONE covers none of them.
fn is_restricted(enforcement: &Enforcement, action: NonPaymentAction) -> bool {
    match enforcement {
        Enforcement::Active(actions) => {
            actions.contains(&NonPaymentAction::DisableAll) || actions.contains(&action)
        }
        Enforcement::None | Enforcement::Warn => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_restricted_expands_disable_all() {
        let all = Enforcement::Active(BTreeSet::from([NonPaymentAction::DisableAll]));
        for action in NonPaymentAction::GATED {
            assert!(is_restricted(&all, action));
        }

        let quizzes = Enforcement::Active(BTreeSet::from([NonPaymentAction::DisableQuizzes]));
        assert!(is_restricted(&quizzes, NonPaymentAction::DisableQuizzes));
        assert!(!is_restricted(&quizzes, NonPaymentAction::DisableAttendance));
    }

    #[test]
    fn test_warn_restricts_nothing() {
        for action in NonPaymentAction::GATED {
            assert!(!is_restricted(&Enforcement::Warn, action));
            assert!(!is_restricted(&Enforcement::None, action));
        }
    }
}
