use crate::domain::id::{FeeId, ScheduleId};
use crate::domain::payment::TraineePayment;
use crate::error::{Result, TreasuryError};
use chrono::{DateTime, Days, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Restriction applied to a trainee whose payment is overdue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonPaymentAction {
    DisableAttendance,
    DisablePlatform,
    DisableQuizzes,
    DisableAll,
    None,
}

impl NonPaymentAction {
    /// The concrete restrictions an external gate can toggle.
    pub const GATED: [NonPaymentAction; 3] = [
        NonPaymentAction::DisableAttendance,
        NonPaymentAction::DisablePlatform,
        NonPaymentAction::DisableQuizzes,
    ];
}

/// Deadline and restriction configuration attached to a fee.
///
/// One active schedule per fee; attaching a new one replaces the old.
/// `final_deadline` is `payment_end + grace_period_days` when an end date is
/// set, otherwise there is no deadline and nothing ever fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSchedule {
    pub id: ScheduleId,
    pub fee_id: FeeId,
    pub payment_start: Option<DateTime<Utc>>,
    pub payment_end: Option<DateTime<Utc>>,
    pub grace_period_days: u32,
    pub actions: BTreeSet<NonPaymentAction>,
    pub action_enabled: bool,
    pub notes: Option<String>,
}

impl PaymentSchedule {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ScheduleId,
        fee_id: FeeId,
        payment_start: Option<DateTime<Utc>>,
        payment_end: Option<DateTime<Utc>>,
        grace_period_days: u32,
        actions: BTreeSet<NonPaymentAction>,
        action_enabled: bool,
        notes: Option<String>,
    ) -> Result<Self> {
        if let (Some(start), Some(end)) = (payment_start, payment_end)
            && start > end
        {
            return Err(TreasuryError::Validation(
                "payment start date is after the end date".to_string(),
            ));
        }
        Ok(Self {
            id,
            fee_id,
            payment_start,
            payment_end,
            grace_period_days,
            actions,
            action_enabled,
            notes,
        })
    }

    pub fn final_deadline(&self) -> Option<DateTime<Utc>> {
        self.payment_end
            .map(|end| end + Days::new(u64::from(self.grace_period_days)))
    }
}

/// Outcome of evaluating a payment against its fee's schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enforcement {
    /// Nothing due, or enforcement does not apply.
    None,
    /// Past the end date but still inside the grace period.
    Warn,
    /// Past the final deadline; the listed restrictions should be in force.
    Active(BTreeSet<NonPaymentAction>),
}

/// Pure enforcement predicate.
///
/// Side-effect free so the decision can be tested independently of the gates
/// that apply it. Monotonic in `now` for a fixed schedule and a non-terminal
/// payment: once past the final deadline it stays `Active` until the payment
/// closes or the schedule is disabled.
pub fn evaluate(
    schedule: Option<&PaymentSchedule>,
    payment: &TraineePayment,
    now: DateTime<Utc>,
) -> Enforcement {
    let Some(schedule) = schedule else {
        return Enforcement::None;
    };
    if !schedule.action_enabled || payment.status.is_terminal() {
        return Enforcement::None;
    }
    let Some(end) = schedule.payment_end else {
        return Enforcement::None;
    };
    if now <= end {
        return Enforcement::None;
    }
    // payment_end is set, so final_deadline is too.
    let deadline = schedule.final_deadline().unwrap_or(end);
    if now <= deadline {
        Enforcement::Warn
    } else {
        Enforcement::Active(schedule.actions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::id::{PaymentId, TraineeId};
    use crate::domain::money::Amount;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn schedule(end: Option<DateTime<Utc>>, grace: u32, enabled: bool) -> PaymentSchedule {
        PaymentSchedule::new(
            ScheduleId(1),
            FeeId(1),
            None,
            end,
            grace,
            BTreeSet::from([NonPaymentAction::DisableAttendance]),
            enabled,
            None,
        )
        .unwrap()
    }

    fn pending_payment() -> TraineePayment {
        TraineePayment::new(
            PaymentId(1),
            FeeId(1),
            TraineeId(1),
            Amount::new(dec!(300)).unwrap(),
        )
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_no_schedule_or_disabled_is_none() {
        let p = pending_payment();
        assert_eq!(evaluate(None, &p, day(20)), Enforcement::None);
        let s = schedule(Some(day(10)), 5, false);
        assert_eq!(evaluate(Some(&s), &p, day(20)), Enforcement::None);
    }

    #[test]
    fn test_no_end_date_never_fires() {
        let s = schedule(None, 5, true);
        let p = pending_payment();
        assert_eq!(evaluate(Some(&s), &p, day(28)), Enforcement::None);
    }

    #[test]
    fn test_warn_inside_grace_then_active() {
        let s = schedule(Some(day(10)), 5, true);
        let p = pending_payment();
        assert_eq!(evaluate(Some(&s), &p, day(9)), Enforcement::None);
        assert_eq!(evaluate(Some(&s), &p, day(10)), Enforcement::None);
        assert_eq!(evaluate(Some(&s), &p, day(13)), Enforcement::Warn);
        assert_eq!(evaluate(Some(&s), &p, day(15)), Enforcement::Warn);
        assert_eq!(
            evaluate(Some(&s), &p, day(16)),
            Enforcement::Active(BTreeSet::from([NonPaymentAction::DisableAttendance]))
        );
    }

    #[test]
    fn test_terminal_payment_is_never_enforced() {
        let s = schedule(Some(day(10)), 5, true);
        let mut p = pending_payment();
        p.record(Amount::new(dec!(300)).unwrap(), day(12)).unwrap();
        assert_eq!(evaluate(Some(&s), &p, day(16)), Enforcement::None);
    }

    #[test]
    fn test_active_is_monotonic_in_time() {
        let s = schedule(Some(day(10)), 5, true);
        let p = pending_payment();
        for d in 16..=28 {
            assert!(matches!(
                evaluate(Some(&s), &p, day(d)),
                Enforcement::Active(_)
            ));
        }
    }

    #[test]
    fn test_zero_grace_skips_warn() {
        let s = schedule(Some(day(10)), 0, true);
        let p = pending_payment();
        assert_eq!(evaluate(Some(&s), &p, day(10)), Enforcement::None);
        assert!(matches!(
            evaluate(Some(&s), &p, day(11)),
            Enforcement::Active(_)
        ));
    }

    #[test]
    fn test_start_after_end_rejected() {
        let result = PaymentSchedule::new(
            ScheduleId(1),
            FeeId(1),
            Some(day(20)),
            Some(day(10)),
            0,
            BTreeSet::new(),
            true,
            None,
        );
        assert!(matches!(result, Err(TreasuryError::Validation(_))));
    }
}
