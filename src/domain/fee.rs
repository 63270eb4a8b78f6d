use crate::domain::id::{FeeId, ProgramId, SafeId, UserId};
use crate::domain::money::Amount;
use crate::error::{Result, TreasuryError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A fee template scoped to a program and academic year.
///
/// Created unapplied; applying fans it out into one `TraineePayment` per
/// enrolled trainee. Applying is one-way unless `allow_multiple_apply`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraineeFee {
    pub id: FeeId,
    pub name: String,
    pub amount: Amount,
    pub kind: String,
    pub academic_year: String,
    pub program_id: ProgramId,
    pub safe_id: SafeId,
    pub allow_multiple_apply: bool,
    pub is_applied: bool,
    pub applied_at: Option<DateTime<Utc>>,
    pub applied_by: Option<UserId>,
}

impl TraineeFee {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: FeeId,
        name: &str,
        amount: Amount,
        kind: &str,
        academic_year: &str,
        program_id: ProgramId,
        safe_id: SafeId,
        allow_multiple_apply: bool,
    ) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TreasuryError::Validation(
                "fee name must not be empty".to_string(),
            ));
        }
        if academic_year.trim().is_empty() {
            return Err(TreasuryError::Validation(
                "academic year must not be empty".to_string(),
            ));
        }
        Ok(Self {
            id,
            name: name.to_string(),
            amount,
            kind: kind.trim().to_string(),
            academic_year: academic_year.trim().to_string(),
            program_id,
            safe_id,
            allow_multiple_apply,
            is_applied: false,
            applied_at: None,
            applied_by: None,
        })
    }

    /// Marks the fee applied. Fails with `AlreadyApplied` when the fee was
    /// applied before and re-application is not allowed.
    pub fn mark_applied(&mut self, by: UserId, at: DateTime<Utc>) -> Result<()> {
        if self.is_applied && !self.allow_multiple_apply {
            return Err(TreasuryError::AlreadyApplied(self.id));
        }
        self.is_applied = true;
        self.applied_at = Some(at);
        self.applied_by = Some(by);
        Ok(())
    }
}
