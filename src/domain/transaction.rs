use crate::domain::id::{FeeId, PaymentId, SafeId, TransactionId, UserId};
use crate::domain::money::Amount;
use crate::error::{Result, TreasuryError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdraw,
    Transfer,
    Fee,
    Payment,
}

/// Link from a ledger transaction back to the business record that caused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionLink {
    Fee(FeeId),
    Payment(PaymentId),
}

/// An immutable ledger entry.
///
/// Once written it is never edited; corrections are posted as compensating
/// transactions. Construction goes through [`Transaction::new`], which
/// enforces the shape rules for each kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub kind: TransactionKind,
    pub amount: Amount,
    pub source: Option<SafeId>,
    pub target: Option<SafeId>,
    pub link: Option<TransactionLink>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Builds a transaction, validating the source/target/link shape:
    ///
    /// - DEPOSIT: target only
    /// - WITHDRAW: source only
    /// - TRANSFER: both, and source != target
    /// - FEE: target plus a fee link
    /// - PAYMENT: target plus a payment link
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: TransactionId,
        kind: TransactionKind,
        amount: Amount,
        source: Option<SafeId>,
        target: Option<SafeId>,
        link: Option<TransactionLink>,
        created_by: UserId,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        match kind {
            TransactionKind::Deposit => {
                if source.is_some() || target.is_none() {
                    return Err(TreasuryError::Validation(
                        "deposit requires a target safe and no source".to_string(),
                    ));
                }
            }
            TransactionKind::Withdraw => {
                if source.is_none() || target.is_some() {
                    return Err(TreasuryError::Validation(
                        "withdraw requires a source safe and no target".to_string(),
                    ));
                }
            }
            TransactionKind::Transfer => {
                let (Some(src), Some(dst)) = (source, target) else {
                    return Err(TreasuryError::Validation(
                        "transfer requires both source and target safes".to_string(),
                    ));
                };
                if src == dst {
                    return Err(TreasuryError::SameSafeTransfer(src));
                }
            }
            TransactionKind::Fee => {
                if target.is_none() || !matches!(link, Some(TransactionLink::Fee(_))) {
                    return Err(TreasuryError::Validation(
                        "fee posting requires a target safe and a fee link".to_string(),
                    ));
                }
            }
            TransactionKind::Payment => {
                if target.is_none() || !matches!(link, Some(TransactionLink::Payment(_))) {
                    return Err(TreasuryError::Validation(
                        "payment posting requires a target safe and a payment link".to_string(),
                    ));
                }
            }
        }
        Ok(Self {
            id,
            kind,
            amount,
            source,
            target,
            link,
            created_by,
            created_at,
        })
    }

    /// Signed effect of this transaction on the given safe's balance.
    ///
    /// Credits count positive, debits negative, zero when the safe is not
    /// involved. Replaying these over the log reconstructs any balance.
    pub fn signed_effect_on(&self, safe: SafeId) -> Decimal {
        let mut effect = Decimal::ZERO;
        if self.target == Some(safe) {
            effect += self.amount.value();
        }
        if self.source == Some(safe) {
            effect -= self.amount.value();
        }
        effect
    }

    pub fn touches(&self, safe: SafeId) -> bool {
        self.source == Some(safe) || self.target == Some(safe)
    }
}
