use crate::domain::id::SafeId;
use crate::domain::money::{Amount, Balance};
use crate::error::{Result, TreasuryError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Accounting category of a safe.
///
/// Categories that represent liabilities or outflows (DEBT, EXPENSE) may run
/// a negative balance; all others must stay non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafeCategory {
    Debt,
    Income,
    Expense,
    Assets,
    Unspecified,
}

impl SafeCategory {
    pub fn allows_overdraft(&self) -> bool {
        matches!(self, SafeCategory::Debt | SafeCategory::Expense)
    }
}

impl fmt::Display for SafeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SafeCategory::Debt => "debt",
            SafeCategory::Income => "income",
            SafeCategory::Expense => "expense",
            SafeCategory::Assets => "assets",
            SafeCategory::Unspecified => "unspecified",
        };
        f.write_str(name)
    }
}

/// ISO-style currency code, e.g. "EGP".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    pub fn new(code: &str) -> Result<Self> {
        let code = code.trim();
        if code.is_empty() {
            return Err(TreasuryError::Validation(
                "currency code must not be empty".to_string(),
            ));
        }
        Ok(Self(code.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named monetary account.
///
/// Balances are only mutated through `credit`/`debit`, and only the ledger
/// calls those; everyone else reads. The invariant `balance == initial_balance
/// + signed sum of the transaction log` is checked by the ledger tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Safe {
    pub id: SafeId,
    pub name: String,
    pub description: Option<String>,
    pub category: SafeCategory,
    pub initial_balance: Balance,
    pub balance: Balance,
    pub currency: Currency,
    pub is_active: bool,
}

impl Safe {
    pub fn new(
        id: SafeId,
        name: &str,
        description: Option<String>,
        category: SafeCategory,
        initial_balance: Balance,
        currency: Currency,
    ) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TreasuryError::Validation(
                "safe name must not be empty".to_string(),
            ));
        }
        if initial_balance.is_negative() && !category.allows_overdraft() {
            return Err(TreasuryError::Validation(format!(
                "negative initial balance {} not allowed for {} safes",
                initial_balance, category
            )));
        }
        Ok(Self {
            id,
            name: name.to_string(),
            description,
            category,
            initial_balance,
            balance: initial_balance,
            currency,
            is_active: true,
        })
    }

    /// Adds funds to the balance.
    pub fn credit(&mut self, amount: Amount) {
        self.balance += amount.into();
    }

    /// Removes funds from the balance, enforcing the overdraft policy.
    pub fn debit(&mut self, amount: Amount) -> Result<()> {
        let next = self.balance - amount.into();
        if next.is_negative() && !self.category.allows_overdraft() {
            return Err(TreasuryError::InsufficientFunds {
                safe: self.id,
                balance: self.balance.value(),
                requested: amount.value(),
            });
        }
        self.balance = next;
        Ok(())
    }
}
