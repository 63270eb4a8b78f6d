use crate::domain::safe::SafeCategory;
use crate::error::{Result, TreasuryError};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Create,
    Deposit,
    Withdraw,
    Transfer,
}

/// One row of a batch operations file.
///
/// `create` uses `name`, `category`, `currency` and `amount` (the opening
/// balance); the monetary operations use `source`/`target` safe ids and
/// `amount`. Unused columns stay empty.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct OperationRecord {
    pub op: OperationKind,
    pub name: Option<String>,
    pub category: Option<String>,
    pub currency: Option<String>,
    pub source: Option<u64>,
    pub target: Option<u64>,
    pub amount: Option<Decimal>,
}

impl OperationRecord {
    pub fn category(&self) -> Result<SafeCategory> {
        let raw = self.category.as_deref().unwrap_or("unspecified");
        match raw.to_lowercase().as_str() {
            "debt" => Ok(SafeCategory::Debt),
            "income" => Ok(SafeCategory::Income),
            "expense" => Ok(SafeCategory::Expense),
            "assets" => Ok(SafeCategory::Assets),
            "unspecified" | "" => Ok(SafeCategory::Unspecified),
            other => Err(TreasuryError::Validation(format!(
                "unknown safe category: {other}"
            ))),
        }
    }
}

/// Reads treasury operations from a CSV source.
///
/// Wraps `csv::Reader` with whitespace trimming and flexible record lengths,
/// yielding rows lazily so large batches stream without loading everything
/// into memory.
pub struct OperationReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> OperationReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn operations(self) -> impl Iterator<Item = Result<OperationRecord>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(TreasuryError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reader_valid_stream() {
        let data = "op, name, category, currency, source, target, amount\n\
                    create, till, assets, EGP, , , 1000\n\
                    deposit, , , , , 1, 500";
        let reader = OperationReader::new(data.as_bytes());
        let rows: Vec<OperationRecord> = reader.operations().map(|r| r.unwrap()).collect();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].op, OperationKind::Create);
        assert_eq!(rows[0].category().unwrap(), SafeCategory::Assets);
        assert_eq!(rows[0].amount, Some(dec!(1000)));
        assert_eq!(rows[1].op, OperationKind::Deposit);
        assert_eq!(rows[1].target, Some(1));
        assert_eq!(rows[1].source, None);
    }

    #[test]
    fn test_reader_malformed_op() {
        let data = "op, name, category, currency, source, target, amount\n\
                    explode, , , , , , 1";
        let reader = OperationReader::new(data.as_bytes());
        let rows: Vec<Result<OperationRecord>> = reader.operations().collect();
        assert!(rows[0].is_err());
    }

    #[test]
    fn test_unknown_category_rejected() {
        let record = OperationRecord {
            op: OperationKind::Create,
            name: Some("till".to_string()),
            category: Some("piggybank".to_string()),
            currency: Some("EGP".to_string()),
            source: None,
            target: None,
            amount: None,
        };
        assert!(record.category().is_err());
    }
}
