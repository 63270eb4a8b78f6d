use crate::domain::safe::Safe;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct SafeRow<'a> {
    id: u64,
    name: &'a str,
    category: String,
    balance: Decimal,
    currency: &'a str,
    active: bool,
}

impl<'a> From<&'a Safe> for SafeRow<'a> {
    fn from(safe: &'a Safe) -> Self {
        Self {
            id: safe.id.value(),
            name: &safe.name,
            category: safe.category.to_string(),
            balance: safe.balance.value(),
            currency: safe.currency.as_str(),
            active: safe.is_active,
        }
    }
}

/// Writes the final safe states as CSV.
pub struct SafeWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> SafeWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_safes(&mut self, safes: &[Safe]) -> Result<()> {
        for safe in safes {
            self.writer.serialize(SafeRow::from(safe))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
