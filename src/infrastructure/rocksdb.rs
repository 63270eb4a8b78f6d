use crate::domain::fee::TraineeFee;
use crate::domain::id::{FeeId, PaymentId, SafeId};
use crate::domain::payment::TraineePayment;
use crate::domain::ports::TreasuryStore;
use crate::domain::safe::Safe;
use crate::domain::schedule::PaymentSchedule;
use crate::domain::transaction::Transaction;
use crate::error::{Result, TreasuryError};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for safe records.
pub const CF_SAFES: &str = "safes";
/// Column Family for the append-only transaction log.
pub const CF_TRANSACTIONS: &str = "transactions";
/// Column Family for fee templates.
pub const CF_FEES: &str = "fees";
/// Column Family for trainee payment rows.
pub const CF_PAYMENTS: &str = "payments";
/// Column Family for payment schedules, keyed by fee id.
pub const CF_SCHEDULES: &str = "schedules";
/// Column Family for store metadata (the id sequence).
pub const CF_META: &str = "meta";

const META_NEXT_ID: &[u8] = b"next_id";

/// Persistent store backed by RocksDB.
///
/// Each record kind lives in its own column family; the atomic combos are
/// committed through a single `WriteBatch`. Values are serialized as JSON,
/// keys as big-endian u64 so iteration order follows the ids.
#[derive(Clone)]
pub struct RocksDbTreasuryStore {
    db: Arc<DB>,
    id_lock: Arc<Mutex<()>>,
}

impl RocksDbTreasuryStore {
    /// Opens or creates a RocksDB instance at the given path, ensuring all
    /// required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = [
            CF_SAFES,
            CF_TRANSACTIONS,
            CF_FEES,
            CF_PAYMENTS,
            CF_SCHEDULES,
            CF_META,
        ]
        .into_iter()
        .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
        .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, cfs).map_err(TreasuryError::storage)?;
        Ok(Self {
            db: Arc::new(db),
            id_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| TreasuryError::Storage(format!("column family {name} not found")))
    }

    fn put<T: Serialize>(&self, cf: &str, key: u64, value: &T) -> Result<()> {
        let handle = self.cf(cf)?;
        let bytes = serde_json::to_vec(value).map_err(TreasuryError::storage)?;
        self.db
            .put_cf(handle, key.to_be_bytes(), bytes)
            .map_err(TreasuryError::storage)
    }

    fn get<T: DeserializeOwned>(&self, cf: &str, key: u64) -> Result<Option<T>> {
        let handle = self.cf(cf)?;
        match self
            .db
            .get_cf(handle, key.to_be_bytes())
            .map_err(TreasuryError::storage)?
        {
            Some(bytes) => Ok(Some(
                serde_json::from_slice(&bytes).map_err(TreasuryError::storage)?,
            )),
            None => Ok(None),
        }
    }

    fn scan<T: DeserializeOwned>(&self, cf: &str) -> Result<Vec<T>> {
        let handle = self.cf(cf)?;
        let mut records = Vec::new();
        for item in self.db.iterator_cf(handle, rocksdb::IteratorMode::Start) {
            let (_key, value) = item.map_err(TreasuryError::storage)?;
            records.push(serde_json::from_slice(&value).map_err(TreasuryError::storage)?);
        }
        Ok(records)
    }

    fn batch_put<T: Serialize>(
        &self,
        batch: &mut WriteBatch,
        cf: &str,
        key: u64,
        value: &T,
    ) -> Result<()> {
        let handle = self.cf(cf)?;
        let bytes = serde_json::to_vec(value).map_err(TreasuryError::storage)?;
        batch.put_cf(handle, key.to_be_bytes(), bytes);
        Ok(())
    }

    fn write(&self, batch: WriteBatch) -> Result<()> {
        self.db.write(batch).map_err(TreasuryError::storage)
    }
}

#[async_trait]
impl TreasuryStore for RocksDbTreasuryStore {
    async fn allocate_id(&self) -> Result<u64> {
        let _guard = self.id_lock.lock().await;
        let handle = self.cf(CF_META)?;
        let next = match self
            .db
            .get_cf(handle, META_NEXT_ID)
            .map_err(TreasuryError::storage)?
        {
            Some(bytes) => {
                let raw: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| TreasuryError::Storage("corrupt id counter".to_string()))?;
                u64::from_be_bytes(raw) + 1
            }
            None => 1,
        };
        self.db
            .put_cf(handle, META_NEXT_ID, next.to_be_bytes())
            .map_err(TreasuryError::storage)?;
        Ok(next)
    }

    async fn put_safe(&self, safe: Safe) -> Result<()> {
        self.put(CF_SAFES, safe.id.value(), &safe)
    }

    async fn get_safe(&self, id: SafeId) -> Result<Option<Safe>> {
        self.get(CF_SAFES, id.value())
    }

    async fn all_safes(&self) -> Result<Vec<Safe>> {
        self.scan(CF_SAFES)
    }

    async fn transactions_for_safe(&self, safe: SafeId) -> Result<Vec<Transaction>> {
        let all: Vec<Transaction> = self.scan(CF_TRANSACTIONS)?;
        Ok(all.into_iter().filter(|tx| tx.touches(safe)).collect())
    }

    async fn apply_ledger(&self, safes: Vec<Safe>, tx: Transaction) -> Result<()> {
        let mut batch = WriteBatch::default();
        for safe in &safes {
            self.batch_put(&mut batch, CF_SAFES, safe.id.value(), safe)?;
        }
        self.batch_put(&mut batch, CF_TRANSACTIONS, tx.id.value(), &tx)?;
        self.write(batch)
    }

    async fn put_fee(&self, fee: TraineeFee) -> Result<()> {
        self.put(CF_FEES, fee.id.value(), &fee)
    }

    async fn get_fee(&self, id: FeeId) -> Result<Option<TraineeFee>> {
        self.get(CF_FEES, id.value())
    }

    async fn apply_fee_fanout(&self, fee: TraineeFee, payments: Vec<TraineePayment>) -> Result<()> {
        let mut batch = WriteBatch::default();
        self.batch_put(&mut batch, CF_FEES, fee.id.value(), &fee)?;
        for payment in &payments {
            self.batch_put(&mut batch, CF_PAYMENTS, payment.id.value(), payment)?;
        }
        self.write(batch)
    }

    async fn put_payment(&self, payment: TraineePayment) -> Result<()> {
        self.put(CF_PAYMENTS, payment.id.value(), &payment)
    }

    async fn get_payment(&self, id: PaymentId) -> Result<Option<TraineePayment>> {
        self.get(CF_PAYMENTS, id.value())
    }

    async fn payments_for_fee(&self, fee: FeeId) -> Result<Vec<TraineePayment>> {
        let all: Vec<TraineePayment> = self.scan(CF_PAYMENTS)?;
        Ok(all.into_iter().filter(|p| p.fee_id == fee).collect())
    }

    async fn commit_payment(
        &self,
        payment: TraineePayment,
        safe: Safe,
        tx: Transaction,
    ) -> Result<()> {
        let mut batch = WriteBatch::default();
        self.batch_put(&mut batch, CF_PAYMENTS, payment.id.value(), &payment)?;
        self.batch_put(&mut batch, CF_SAFES, safe.id.value(), &safe)?;
        self.batch_put(&mut batch, CF_TRANSACTIONS, tx.id.value(), &tx)?;
        self.write(batch)
    }

    async fn put_schedule(&self, schedule: PaymentSchedule) -> Result<()> {
        // Keyed by fee id: one active schedule per fee, attach replaces.
        self.put(CF_SCHEDULES, schedule.fee_id.value(), &schedule)
    }

    async fn schedule_for_fee(&self, fee: FeeId) -> Result<Option<PaymentSchedule>> {
        self.get(CF_SCHEDULES, fee.value())
    }

    async fn payment_with_schedule(
        &self,
        id: PaymentId,
    ) -> Result<Option<(TraineePayment, Option<PaymentSchedule>)>> {
        let Some(payment) = self.get::<TraineePayment>(CF_PAYMENTS, id.value())? else {
            return Ok(None);
        };
        let sched = self.get(CF_SCHEDULES, payment.fee_id.value())?;
        Ok(Some((payment, sched)))
    }

    async fn fee_payments_with_schedule(
        &self,
        fee: FeeId,
    ) -> Result<(Vec<TraineePayment>, Option<PaymentSchedule>)> {
        let payments = self.payments_for_fee(fee).await?;
        let sched = self.get(CF_SCHEDULES, fee.value())?;
        Ok((payments, sched))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::id::{ProgramId, TraineeId, TransactionId, UserId};
    use crate::domain::money::{Amount, Balance};
    use crate::domain::safe::{Currency, SafeCategory};
    use crate::domain::transaction::{TransactionKind, TransactionLink};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn safe(id: u64, balance: Balance) -> Safe {
        let mut s = Safe::new(
            SafeId(id),
            "main",
            None,
            SafeCategory::Income,
            Balance::ZERO,
            Currency::new("EGP").unwrap(),
        )
        .unwrap();
        s.balance = balance;
        s
    }

    #[tokio::test]
    async fn test_open_creates_column_families() {
        let dir = tempdir().unwrap();
        let store = RocksDbTreasuryStore::open(dir.path()).unwrap();
        for cf in [
            CF_SAFES,
            CF_TRANSACTIONS,
            CF_FEES,
            CF_PAYMENTS,
            CF_SCHEDULES,
            CF_META,
        ] {
            assert!(store.db.cf_handle(cf).is_some());
        }
    }

    #[tokio::test]
    async fn test_id_counter_survives_reopen() {
        let dir = tempdir().unwrap();
        let first = {
            let store = RocksDbTreasuryStore::open(dir.path()).unwrap();
            store.allocate_id().await.unwrap()
        };
        let store = RocksDbTreasuryStore::open(dir.path()).unwrap();
        let second = store.allocate_id().await.unwrap();
        assert!(second > first);
    }

    #[tokio::test]
    async fn test_apply_ledger_batch() {
        let dir = tempdir().unwrap();
        let store = RocksDbTreasuryStore::open(dir.path()).unwrap();

        let s = safe(1, Balance::new(dec!(500)));
        let tx = Transaction::new(
            TransactionId(2),
            TransactionKind::Deposit,
            Amount::new(dec!(500)).unwrap(),
            None,
            Some(SafeId(1)),
            None,
            UserId(1),
            Utc::now(),
        )
        .unwrap();

        store.apply_ledger(vec![s], tx).await.unwrap();

        let loaded = store.get_safe(SafeId(1)).await.unwrap().unwrap();
        assert_eq!(loaded.balance, Balance::new(dec!(500)));
        let log = store.transactions_for_safe(SafeId(1)).await.unwrap();
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn test_commit_payment_batch_round_trip() {
        let dir = tempdir().unwrap();
        let store = RocksDbTreasuryStore::open(dir.path()).unwrap();

        let fee = TraineeFee::new(
            FeeId(1),
            "tuition",
            Amount::new(dec!(300)).unwrap(),
            "tuition",
            "2025-2026",
            ProgramId(1),
            SafeId(2),
            false,
        )
        .unwrap();
        store.put_fee(fee.clone()).await.unwrap();

        let mut payment = TraineePayment::new(PaymentId(3), FeeId(1), TraineeId(9), fee.amount);
        payment
            .record(Amount::new(dec!(300)).unwrap(), Utc::now())
            .unwrap();

        let s = safe(2, Balance::new(dec!(300)));
        let tx = Transaction::new(
            TransactionId(4),
            TransactionKind::Payment,
            Amount::new(dec!(300)).unwrap(),
            None,
            Some(SafeId(2)),
            Some(TransactionLink::Payment(PaymentId(3))),
            UserId(1),
            Utc::now(),
        )
        .unwrap();

        store.commit_payment(payment.clone(), s, tx).await.unwrap();

        let loaded = store.get_payment(PaymentId(3)).await.unwrap().unwrap();
        assert_eq!(loaded, payment);
        assert_eq!(store.payments_for_fee(FeeId(1)).await.unwrap().len(), 1);
    }
}
