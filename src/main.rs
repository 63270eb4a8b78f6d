use clap::Parser;
use khazna::application::ledger::SafeLedger;
use khazna::domain::id::UserId;
use khazna::domain::ports::{AllowAll, TreasuryStoreArc};
use khazna::domain::safe::Currency;
use khazna::domain::transaction::TransactionKind;
use khazna::infrastructure::in_memory::InMemoryTreasuryStore;
use khazna::interfaces::csv::operation_reader::{OperationKind, OperationReader, OperationRecord};
use khazna::interfaces::csv::safe_writer::SafeWriter;
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input operations CSV file
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

/// Audit identity used for batch-applied operations.
const BATCH_ACTOR: UserId = UserId(0);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let store: TreasuryStoreArc = match cli.db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(db_path) => Arc::new(
            khazna::infrastructure::rocksdb::RocksDbTreasuryStore::open(db_path)
                .into_diagnostic()?,
        ),
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => miette::bail!("--db-path requires the storage-rocksdb feature"),
        None => Arc::new(InMemoryTreasuryStore::new()),
    };
    let ledger = SafeLedger::new(store, Arc::new(AllowAll));

    let file = File::open(cli.input).into_diagnostic()?;
    let reader = OperationReader::new(file);
    for row in reader.operations() {
        match row {
            Ok(record) => {
                if let Err(e) = apply(&ledger, record).await {
                    eprintln!("Error processing operation: {}", e);
                }
            }
            Err(e) => {
                eprintln!("Error reading operation: {}", e);
            }
        }
    }

    let safes = ledger.list_safes().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = SafeWriter::new(stdout.lock());
    writer.write_safes(&safes).into_diagnostic()?;

    Ok(())
}

async fn apply(ledger: &SafeLedger, record: OperationRecord) -> khazna::Result<()> {
    match record.op {
        OperationKind::Create => {
            let name = record.name.clone().unwrap_or_default();
            let currency = Currency::new(record.currency.as_deref().unwrap_or(""))?;
            ledger
                .create_safe(
                    &name,
                    None,
                    record.category()?,
                    record.amount.unwrap_or(Decimal::ZERO),
                    currency,
                    BATCH_ACTOR,
                )
                .await?;
        }
        OperationKind::Deposit => {
            ledger
                .post_transaction(
                    TransactionKind::Deposit,
                    record.amount.unwrap_or(Decimal::ZERO),
                    None,
                    record.target.map(Into::into),
                    None,
                    BATCH_ACTOR,
                )
                .await?;
        }
        OperationKind::Withdraw => {
            ledger
                .post_transaction(
                    TransactionKind::Withdraw,
                    record.amount.unwrap_or(Decimal::ZERO),
                    record.source.map(Into::into),
                    None,
                    None,
                    BATCH_ACTOR,
                )
                .await?;
        }
        OperationKind::Transfer => {
            ledger
                .post_transaction(
                    TransactionKind::Transfer,
                    record.amount.unwrap_or(Decimal::ZERO),
                    record.source.map(Into::into),
                    record.target.map(Into::into),
                    None,
                    BATCH_ACTOR,
                )
                .await?;
        }
    }
    Ok(())
}
