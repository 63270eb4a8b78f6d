use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use rand::Rng;
use rust_decimal::Decimal;
use std::process::Command;
use tempfile::NamedTempFile;

/// Writes a batch with one safe and `rows` random deposits, returning the
/// expected final balance.
fn generate_batch(path: &std::path::Path, rows: usize) -> Decimal {
    let mut wtr = csv::Writer::from_path(path).unwrap();
    wtr.write_record(["op", "name", "category", "currency", "source", "target", "amount"])
        .unwrap();
    wtr.write_record(["create", "till", "assets", "EGP", "", "", "0"])
        .unwrap();

    let mut rng = rand::thread_rng();
    let mut expected = Decimal::ZERO;
    for _ in 0..rows {
        let cents: i64 = rng.gen_range(1..=100_000);
        let amount = Decimal::new(cents, 2);
        expected += amount;
        wtr.write_record(["deposit", "", "", "", "", "1", &amount.to_string()])
            .unwrap();
    }
    wtr.flush().unwrap();
    expected
}

#[test]
fn test_large_random_batch_sums_exactly() {
    let file = NamedTempFile::new().unwrap();
    let expected = generate_batch(file.path(), 2_000);

    let mut cmd = Command::new(cargo_bin!("khazna"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(format!("1,till,assets,{expected}")));
}

#[test]
fn test_empty_batch_produces_no_rows() {
    let mut wtr = NamedTempFile::new().unwrap();
    {
        let mut w = csv::Writer::from_writer(&mut wtr);
        w.write_record(["op", "name", "category", "currency", "source", "target", "amount"])
            .unwrap();
        w.flush().unwrap();
    }

    let mut cmd = Command::new(cargo_bin!("khazna"));
    cmd.arg(wtr.path());

    cmd.assert().success().stdout(predicate::str::is_empty());
}
