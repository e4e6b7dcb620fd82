//! Batch driver: reads the CSV, reconciles every row inside one
//! transaction, and aggregates the run summary.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use sqlx::{PgConnection, PgPool};

use crate::reconcile::{ContactAction, UserAction, upsert_parent_contact, upsert_user};
use crate::row::ImportRow;

/// Counters reported after a run, printed in a fixed order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub users_inserted: u32,
    pub users_updated: u32,
    pub contacts_inserted: u32,
    pub contacts_updated: u32,
    pub contacts_skipped: u32,
    pub rows_processed: u32,
    pub rows_failed: u32,
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Import summary:")?;
        writeln!(f, "  users_inserted: {}", self.users_inserted)?;
        writeln!(f, "  users_updated: {}", self.users_updated)?;
        writeln!(f, "  contacts_inserted: {}", self.contacts_inserted)?;
        writeln!(f, "  contacts_updated: {}", self.contacts_updated)?;
        writeln!(f, "  contacts_skipped: {}", self.contacts_skipped)?;
        writeln!(f, "  rows_processed: {}", self.rows_processed)?;
        write!(f, "  rows_failed: {}", self.rows_failed)
    }
}

/// Reconcile one row and bump the summary counters.
///
/// The user counter moves before the contact attempt, so a row whose contact
/// write fails still records its user action while counting as failed
/// overall.
async fn import_row(
    conn: &mut PgConnection,
    row: &ImportRow,
    summary: &mut ImportSummary,
) -> Result<()> {
    let (user_id, action) = upsert_user(conn, row).await?;
    match action {
        UserAction::Inserted => summary.users_inserted += 1,
        UserAction::Updated => summary.users_updated += 1,
    }

    let (_, contact_action) = upsert_parent_contact(conn, user_id, row).await?;
    match contact_action {
        ContactAction::Inserted => summary.contacts_inserted += 1,
        ContactAction::Updated => summary.contacts_updated += 1,
        ContactAction::Skipped => summary.contacts_skipped += 1,
    }

    summary.rows_processed += 1;
    Ok(())
}

/// Run the whole import inside one transaction.
///
/// Rows are processed in file order with 1-based numbers for diagnostics. A
/// failed row is counted and logged, never fatal. A storage-level rejection
/// leaves the open transaction aborted, so rows after it that reach the
/// store keep failing until the end of the run; validation failures touch no
/// SQL and have no such effect. With `dry_run` the transaction is rolled
/// back and nothing persists; otherwise the batch commits atomically.
pub async fn run_import(pool: &PgPool, csv_path: &Path, dry_run: bool) -> Result<ImportSummary> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(csv_path)
        .with_context(|| format!("Failed to open CSV file: {}", csv_path.display()))?;

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    let mut summary = ImportSummary::default();

    for (idx, record) in reader.deserialize::<ImportRow>().enumerate() {
        let row_number = idx + 1;
        let outcome = match record {
            Ok(row) => import_row(&mut tx, &row, &mut summary).await,
            Err(err) => Err(anyhow::Error::from(err).context("Failed to read CSV record")),
        };
        if let Err(err) = outcome {
            summary.rows_failed += 1;
            log::error!("Row {} failed: {:#}", row_number, err);
        }
    }

    if dry_run {
        tx.rollback().await.context("Failed to roll back dry run")?;
        println!("Dry run complete; no changes committed.");
    } else {
        tx.commit().await.context("Failed to commit import")?;
        log::info!("Import committed to database.");
    }

    Ok(summary)
}
