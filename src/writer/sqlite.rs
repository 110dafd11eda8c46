use anyhow::{Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use rusqlite::{Connection, Transaction};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::reports::{compute_reports, ReportCounts};
use super::schema_gen::{generate_create_table, generate_indexes};
use crate::model::{Dataset, Record};
use crate::schema::DependencyResolver;

const BATCH_SIZE: usize = 1000;

/// Rows written by one seeding run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub tables: Vec<(&'static str, u64)>,
    pub reports: ReportCounts,
}

impl WriteSummary {
    pub fn total_records(&self) -> u64 {
        self.tables.iter().map(|(_, count)| count).sum()
    }

    pub fn count(&self, table: &str) -> Option<u64> {
        self.tables
            .iter()
            .find(|(name, _)| *name == table)
            .map(|(_, count)| *count)
    }
}

pub struct SqliteWriter {
    conn: Connection,
    resolver: DependencyResolver,
}

impl SqliteWriter {
    /// Open (or create) the database, optionally starting from an empty file
    pub fn open(db_path: &Path, fresh: bool) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }

        if fresh {
            remove_database_files(db_path)?;
        }

        let conn = Connection::open(db_path).context("Failed to open database")?;

        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        Ok(Self {
            conn,
            resolver: DependencyResolver::new(),
        })
    }

    /// Create all tables that do not exist yet
    pub fn apply_schema(&self) -> Result<()> {
        for schema in self.resolver.creation_order()? {
            let sql = generate_create_table(schema);
            self.conn
                .execute(&sql, [])
                .with_context(|| format!("Failed to create table: {}", schema.name))?;
        }

        Ok(())
    }

    /// Replace every table's contents with `dataset` and recompute the reports.
    ///
    /// Runs in a single transaction, so a failure leaves the previous data intact.
    pub fn write_dataset(
        &mut self,
        dataset: &Dataset,
        multi: &MultiProgress,
    ) -> Result<WriteSummary> {
        let teardown = self.resolver.teardown_order()?;
        let tx = self.conn.transaction()?;

        for schema in &teardown {
            let removed = tx
                .execute(&format!("DELETE FROM {}", schema.name), [])
                .with_context(|| format!("Failed to clear table: {}", schema.name))?;
            debug!(table = schema.name, removed, "cleared table");
        }

        let style = ProgressStyle::default_bar()
            .template("{msg:20} [{bar:40.cyan/blue}] {pos}/{len}")
            .context("Invalid progress template")?
            .progress_chars("=>-");

        let tables = vec![
            import(&tx, &dataset.associates, multi, &style)?,
            import(&tx, &dataset.events, multi, &style)?,
            import(&tx, &dataset.invoices, multi, &style)?,
            import(&tx, &dataset.payments, multi, &style)?,
            import(&tx, &dataset.registrations, multi, &style)?,
        ];
        let reports = compute_reports(&tx)?;

        for schema in self.resolver.creation_order()? {
            for index_sql in generate_indexes(schema) {
                tx.execute(&index_sql, [])
                    .with_context(|| format!("Failed to create index for: {}", schema.name))?;
            }
        }

        tx.commit()?;
        Ok(WriteSummary { tables, reports })
    }

    /// Finalize the database
    pub fn finalize(self) -> Result<()> {
        self.conn.execute_batch("PRAGMA optimize;")?;
        Ok(())
    }
}

/// Delete the database file and its `-wal`/`-shm` sidecars, whichever exist
pub fn remove_database_files(db_path: &Path) -> Result<()> {
    for suffix in ["", "-wal", "-shm"] {
        let mut name = db_path.as_os_str().to_owned();
        name.push(suffix);
        let path = PathBuf::from(name);

        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {:?}", path))?;
        }
    }

    Ok(())
}

/// Insert one table's records under its own progress bar
fn import<R: Record>(
    tx: &Transaction,
    records: &[R],
    multi: &MultiProgress,
    style: &ProgressStyle,
) -> Result<(&'static str, u64)> {
    let pb = multi.add(ProgressBar::new(records.len() as u64));
    pb.set_style(style.clone());
    pb.set_message(R::table().name);

    let count = insert_records(tx, records, &pb)?;
    pb.finish_with_message(format!("{}: {} records", R::table().name, count));

    Ok((R::table().name, count))
}

/// Insert all records of one table in batches
fn insert_records<R: Record>(
    tx: &Transaction,
    records: &[R],
    progress: &ProgressBar,
) -> Result<u64> {
    let columns = R::table().column_names();
    let placeholders: Vec<&str> = columns.iter().map(|_| "?").collect();
    let insert_sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        R::table().name,
        columns.join(", "),
        placeholders.join(", ")
    );

    let mut count: u64 = 0;
    for batch in records.chunks(BATCH_SIZE) {
        insert_batch(tx, &insert_sql, batch)
            .with_context(|| format!("Failed to insert into {}", R::table().name))?;
        count += batch.len() as u64;
        progress.set_position(count);
    }

    Ok(count)
}

/// Insert a batch of rows into the database
fn insert_batch<R: Record>(tx: &Transaction, sql: &str, batch: &[R]) -> Result<()> {
    let mut stmt = tx.prepare_cached(sql)?;

    for record in batch {
        for (idx, value) in record.values().iter().enumerate() {
            value.bind_to(idx + 1, &mut stmt)?;
        }
        stmt.raw_execute()?;
    }

    Ok(())
}
