pub mod fake;
pub mod generator;

pub use generator::*;

use anyhow::Result;
use indicatif::{MultiProgress, ProgressDrawTarget};
use std::path::Path;
use tracing::info;

use crate::writer::{SqliteWriter, WriteSummary};

/// Options for one seeding run
#[derive(Debug, Clone, Default)]
pub struct SeedOptions {
    pub generator: GeneratorConfig,
    /// Delete the database file before writing
    pub fresh: bool,
    /// Draw per-table progress bars on stderr
    pub progress: bool,
}

/// Generate a dataset and write it, with its reports and indexes, to `db_path`
pub fn seed_database(db_path: &Path, options: &SeedOptions) -> Result<WriteSummary> {
    let dataset = generate(options.generator.clone())?;
    info!(
        seed = options.generator.seed,
        records = dataset.record_count(),
        "generated dataset"
    );

    let mut writer = SqliteWriter::open(db_path, options.fresh)?;
    writer.apply_schema()?;

    let multi = if options.progress {
        MultiProgress::new()
    } else {
        MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
    };
    let summary = writer.write_dataset(&dataset, &multi)?;
    writer.finalize()?;

    info!(
        db = %db_path.display(),
        records = summary.total_records(),
        revenue_months = summary.reports.monthly_revenue,
        delinquency_months = summary.reports.delinquency,
        "database seeded"
    );

    Ok(summary)
}
