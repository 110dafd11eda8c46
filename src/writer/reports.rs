//! Aggregate queries that fill the report tables from the entity tables

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Sum of payment amounts per payment month
pub const MONTHLY_REVENUE_SQL: &str = "
WITH m AS (
  SELECT substr(date, 1, 7) AS month, SUM(amount) AS revenue
  FROM payments
  GROUP BY 1
)
INSERT OR REPLACE INTO monthly_revenue(month, revenue)
SELECT month, revenue FROM m";

/// Overdue ÷ (open + overdue) invoices per due month, 0 when neither exists
pub const DELINQUENCY_SQL: &str = "
WITH base AS (
  SELECT substr(due_date, 1, 7) AS month,
         SUM(CASE WHEN status = 'overdue' THEN 1 ELSE 0 END) AS overdue,
         SUM(CASE WHEN status = 'open' THEN 1 ELSE 0 END) AS open
  FROM invoices
  GROUP BY 1
)
INSERT OR REPLACE INTO delinquency(month, delinquency_rate)
SELECT month,
       CASE WHEN (open + overdue) > 0
            THEN CAST(overdue AS REAL) / (open + overdue)
            ELSE 0 END
FROM base";

/// Rows written to each report table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportCounts {
    pub monthly_revenue: usize,
    pub delinquency: usize,
}

/// Recompute both reports; callers clear the report tables beforehand
pub fn compute_reports(conn: &Connection) -> Result<ReportCounts> {
    let monthly_revenue = conn
        .execute(MONTHLY_REVENUE_SQL, [])
        .context("Failed to compute monthly revenue")?;
    let delinquency = conn
        .execute(DELINQUENCY_SQL, [])
        .context("Failed to compute delinquency")?;

    Ok(ReportCounts {
        monthly_revenue,
        delinquency,
    })
}
