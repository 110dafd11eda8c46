//! Reads the whole database into the `/dump` document

use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::record::{JsonRow, SqlValue};
use crate::schema::{
    TableSchema, ASSOCIATES, DELINQUENCY, EVENTS, INVOICES, MONTHLY_REVENUE, PAYMENTS,
    REGISTRATIONS,
};

pub const DUMP_SOURCE: &str = "sqlite-mock";

#[derive(Debug, Error)]
pub enum DumpError {
    #[error("database not found at {}", .0.display())]
    DatabaseMissing(PathBuf),
    #[error("failed to open database: {0}")]
    Open(#[source] rusqlite::Error),
    #[error("failed to read table {table}: {source}")]
    Query {
        table: &'static str,
        #[source]
        source: rusqlite::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DumpResponse {
    pub meta: DumpMeta,
    pub data: DumpData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DumpMeta {
    pub source: String,
    pub totals: Totals,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub associates: usize,
    pub events: usize,
    pub invoices: usize,
    pub payments: usize,
    pub registrations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DumpData {
    pub associates: Vec<JsonRow>,
    pub events: Vec<JsonRow>,
    pub invoices: Vec<JsonRow>,
    pub payments: Vec<JsonRow>,
    pub registrations: Vec<JsonRow>,
    pub reports: Reports,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reports {
    pub monthly_revenue: Vec<JsonRow>,
    pub delinquency: Vec<JsonRow>,
}

/// Read every table of the database at `db_path`
pub fn read_dump(db_path: &Path) -> Result<DumpResponse, DumpError> {
    if !db_path.is_file() {
        return Err(DumpError::DatabaseMissing(db_path.to_path_buf()));
    }

    let conn = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(DumpError::Open)?;

    let data = DumpData {
        associates: read_table(&conn, &ASSOCIATES)?,
        events: read_table(&conn, &EVENTS)?,
        invoices: read_table(&conn, &INVOICES)?,
        payments: read_table(&conn, &PAYMENTS)?,
        registrations: read_table(&conn, &REGISTRATIONS)?,
        reports: Reports {
            monthly_revenue: read_table(&conn, &MONTHLY_REVENUE)?,
            delinquency: read_table(&conn, &DELINQUENCY)?,
        },
    };

    let totals = Totals {
        associates: data.associates.len(),
        events: data.events.len(),
        invoices: data.invoices.len(),
        payments: data.payments.len(),
        registrations: data.registrations.len(),
    };

    Ok(DumpResponse {
        meta: DumpMeta {
            source: DUMP_SOURCE.to_string(),
            totals,
        },
        data,
    })
}

/// `SELECT *` ordered by primary key, one JSON object per row
pub fn read_table(
    conn: &Connection,
    table: &'static TableSchema,
) -> Result<Vec<JsonRow>, DumpError> {
    let query_err = |source: rusqlite::Error| DumpError::Query {
        table: table.name,
        source,
    };

    let sql = format!("SELECT * FROM {} ORDER BY {}", table.name, table.primary_key);
    let mut stmt = conn.prepare(&sql).map_err(query_err)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let rows = stmt
        .query_map([], |row| {
            let mut obj = JsonRow::new();
            for (idx, name) in columns.iter().enumerate() {
                obj.insert(name.clone(), SqlValue::from(row.get_ref(idx)?).into_json());
            }
            Ok(obj)
        })
        .map_err(query_err)?;

    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(query_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::schema_gen::generate_schema_sql;
    use serde_json::Value;

    #[test]
    fn test_missing_database() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_dump(&dir.path().join("absent.db")).unwrap_err();
        assert!(matches!(err, DumpError::DatabaseMissing(_)));
    }

    #[test]
    fn test_read_table_keeps_column_order_and_types() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(&generate_schema_sql()).unwrap();
        conn.execute_batch(
            "INSERT INTO events VALUES ('E002', 'Event 2', '2024-05-01', '2024-05-02', 0.0, 50);
             INSERT INTO events VALUES ('E001', 'Event 1', '2024-04-01', '2024-04-03', 49.9, 100);",
        )
        .unwrap();

        let rows = read_table(&conn, &EVENTS).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["event_id"], Value::from("E001"));
        assert_eq!(rows[0]["seats"], Value::from(100));
        assert_eq!(rows[0]["price"], Value::from(49.9));

        let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
        assert_eq!(keys, EVENTS.column_names());
    }

    #[test]
    fn test_read_table_missing_table() {
        let conn = Connection::open_in_memory().unwrap();
        let err = read_table(&conn, &PAYMENTS).unwrap_err();
        assert!(matches!(err, DumpError::Query { table: "payments", .. }));
    }
}
