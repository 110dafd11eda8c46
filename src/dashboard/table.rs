//! Flattened, filterable views of dump tables

use anyhow::{Context, Result};
use serde_json::Value;
use std::io::Write;

/// One dashboard tab: a dotted path into the dump's `data` object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TabDef {
    pub key: &'static str,
    pub label: &'static str,
    /// `(x column, y column)` for tabs that draw a line chart
    pub chart: Option<(&'static str, &'static str)>,
}

impl TabDef {
    /// File name used when exporting this tab
    pub fn csv_file_name(&self) -> String {
        format!("{}.csv", self.key.replace('.', "_"))
    }
}

pub static TABS: &[TabDef] = &[
    TabDef {
        key: "associates",
        label: "Associates",
        chart: None,
    },
    TabDef {
        key: "invoices",
        label: "Invoices",
        chart: None,
    },
    TabDef {
        key: "payments",
        label: "Payments",
        chart: None,
    },
    TabDef {
        key: "events",
        label: "Events",
        chart: None,
    },
    TabDef {
        key: "registrations",
        label: "Registrations",
        chart: None,
    },
    TabDef {
        key: "reports.monthly_revenue",
        label: "Report: Revenue",
        chart: Some(("month", "revenue")),
    },
    TabDef {
        key: "reports.delinquency",
        label: "Report: Delinquency",
        chart: Some(("month", "delinquency_rate")),
    },
];

/// Look up a tab by its dotted key
pub fn find_tab(key: &str) -> Option<&'static TabDef> {
    TABS.iter().find(|t| t.key == key)
}

/// Rows of JSON objects rendered to strings, with the raw values kept for charts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl DataTable {
    /// Walk `dump.data` along the dotted `path`.
    ///
    /// A missing segment or a leaf that is not an array gives an empty table.
    pub fn from_path(dump: &Value, path: &str) -> Self {
        let mut node = dump.get("data");
        for segment in path.split('.') {
            node = node.and_then(|n| n.get(segment));
        }

        match node {
            Some(Value::Array(items)) => Self::from_rows(items),
            _ => Self::default(),
        }
    }

    /// Columns are the union of object keys in first-seen order
    pub fn from_rows(items: &[Value]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for item in items {
            if let Some(obj) = item.as_object() {
                for key in obj.keys() {
                    if !columns.contains(key) {
                        columns.push(key.clone());
                    }
                }
            }
        }

        let rows = items
            .iter()
            .map(|item| {
                columns
                    .iter()
                    .map(|col| item.get(col).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Keep rows where any rendered cell contains `term`, ignoring case
    pub fn filter(&self, term: &str) -> Self {
        let term = term.to_lowercase();
        if term.is_empty() || self.is_empty() {
            return self.clone();
        }

        let rows = self
            .rows
            .iter()
            .filter(|row| {
                row.iter()
                    .any(|cell| render_cell(cell).to_lowercase().contains(&term))
            })
            .cloned()
            .collect();

        Self {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Rendered cells of one row
    pub fn rendered_row(&self, idx: usize) -> Vec<String> {
        self.rows
            .get(idx)
            .map(|row| row.iter().map(render_cell).collect())
            .unwrap_or_default()
    }

    /// `(x label, y value)` pairs for a line chart; rows without a numeric y are skipped
    pub fn series(&self, x: &str, y: &str) -> Vec<(String, f64)> {
        let (Some(xi), Some(yi)) = (self.column_index(x), self.column_index(y)) else {
            return Vec::new();
        };

        self.rows
            .iter()
            .filter_map(|row| {
                let value = row[yi].as_f64()?;
                Some((render_cell(&row[xi]), value))
            })
            .collect()
    }

    /// Write the table as CSV with a header row
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(&self.columns)
            .context("Failed to write CSV header")?;
        for idx in 0..self.rows.len() {
            csv.write_record(self.rendered_row(idx))
                .context("Failed to write CSV row")?;
        }
        csv.flush().context("Failed to flush CSV")?;
        Ok(())
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Text shown for a cell; null renders empty
pub fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
