//! Table schema definitions for the back-office database

use super::types::*;

// =============================================================================
// Entity Tables
// =============================================================================

pub static ASSOCIATES: TableSchema = TableSchema {
    name: "associates",
    kind: TableKind::Entity,
    columns: &[
        Column::required("associate_id", ColumnType::Text),
        Column::required("name", ColumnType::Text),
        Column::required("cpf_mask", ColumnType::Text),
        Column::required("join_date", ColumnType::Date),
        Column::required("status", ColumnType::Text),
        Column::required("plan", ColumnType::Text),
        Column::required("monthly_fee", ColumnType::Real),
    ],
    primary_key: "associate_id",
    foreign_keys: &[],
    indexes: &[],
};

pub static EVENTS: TableSchema = TableSchema {
    name: "events",
    kind: TableKind::Entity,
    columns: &[
        Column::required("event_id", ColumnType::Text),
        Column::required("name", ColumnType::Text),
        Column::required("start_date", ColumnType::Date),
        Column::required("end_date", ColumnType::Date),
        Column::required("price", ColumnType::Real),
        Column::required("seats", ColumnType::Integer),
    ],
    primary_key: "event_id",
    foreign_keys: &[],
    indexes: &[],
};

pub static INVOICES: TableSchema = TableSchema {
    name: "invoices",
    kind: TableKind::Entity,
    columns: &[
        Column::required("invoice_id", ColumnType::Text),
        Column::required("associate_id", ColumnType::Text),
        Column::required("issue_date", ColumnType::Date),
        Column::required("due_date", ColumnType::Date),
        Column::required("amount", ColumnType::Real),
        Column::required("status", ColumnType::Text),
        Column::new("payment_date", ColumnType::Date),
        Column::required("boleto_number", ColumnType::Text),
    ],
    primary_key: "invoice_id",
    foreign_keys: &[ForeignKey::new("associate_id", "associates")],
    indexes: &[
        Index::on("idx_invoices_associate", &["associate_id"]),
        Index::on("idx_invoices_due_date", &["due_date"]),
    ],
};

pub static PAYMENTS: TableSchema = TableSchema {
    name: "payments",
    kind: TableKind::Entity,
    columns: &[
        Column::required("payment_id", ColumnType::Text),
        Column::required("invoice_id", ColumnType::Text),
        Column::required("date", ColumnType::Date),
        Column::required("method", ColumnType::Text),
        Column::required("amount", ColumnType::Real),
        Column::required("conciliated", ColumnType::Boolean),
        Column::new("gateway_txid", ColumnType::Text),
    ],
    primary_key: "payment_id",
    foreign_keys: &[ForeignKey::new("invoice_id", "invoices")],
    indexes: &[Index::on("idx_payments_invoice", &["invoice_id"])],
};

pub static REGISTRATIONS: TableSchema = TableSchema {
    name: "registrations",
    kind: TableKind::Entity,
    columns: &[
        Column::required("registration_id", ColumnType::Text),
        Column::required("event_id", ColumnType::Text),
        Column::required("associate_id", ColumnType::Text),
        Column::required("date", ColumnType::Date),
        Column::required("paid", ColumnType::Boolean),
    ],
    primary_key: "registration_id",
    foreign_keys: &[
        ForeignKey::new("event_id", "events"),
        ForeignKey::new("associate_id", "associates"),
    ],
    indexes: &[
        Index::on("idx_registrations_event", &["event_id"]),
        Index::on("idx_registrations_assoc", &["associate_id"]),
    ],
};

// =============================================================================
// Report Tables (precomputed from entity tables)
// =============================================================================

pub static MONTHLY_REVENUE: TableSchema = TableSchema {
    name: "monthly_revenue",
    kind: TableKind::Report,
    columns: &[
        Column::required("month", ColumnType::Date),
        Column::required("revenue", ColumnType::Real),
    ],
    primary_key: "month",
    foreign_keys: &[],
    indexes: &[Index::on("idx_monthly_revenue_month", &["month"])],
};

pub static DELINQUENCY: TableSchema = TableSchema {
    name: "delinquency",
    kind: TableKind::Report,
    columns: &[
        Column::required("month", ColumnType::Date),
        Column::required("delinquency_rate", ColumnType::Real),
    ],
    primary_key: "month",
    foreign_keys: &[],
    indexes: &[Index::on("idx_delinquency_month", &["month"])],
};

// =============================================================================
// Schema Registry
// =============================================================================

/// All table schemas in dependency order
pub static ALL_TABLES: &[&TableSchema] = &[
    &ASSOCIATES,
    &EVENTS,
    &INVOICES,
    &PAYMENTS,
    &REGISTRATIONS,
    &MONTHLY_REVENUE,
    &DELINQUENCY,
];

/// Get table schema by name
pub fn get_table(name: &str) -> Option<&'static TableSchema> {
    ALL_TABLES.iter().find(|t| t.name == name).copied()
}

/// Get all table names
pub fn table_names() -> Vec<&'static str> {
    ALL_TABLES.iter().map(|t| t.name).collect()
}
