//! Generated back-office entities and their mapping onto table rows

use chrono::NaiveDate;

use crate::record::SqlValue;
use crate::schema::{TableSchema, ASSOCIATES, EVENTS, INVOICES, PAYMENTS, REGISTRATIONS};

/// An entity that is stored as one row of a schema table.
///
/// `values` must line up with `table().columns`.
pub trait Record {
    fn table() -> &'static TableSchema;

    fn values(&self) -> Vec<SqlValue>;
}

macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum!(MemberStatus {
    Active => "active",
    Delinquent => "delinquent",
    Suspended => "suspended",
});

text_enum!(Plan {
    Basic => "Basic",
    Standard => "Standard",
    Premium => "Premium",
});

text_enum!(InvoiceStatus {
    Open => "open",
    Paid => "paid",
    Overdue => "overdue",
    Cancelled => "cancelled",
});

text_enum!(PaymentMethod {
    Boleto => "boleto",
    Pix => "pix",
    Card => "card",
});

#[derive(Debug, Clone, PartialEq)]
pub struct Associate {
    pub associate_id: String,
    pub name: String,
    pub cpf_mask: String,
    pub join_date: NaiveDate,
    pub status: MemberStatus,
    pub plan: Plan,
    pub monthly_fee: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub event_id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub price: f64,
    pub seats: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Invoice {
    pub invoice_id: String,
    pub associate_id: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub amount: f64,
    pub status: InvoiceStatus,
    pub payment_date: Option<NaiveDate>,
    pub boleto_number: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub payment_id: String,
    pub invoice_id: String,
    pub date: NaiveDate,
    pub method: PaymentMethod,
    pub amount: f64,
    pub conciliated: bool,
    pub gateway_txid: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub registration_id: String,
    pub event_id: String,
    pub associate_id: String,
    pub date: NaiveDate,
    pub paid: bool,
}

/// Everything the generator produces for one seeding run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub associates: Vec<Associate>,
    pub events: Vec<Event>,
    pub invoices: Vec<Invoice>,
    pub payments: Vec<Payment>,
    pub registrations: Vec<Registration>,
}

impl Dataset {
    pub fn record_count(&self) -> usize {
        self.associates.len()
            + self.events.len()
            + self.invoices.len()
            + self.payments.len()
            + self.registrations.len()
    }
}

fn date(d: NaiveDate) -> SqlValue {
    SqlValue::Text(d.to_string())
}

impl Record for Associate {
    fn table() -> &'static TableSchema {
        &ASSOCIATES
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.associate_id.as_str().into(),
            self.name.as_str().into(),
            self.cpf_mask.as_str().into(),
            date(self.join_date),
            self.status.as_str().into(),
            self.plan.as_str().into(),
            self.monthly_fee.into(),
        ]
    }
}

impl Record for Event {
    fn table() -> &'static TableSchema {
        &EVENTS
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.event_id.as_str().into(),
            self.name.as_str().into(),
            date(self.start_date),
            date(self.end_date),
            self.price.into(),
            self.seats.into(),
        ]
    }
}

impl Record for Invoice {
    fn table() -> &'static TableSchema {
        &INVOICES
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.invoice_id.as_str().into(),
            self.associate_id.as_str().into(),
            date(self.issue_date),
            date(self.due_date),
            self.amount.into(),
            self.status.as_str().into(),
            self.payment_date.map(date).unwrap_or(SqlValue::Null),
            self.boleto_number.as_str().into(),
        ]
    }
}

impl Record for Payment {
    fn table() -> &'static TableSchema {
        &PAYMENTS
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.payment_id.as_str().into(),
            self.invoice_id.as_str().into(),
            date(self.date),
            self.method.as_str().into(),
            self.amount.into(),
            self.conciliated.into(),
            self.gateway_txid.as_deref().into(),
        ]
    }
}

impl Record for Registration {
    fn table() -> &'static TableSchema {
        &REGISTRATIONS
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.registration_id.as_str().into(),
            self.event_id.as_str().into(),
            self.associate_id.as_str().into(),
            date(self.date),
            self.paid.into(),
        ]
    }
}
