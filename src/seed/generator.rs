use anyhow::{bail, Result};
use chrono::Duration;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::fake::{self, DateWindow};
use crate::model::{
    Associate, Dataset, Event, Invoice, InvoiceStatus, MemberStatus, Payment, PaymentMethod,
    Plan, Registration,
};

pub const DEFAULT_SEED: u64 = 7;

const MEMBER_STATUS_WEIGHTS: &[(MemberStatus, u32)] = &[
    (MemberStatus::Active, 75),
    (MemberStatus::Delinquent, 18),
    (MemberStatus::Suspended, 7),
];
const PLAN_WEIGHTS: &[(Plan, u32)] = &[(Plan::Basic, 40), (Plan::Standard, 40), (Plan::Premium, 20)];
const INVOICE_STATUS_WEIGHTS: &[(InvoiceStatus, u32)] = &[
    (InvoiceStatus::Open, 22),
    (InvoiceStatus::Paid, 60),
    (InvoiceStatus::Overdue, 12),
    (InvoiceStatus::Cancelled, 6),
];
const PAYMENT_METHOD_WEIGHTS: &[(PaymentMethod, u32)] = &[
    (PaymentMethod::Boleto, 55),
    (PaymentMethod::Pix, 35),
    (PaymentMethod::Card, 10),
];

const MONTHLY_FEES: &[f64] = &[35.0, 49.9, 59.9, 79.9, 99.9];
const EVENT_PRICES: &[f64] = &[0.0, 20.0, 35.0, 49.9, 79.9, 120.0];
const EVENT_SEATS: &[i64] = &[50, 100, 150, 200];
const INVOICE_AMOUNTS: &[f64] = &[39.9, 49.9, 59.9, 69.9, 79.9, 99.9, 149.9];

const CONCILIATED_PROBABILITY: f64 = 0.92;
const REGISTRATION_PAID_PROBABILITY: f64 = 0.85;

/// How much data to generate and from which seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub seed: u64,
    pub associates: usize,
    pub events: usize,
    pub invoices: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            associates: 50,
            events: 6,
            invoices: 220,
        }
    }
}

struct Windows {
    join: DateWindow,
    event_start: DateWindow,
    invoice_issue: DateWindow,
}

impl Windows {
    fn standard() -> Result<Self> {
        Ok(Self {
            join: DateWindow::parse("2022-01-01", "2025-06-01")?,
            event_start: DateWindow::parse("2024-01-01", "2025-11-01")?,
            invoice_issue: DateWindow::parse("2024-01-01", "2025-08-01")?,
        })
    }
}

/// Produces a referentially consistent [`Dataset`] from a seeded RNG
pub struct Generator {
    config: GeneratorConfig,
    rng: StdRng,
    windows: Windows,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        if config.associates == 0 && config.invoices > 0 {
            bail!("Invoices need at least one associate to bill");
        }

        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            windows: Windows::standard()?,
            config,
        })
    }

    pub fn generate(mut self) -> Result<Dataset> {
        let associates = self.associates()?;
        let events = self.events()?;
        let (invoices, payments) = self.invoices_and_payments(&associates)?;
        let registrations = self.registrations(&events, &associates);

        Ok(Dataset {
            associates,
            events,
            invoices,
            payments,
            registrations,
        })
    }

    fn associates(&mut self) -> Result<Vec<Associate>> {
        (1..=self.config.associates)
            .map(|i| {
                Ok(Associate {
                    associate_id: format!("A{:04}", i),
                    name: format!("Associate {}", i),
                    cpf_mask: fake::cpf_mask(&mut self.rng),
                    join_date: self.windows.join.sample(&mut self.rng),
                    status: fake::weighted(&mut self.rng, MEMBER_STATUS_WEIGHTS)?,
                    plan: fake::weighted(&mut self.rng, PLAN_WEIGHTS)?,
                    monthly_fee: fake::pick(&mut self.rng, MONTHLY_FEES)?,
                })
            })
            .collect()
    }

    fn events(&mut self) -> Result<Vec<Event>> {
        (1..=self.config.events)
            .map(|i| {
                let start_date = self.windows.event_start.sample(&mut self.rng);
                let end_date = start_date + Duration::days(self.rng.gen_range(1..=2));
                Ok(Event {
                    event_id: format!("E{:03}", i),
                    name: format!("Event {} - Management and Collections", i),
                    start_date,
                    end_date,
                    price: fake::pick(&mut self.rng, EVENT_PRICES)?,
                    seats: fake::pick(&mut self.rng, EVENT_SEATS)?,
                })
            })
            .collect()
    }

    fn invoices_and_payments(
        &mut self,
        associates: &[Associate],
    ) -> Result<(Vec<Invoice>, Vec<Payment>)> {
        let mut invoices = Vec::with_capacity(self.config.invoices);
        let mut payments = Vec::new();

        for i in 1..=self.config.invoices {
            let number = format!("{:05}", i);
            let associate = associates
                .choose(&mut self.rng)
                .map(|a| a.associate_id.clone())
                .unwrap_or_default();
            let issue_date = self.windows.invoice_issue.sample(&mut self.rng);
            let due_date = issue_date + Duration::days(10 + self.rng.gen_range(0..=9));
            let amount = fake::pick(&mut self.rng, INVOICE_AMOUNTS)?;
            let status = fake::weighted(&mut self.rng, INVOICE_STATUS_WEIGHTS)?;

            let mut payment_date = None;
            if status == InvoiceStatus::Paid {
                let date = issue_date + Duration::days(self.rng.gen_range(1..=34));
                let method = fake::weighted(&mut self.rng, PAYMENT_METHOD_WEIGHTS)?;
                let conciliated = self.rng.gen_bool(CONCILIATED_PROBABILITY);
                let gateway_txid =
                    (method == PaymentMethod::Pix).then(|| fake::pix_txid(&mut self.rng));

                payment_date = Some(date);
                payments.push(Payment {
                    payment_id: format!("P{}", number),
                    invoice_id: format!("I{}", number),
                    date,
                    method,
                    amount,
                    conciliated,
                    gateway_txid,
                });
            }

            invoices.push(Invoice {
                invoice_id: format!("I{}", number),
                associate_id: associate,
                issue_date,
                due_date,
                amount,
                status,
                payment_date,
                boleto_number: fake::boleto_number(&mut self.rng),
            });
        }

        Ok((invoices, payments))
    }

    fn registrations(&mut self, events: &[Event], associates: &[Associate]) -> Vec<Registration> {
        let mut registrations = Vec::new();

        for event in events {
            // Truncating casts match a floor on the non-negative seat counts
            let low = (event.seats as f64 * 0.2) as usize;
            let high = (event.seats as f64 * 0.7) as usize;
            let k = self.rng.gen_range(low..=high).min(associates.len());

            let chosen: Vec<&Associate> = associates.choose_multiple(&mut self.rng, k).collect();
            for associate in chosen {
                let paid = event.price == 0.0 || self.rng.gen_bool(REGISTRATION_PAID_PROBABILITY);
                registrations.push(Registration {
                    registration_id: format!("R{:05}", registrations.len() + 1),
                    event_id: event.event_id.clone(),
                    associate_id: associate.associate_id.clone(),
                    date: event.start_date,
                    paid,
                });
            }
        }

        registrations
    }
}

/// Generate a dataset with the given configuration
pub fn generate(config: GeneratorConfig) -> Result<Dataset> {
    Generator::new(config)?.generate()
}
