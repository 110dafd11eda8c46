//! Small random-value helpers used by the generator

use anyhow::{anyhow, Context, Result};
use chrono::{Duration, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;

const DIGITS: &[u8] = b"0123456789";
const UPPER_ALNUM: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Inclusive calendar window to draw dates from
#[derive(Debug, Clone, Copy)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let start = parse_date(start)?;
        let end = parse_date(end)?;
        if end < start {
            return Err(anyhow!("Date window ends before it starts: {} > {}", start, end));
        }
        Ok(Self { start, end })
    }

    /// Uniform day in `[start, end]`
    pub fn sample(&self, rng: &mut impl Rng) -> NaiveDate {
        let span = (self.end - self.start).num_days();
        self.start + Duration::days(rng.gen_range(0..=span))
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("Invalid date: {}", s))
}

/// Pick from `(value, weight)` pairs proportionally to weight
pub fn weighted<T: Copy>(rng: &mut impl Rng, options: &[(T, u32)]) -> Result<T> {
    options
        .choose_weighted(rng, |&(_, weight)| weight)
        .map(|&(value, _)| value)
        .map_err(|e| anyhow!("Invalid weights: {}", e))
}

/// Pick uniformly from a non-empty slice
pub fn pick<T: Copy>(rng: &mut impl Rng, options: &[T]) -> Result<T> {
    options
        .choose(rng)
        .copied()
        .ok_or_else(|| anyhow!("Cannot pick from an empty list"))
}

/// Masked CPF: nine random digits, check digits hidden (`123.456.789-**`)
pub fn cpf_mask(rng: &mut impl Rng) -> String {
    let d = random_string(rng, DIGITS, 9);
    format!("{}.{}.{}-**", &d[0..3], &d[3..6], &d[6..9])
}

/// 47-digit bank slip line
pub fn boleto_number(rng: &mut impl Rng) -> String {
    random_string(rng, DIGITS, 47)
}

/// 25-character instant-payment transaction id
pub fn pix_txid(rng: &mut impl Rng) -> String {
    random_string(rng, UPPER_ALNUM, 25)
}

fn random_string(rng: &mut impl Rng, charset: &[u8], len: usize) -> String {
    (0..len)
        .map(|_| char::from(charset[rng.gen_range(0..charset.len())]))
        .collect()
}
