use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde_json::Value;
use std::time::{Duration, Instant};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

/// Fetches `/dump` and keeps the last good response for a short while.
///
/// Every attempt, failed or not, starts a new TTL window, so a failing
/// server is asked again only once the window has passed.
pub struct DumpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    ttl: Duration,
    cached: Option<Value>,
    last_attempt: Option<Instant>,
}

impl DumpClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("backoffice-mock/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            ttl: DEFAULT_CACHE_TTL,
            cached: None,
            last_attempt: None,
        })
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn dump_url(&self) -> String {
        format!("{}/dump", self.base_url)
    }

    /// True when no attempt was made yet or the last one is older than the TTL
    pub fn is_stale(&self) -> bool {
        match self.last_attempt {
            Some(at) => at.elapsed() >= self.ttl,
            None => true,
        }
    }

    /// Make the next fetch go to the server; the last good dump is kept
    pub fn invalidate(&mut self) {
        self.last_attempt = None;
    }

    /// Return the cached dump, asking the server first when stale.
    ///
    /// A failed request is returned as an error; until the TTL runs out
    /// again, later calls hand back the previous dump instead of retrying.
    pub fn fetch(&mut self) -> Result<&Value> {
        if self.is_stale() {
            self.last_attempt = Some(Instant::now());
            let dump = self.fetch_remote()?;
            self.cached = Some(dump);
        }

        self.cached.as_ref().context("No dump cached")
    }

    fn fetch_remote(&self) -> Result<Value> {
        let url = self.dump_url();
        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .with_context(|| format!("Failed to fetch {}", url))?
            .error_for_status()
            .with_context(|| format!("Server rejected {}", url))?;

        response
            .json::<Value>()
            .with_context(|| format!("Failed to parse dump from {}", url))
    }
}

/// Pull the `meta.totals` counters out of a dump, zero when absent
pub fn totals_line(dump: &Value) -> String {
    let total = |key: &str| {
        dump.pointer(&format!("/meta/totals/{}", key))
            .and_then(Value::as_u64)
            .unwrap_or(0)
    };

    format!(
        "Associates: {} | Events: {} | Invoices: {} | Payments: {}",
        total("associates"),
        total("events"),
        total("invoices"),
        total("payments")
    )
}
