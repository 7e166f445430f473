//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::SearchQuery;

/// Environment variable overriding `notify.bot_token`.
pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
/// Environment variable overriding `notify.chat_id`.
pub const ENV_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// What to search for
    #[serde(default)]
    pub query: SearchQuery,

    /// Where to find links and attributes on the site's pages
    #[serde(default)]
    pub selectors: SelectorConfig,

    /// Durable known-set
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Notification channel
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Per-item processing behavior
    #[serde(default)]
    pub batch: BatchConfig,

    /// Retry policy for transient per-item errors
    #[serde(default)]
    pub retry: RetryConfig,

    /// Polling interval
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Overlay secrets from the environment, if set.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(ENV_BOT_TOKEN).ok(),
            std::env::var(ENV_CHAT_ID).ok(),
        );
    }

    fn apply_overrides(&mut self, bot_token: Option<String>, chat_id: Option<String>) {
        if let Some(token) = bot_token.filter(|t| !t.trim().is_empty()) {
            self.notify.bot_token = token;
        }
        if let Some(chat) = chat_id.filter(|c| !c.trim().is_empty()) {
            self.notify.chat_id = chat;
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        url::Url::parse(&self.query.base_url)
            .map_err(|e| AppError::validation(format!("query.base_url: {e}")))?;
        if self.selectors.listing_link.trim().is_empty() {
            return Err(AppError::validation("selectors.listing_link is empty"));
        }
        if self.ledger.partition.trim().is_empty() {
            return Err(AppError::validation("ledger.partition is empty"));
        }
        if self.batch.batch_size == 0 {
            return Err(AppError::validation("batch.batch_size must be > 0"));
        }
        if self.retry.max_attempts == 0 {
            return Err(AppError::validation("retry.max_attempts must be > 0"));
        }
        if self.retry.backoff_base_ms > self.retry.backoff_max_ms {
            return Err(AppError::validation(
                "retry.backoff_base_ms must not exceed retry.backoff_max_ms",
            ));
        }
        if self.schedule.interval_secs == 0 {
            return Err(AppError::validation("schedule.interval_secs must be > 0"));
        }
        Ok(())
    }

    /// Validate, additionally requiring notification credentials.
    pub fn validate_for_delivery(&self) -> Result<()> {
        self.validate()?;
        if self.notify.bot_token.trim().is_empty() {
            return Err(AppError::validation(format!(
                "notify.bot_token is empty (set it or {ENV_BOT_TOKEN})"
            )));
        }
        if self.notify.chat_id.trim().is_empty() {
            return Err(AppError::validation(format!(
                "notify.chat_id is empty (set it or {ENV_CHAT_ID})"
            )));
        }
        Ok(())
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// CSS selectors for the overview page and the listing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Anchor of each listing on the overview page
    #[serde(default = "defaults::listing_link")]
    pub listing_link: String,

    /// Attribute holding the listing URL
    #[serde(default = "defaults::link_attr")]
    pub link_attr: String,

    #[serde(default = "defaults::price")]
    pub price: String,

    /// Text appended to the price ("per month"), stripped from it
    #[serde(default = "defaults::price_postfix")]
    pub price_postfix: String,

    #[serde(default = "defaults::bedrooms")]
    pub bedrooms: String,

    #[serde(default = "defaults::service_costs")]
    pub service_costs: String,

    #[serde(default = "defaults::included_services")]
    pub included_services: String,

    #[serde(default = "defaults::surface_area")]
    pub surface_area: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            listing_link: defaults::listing_link(),
            link_attr: defaults::link_attr(),
            price: defaults::price(),
            price_postfix: defaults::price_postfix(),
            bedrooms: defaults::bedrooms(),
            service_costs: defaults::service_costs(),
            included_services: defaults::included_services(),
            surface_area: defaults::surface_area(),
        }
    }
}

/// Ledger location and namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// JSON-lines file, relative to the storage directory unless absolute
    #[serde(default = "defaults::ledger_path")]
    pub path: PathBuf,

    /// Fixed namespace for this deployment
    #[serde(default = "defaults::partition")]
    pub partition: String,
}

impl LedgerConfig {
    /// Resolve the ledger path against a storage directory.
    pub fn resolve_path(&self, storage_dir: &Path) -> PathBuf {
        if self.path.is_absolute() {
            self.path.clone()
        } else {
            storage_dir.join(&self.path)
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: defaults::ledger_path(),
            partition: defaults::partition(),
        }
    }
}

/// Telegram bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    #[serde(default)]
    pub bot_token: String,

    #[serde(default)]
    pub chat_id: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            api_base: defaults::api_base(),
            bot_token: String::new(),
            chat_id: String::new(),
        }
    }
}

/// What to do with a listing whose details could not be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentFailurePolicy {
    /// Neither notify nor record; the listing is new again next cycle.
    #[default]
    Skip,
    /// Notify with the bare link, then record.
    NotifyLinkOnly,
}

/// Batch processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Items per memory-bounding chunk
    #[serde(default = "defaults::batch_size")]
    pub batch_size: usize,

    /// Delay between items in milliseconds
    #[serde(default = "defaults::item_delay")]
    pub item_delay_ms: u64,

    #[serde(default)]
    pub on_enrichment_failure: EnrichmentFailurePolicy,
}

impl BatchConfig {
    pub fn item_delay(&self) -> Duration {
        Duration::from_millis(self.item_delay_ms)
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: defaults::batch_size(),
            item_delay_ms: defaults::item_delay(),
            on_enrichment_failure: EnrichmentFailurePolicy::default(),
        }
    }
}

/// Bounded exponential backoff for transient errors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first one
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "defaults::backoff_base")]
    pub backoff_base_ms: u64,

    #[serde(default = "defaults::backoff_max")]
    pub backoff_max_ms: u64,
}

impl RetryConfig {
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::max_attempts(),
            backoff_base_ms: defaults::backoff_base(),
            backoff_max_ms: defaults::backoff_max(),
        }
    }
}

/// Scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Seconds between cycle starts
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,

    /// Pause after the first cycle before the interval starts
    #[serde(default = "defaults::initial_delay")]
    pub initial_delay_secs: u64,

    /// Run one cycle immediately on start
    #[serde(default = "defaults::run_on_start")]
    pub run_on_start: bool,
}

impl ScheduleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
            initial_delay_secs: defaults::initial_delay(),
            run_on_start: defaults::run_on_start(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Selector defaults
    pub fn listing_link() -> String {
        "a.listing-search-item__link--title".into()
    }
    pub fn link_attr() -> String {
        "href".into()
    }
    pub fn price() -> String {
        "div.listing-detail-summary__price".into()
    }
    pub fn price_postfix() -> String {
        "span.listing-detail-summary__price-postfix".into()
    }
    pub fn bedrooms() -> String {
        "dd.listing-features__description--number_of_bedrooms".into()
    }
    pub fn service_costs() -> String {
        "dd.listing-features__description--service_costs".into()
    }
    pub fn included_services() -> String {
        "ul.listing-features__sub-description".into()
    }
    pub fn surface_area() -> String {
        "li.illustrated-features__item--surface-area".into()
    }

    // Ledger defaults
    pub fn ledger_path() -> PathBuf {
        PathBuf::from("ledger.jsonl")
    }
    pub fn partition() -> String {
        "pararius".into()
    }

    // Notify defaults
    pub fn api_base() -> String {
        "https://api.telegram.org".into()
    }

    // Batch defaults
    pub fn batch_size() -> usize {
        5
    }
    pub fn item_delay() -> u64 {
        1000
    }

    // Retry defaults
    pub fn max_attempts() -> u32 {
        3
    }
    pub fn backoff_base() -> u64 {
        500
    }
    pub fn backoff_max() -> u64 {
        10_000
    }

    // Schedule defaults
    pub fn interval() -> u64 {
        300
    }
    pub fn initial_delay() -> u64 {
        20
    }
    pub fn run_on_start() -> bool {
        true
    }
}
