use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Forward-Graph
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// External API connection settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ApiConfig {
    /// Base URL the endpoint paths are joined onto
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Static credential sent as the `token` query parameter
    pub token: String,

    /// Total time allowed for a single request (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Time allowed for establishing a connection (seconds)
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Number of forward events requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Pause between successive pagination requests (milliseconds)
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// Maximum number of post lookups in flight at once
    #[serde(default = "default_detail_concurrency")]
    pub detail_concurrency: usize,

    /// Re-attempt channels recorded as skipped in the checkpoint
    #[serde(default)]
    pub retry_skipped: bool,
}

impl CrawlerConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            page_delay_ms: default_page_delay_ms(),
            detail_concurrency: default_detail_concurrency(),
            retry_skipped: false,
        }
    }
}

/// Retry and backoff policy applied to every API call
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryConfig {
    /// Total attempts per call, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry; doubles for each further retry (milliseconds)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound of the random jitter added to each backoff (milliseconds)
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            jitter_ms: default_jitter_ms(),
        }
    }
}

/// Seed list location
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct InputConfig {
    /// CSV file with a header row, or a plain text file with one username per line
    pub seeds_path: PathBuf,

    /// Column holding the usernames when the seed file is CSV
    #[serde(default = "default_column")]
    pub column: String,
}

/// Locations of the checkpoint and the record artifacts
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory all artifacts are written into
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    #[serde(default = "default_checkpoint")]
    pub checkpoint: String,

    #[serde(default = "default_edges")]
    pub edges: String,

    #[serde(default = "default_items")]
    pub items: String,

    #[serde(default = "default_temp_edges")]
    pub temp_edges: String,

    #[serde(default = "default_temp_items")]
    pub temp_items: String,

    /// Consecutive record flush failures tolerated before the crawl halts
    #[serde(default = "default_max_flush_failures")]
    pub max_flush_failures: u32,
}

impl OutputConfig {
    pub fn checkpoint_path(&self) -> PathBuf {
        self.directory.join(&self.checkpoint)
    }

    pub fn edges_path(&self) -> PathBuf {
        self.directory.join(&self.edges)
    }

    pub fn items_path(&self) -> PathBuf {
        self.directory.join(&self.items)
    }

    pub fn temp_edges_path(&self) -> PathBuf {
        self.directory.join(&self.temp_edges)
    }

    pub fn temp_items_path(&self) -> PathBuf {
        self.directory.join(&self.temp_items)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            checkpoint: default_checkpoint(),
            edges: default_edges(),
            items: default_items(),
            temp_edges: default_temp_edges(),
            temp_items: default_temp_items(),
            max_flush_failures: default_max_flush_failures(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.tgstat.ru".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_page_size() -> u32 {
    20
}

fn default_page_delay_ms() -> u64 {
    4000
}

fn default_detail_concurrency() -> usize {
    3
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_jitter_ms() -> u64 {
    100
}

fn default_column() -> String {
    "Target Channel".to_string()
}

fn default_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_checkpoint() -> String {
    "processing_progress_2_level.json".to_string()
}

fn default_edges() -> String {
    "forwards_graph_2_level.json".to_string()
}

fn default_items() -> String {
    "all_items_test_2_level.json".to_string()
}

fn default_temp_edges() -> String {
    "forwards_graph_temp_2_level.json".to_string()
}

fn default_temp_items() -> String {
    "all_items_test_temp_2_level.json".to_string()
}

fn default_max_flush_failures() -> u32 {
    3
}
