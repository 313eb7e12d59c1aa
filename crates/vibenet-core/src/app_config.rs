use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Directory holding `posts.csv`, `monthly.csv`, `yearly.csv` and `run.json`.
    pub data_dir: PathBuf,
    pub reddit_base_url: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    /// Politeness pause between consecutive monthly search requests.
    pub inter_request_delay_ms: u64,
    pub posts_per_month: usize,
    pub final_limit: usize,
    /// Base URL of the text-classification inference server.
    pub model_url: String,
    pub model_max_tokens: usize,
    pub confidence_floor: f64,
}
