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

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub python_path: String,
    pub scraper_script: PathBuf,
    pub ranking_script: PathBuf,
    pub routing_script: PathBuf,
    pub workers_per_source: usize,
    /// Per-invocation timeout for external workers; `0` disables it.
    pub worker_timeout_secs: u64,
    pub default_top_k: u32,
    /// Requests per client per minute on protected routes; `0` disables it.
    pub rate_limit_per_minute: u32,
    pub agents_path: PathBuf,
    pub api_keys: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("python_path", &self.python_path)
            .field("scraper_script", &self.scraper_script)
            .field("ranking_script", &self.ranking_script)
            .field("routing_script", &self.routing_script)
            .field("workers_per_source", &self.workers_per_source)
            .field("worker_timeout_secs", &self.worker_timeout_secs)
            .field("default_top_k", &self.default_top_k)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("agents_path", &self.agents_path)
            .field("api_keys", &self.api_keys.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}
