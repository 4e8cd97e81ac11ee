#[derive(Debug, Clone, Copy, PartialEq, Eq)]
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
    pub log_level: String,
    /// Length of the chart window in calendar days, counted back from the anchor date.
    pub chart_window_days: u32,
    /// Base URL of the dashboard backend (`/api/kakao/*` lives under it).
    pub api_base_url: Option<String>,
    pub api_token: Option<String>,
    pub http_timeout_secs: u64,
    pub friend_poll_interval_ms: u64,
    pub friend_confirm_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    /// Upper bound for a single back-off delay between retries.
    pub retry_max_delay_ms: u64,
    /// Display names longer than this are cut before template substitution. `0` disables.
    pub name_max_chars: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("chart_window_days", &self.chart_window_days)
            .field("api_base_url", &self.api_base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[redacted]"))
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("friend_poll_interval_ms", &self.friend_poll_interval_ms)
            .field(
                "friend_confirm_timeout_secs",
                &self.friend_confirm_timeout_secs,
            )
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("retry_max_delay_ms", &self.retry_max_delay_ms)
            .field("name_max_chars", &self.name_max_chars)
            .finish()
    }
}
