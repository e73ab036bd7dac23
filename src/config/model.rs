use std::fmt::{Debug, Formatter};

pub const DEFAULT_API_URL: &str = "https://v2.api.noroff.dev";
pub const DEFAULT_PAGE_LIMIT: u32 = 100;

pub struct Config {
    pub api_url: String,
    pub api_key: String,
    pub page_limit: u32,
    pub debug_config: DebugConfig,
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("page_limit", &self.page_limit)
            .field("debug_config", &self.debug_config)
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct DebugConfig {
    /// Caps how many venues the demo lists.
    pub venue_limit: Option<usize>,
}
