//! Application configuration

pub mod prompts;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use prompts::{routine_prompt, PromptTemplate};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Catalog file path or http(s) URL
    pub catalog_source: String,
    pub data_dir: PathBuf,
    pub relay_url: String,
    pub relay_timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Prior turns included with each completion request
    pub history_window: usize,
    pub search_debounce_ms: u64,
    pub prompt_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            catalog_source: "products.json".into(),
            data_dir: PathBuf::from("./data"),
            relay_url: "http://localhost:8787".into(),
            relay_timeout_secs: 60,
            max_tokens: 1500,
            temperature: 0.7,
            history_window: 20,
            search_debounce_ms: 300,
            prompt_file: None,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT").unwrap_or(defaults.port),
            catalog_source: env::var("CATALOG_SOURCE").unwrap_or(defaults.catalog_source),
            data_dir: env::var("ADVISOR_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            relay_url: env::var("RELAY_URL").unwrap_or(defaults.relay_url),
            relay_timeout_secs: parse_var("RELAY_TIMEOUT_SECS")
                .unwrap_or(defaults.relay_timeout_secs),
            max_tokens: parse_var("MAX_TOKENS").unwrap_or(defaults.max_tokens),
            temperature: parse_var("TEMPERATURE").unwrap_or(defaults.temperature),
            history_window: parse_var("HISTORY_WINDOW").unwrap_or(defaults.history_window),
            search_debounce_ms: parse_var("SEARCH_DEBOUNCE_MS")
                .unwrap_or(defaults.search_debounce_ms),
            prompt_file: env::var("ADVISOR_PROMPT_FILE").ok().map(PathBuf::from),
        })
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring unparseable {}={:?}", name, raw);
            None
        }
    }
}
