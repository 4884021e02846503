use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
}

/// Connection settings for the remote key-value store.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StoreConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub db: i64,
    /// Prepended to every key the store client issues.
    #[serde(default)]
    pub key_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port(), db: 0, key_prefix: String::new() }
    }
}

fn default_host() -> String { "localhost".into() }
fn default_port() -> u16 { 6379 }

pub const ENV_HOST: &str = "REDIS_HOST";
pub const ENV_PORT: &str = "REDIS_PORT";
pub const ENV_DB: &str = "REDIS_DB";
pub const ENV_KEY_PREFIX: &str = "REDIS_KEY_PREFIX";

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `path` (falling back to defaults when the file is missing),
    /// apply environment overrides and validate.
    pub fn load_and_validate(path: &str) -> Result<Self> {
        let mut cfg = match std::fs::metadata(path) {
            Ok(_) => load_from_file(path)?,
            Err(_) => AppConfig::default(),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.store.normalize_from_env();
        self.store.validate()?;
        Ok(())
    }
}

impl StoreConfig {
    pub fn normalize_from_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from `lookup`; unparsable numeric values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST) {
            if !host.trim().is_empty() {
                self.host = host.trim().to_string();
            }
        }
        if let Some(port) = lookup(ENV_PORT).and_then(|p| p.trim().parse::<u16>().ok()) {
            self.port = port;
        }
        if let Some(db) = lookup(ENV_DB).and_then(|d| d.trim().parse::<i64>().ok()) {
            self.db = db;
        }
        // 前缀允许为空字符串，原样采用
        if let Some(prefix) = lookup(ENV_KEY_PREFIX) {
            self.key_prefix = prefix;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(anyhow!("store.host must not be empty"));
        }
        if self.port == 0 {
            return Err(anyhow!("store.port must be in 1..=65535"));
        }
        if self.db < 0 {
            return Err(anyhow!("store.db must be >= 0"));
        }
        Ok(())
    }

    /// Connection string of the form `redis://<host>:<port>/<db>`.
    pub fn connection_url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}
