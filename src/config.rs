use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "TABLO_";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub basic: BasicConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicConfig {
    pub listen_addr: String,
    pub database_url: String,
    pub max_connections: u32,
    pub loglevel: String,
    /// Shared key guarding every route but `/health`. Open console when unset.
    pub console_key: Option<String>,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:5000".to_string(),
            database_url: "sqlite:tablo.db".to_string(),
            max_connections: 5,
            loglevel: "info".to_string(),
            console_key: None,
        }
    }
}

impl Config {
    /// Defaults, then `config.toml` if present, then `TABLO_*` env vars
    /// (`TABLO_BASIC__DATABASE_URL` style nesting).
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Blank keys count as unset.
    pub fn console_key(&self) -> Option<&str> {
        self.basic
            .console_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}
