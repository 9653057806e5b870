//! Application configuration for Parcel.
//!
//! User config lives at `~/.parcel/parcel.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ParcelError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "parcel.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".parcel";

// ---------------------------------------------------------------------------
// Config structs (matching parcel.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Analyst endpoint settings.
    #[serde(default)]
    pub analyst: AnalystConfig,

    /// Assumption policy overlay.
    #[serde(default)]
    pub policy: AssumptionPolicy,
}

/// `[analyst]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalystConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model used for every analytical call.
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of an OpenAI-compatible chat completions API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for AnalystConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
        }
    }
}

impl AnalystConfig {
    /// Parse and validate `base_url`.
    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.base_url).map_err(|e| {
            ParcelError::config(format!("invalid analyst base_url '{}': {e}", self.base_url))
        })
    }
}

fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_model() -> String {
    "google/gemini-2.5-flash".into()
}
fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_temperature() -> f32 {
    0.2
}

/// `[policy]` section: fixed values laid over every estimate.
///
/// With `apply_overlay = true` (the default) these four fields replace whatever
/// the estimator returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssumptionPolicy {
    #[serde(default = "default_true")]
    pub apply_overlay: bool,

    /// Market cap rate (%).
    #[serde(default = "default_market_cap_rate")]
    pub market_cap_rate: f64,

    /// Annual income growth (%).
    #[serde(default = "default_growth_rate_income")]
    pub growth_rate_income: f64,

    /// Vacancy (%).
    #[serde(default = "default_vacancy_rate")]
    pub vacancy_rate: f64,

    /// Holding period in years.
    #[serde(default = "default_holding_period")]
    pub holding_period: u32,
}

impl Default for AssumptionPolicy {
    fn default() -> Self {
        Self {
            apply_overlay: true,
            market_cap_rate: default_market_cap_rate(),
            growth_rate_income: default_growth_rate_income(),
            vacancy_rate: default_vacancy_rate(),
            holding_period: default_holding_period(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_market_cap_rate() -> f64 {
    5.5
}
fn default_growth_rate_income() -> f64 {
    1.5
}
fn default_vacancy_rate() -> f64 {
    5.0
}
fn default_holding_period() -> u32 {
    10
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.parcel/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| ParcelError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.parcel/parcel.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ParcelError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| ParcelError::config(format!("failed to parse {}: {e}", path.display())))?;

    config.analyst.base_url()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ParcelError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ParcelError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ParcelError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the analyst API key env var is set and non-empty, returning it.
pub fn validate_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.analyst.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(ParcelError::config(format!(
            "analyst API key not found. Set the {var_name} environment variable \
             or pass --offline to run on fallback assumptions only."
        ))),
    }
}
