use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::BackoffPolicy;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Base delay in seconds for exponential backoff (e.g. 0.5 = 500ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: f64,
    /// Geometric growth factor per attempt.
    pub multiplier: f64,
    /// Symmetric jitter fraction (0.25 = ±25%).
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_secs: 0.5,
            max_delay_secs: 5.0,
            multiplier: 1.6,
            jitter: 0.25,
        }
    }
}

/// Longest delay a config file may ask for. Keeps `inf`/garbage values in a
/// hand-edited file from producing an unrepresentable `Duration`.
const MAX_CONFIG_DELAY_SECS: f64 = 3600.0;

fn delay_from_secs(secs: f64, fallback: Duration) -> Duration {
    if secs.is_finite() && secs >= 0.0 {
        Duration::from_secs_f64(secs.min(MAX_CONFIG_DELAY_SECS))
    } else {
        fallback
    }
}

impl From<&RetryConfig> for BackoffPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        let defaults = BackoffPolicy::default();
        BackoffPolicy {
            base_delay: delay_from_secs(cfg.base_delay_secs, defaults.base_delay),
            max_delay: delay_from_secs(cfg.max_delay_secs, defaults.max_delay),
            multiplier: if cfg.multiplier.is_finite() {
                cfg.multiplier.clamp(1.0, 2.0)
            } else {
                defaults.multiplier
            },
            jitter: if cfg.jitter.is_finite() {
                cfg.jitter.clamp(0.0, 1.0)
            } else {
                defaults.jitter
            },
        }
    }
}

/// Global configuration loaded from `~/.config/termlink/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TermlinkConfig {
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl TermlinkConfig {
    /// Backoff policy for the executors, falling back to the defaults when
    /// the `[retry]` section is absent.
    pub fn backoff_policy(&self) -> BackoffPolicy {
        self.retry.as_ref().map(BackoffPolicy::from).unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("termlink")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load the config file, or defaults when it does not exist yet.
pub fn load_config() -> Result<TermlinkConfig> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(TermlinkConfig::default());
    }
    let raw = fs::read_to_string(&path)?;
    let cfg: TermlinkConfig = toml::from_str(&raw)?;
    Ok(cfg)
}
