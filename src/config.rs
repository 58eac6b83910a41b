//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/bktree/bktree.toml`
//! 3. Explicit config file (e.g. `--config` on the command line)
//! 4. Environment variables: `BKTREE_*` prefix, `__` between table and key

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::errors::{TreeError, TreeResult};
use crate::metric::Distance;

/// Upper bound for the concurrent search budget, keeps deadline arithmetic finite.
pub const MAX_BUDGET_MS: u64 = 3_600_000;

/// Tuning for [`crate::Tree::search_concurrent`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConcurrentSearchConfig {
    /// Worker threads; unset means one per available CPU
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    /// Wall-clock budget in milliseconds before the walk is cancelled
    pub budget_ms: u64,
}

impl Default for ConcurrentSearchConfig {
    fn default() -> Self {
        Self {
            workers: None,
            budget_ms: 10,
        }
    }
}

impl ConcurrentSearchConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget_ms = u64::try_from(budget.as_millis()).unwrap_or(MAX_BUDGET_MS);
        self
    }

    /// Effective pool size, never 0.
    pub fn worker_count(&self) -> usize {
        self.workers
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
            .max(1)
    }

    pub fn budget(&self) -> Duration {
        Duration::from_millis(self.budget_ms.min(MAX_BUDGET_MS))
    }
}

/// Raw search config for intermediate parsing (None means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSearchConfig {
    pub workers: Option<usize>,
    pub budget_ms: Option<u64>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub radius: Option<Distance>,
    pub search: RawSearchConfig,
}

/// Unified configuration for bktree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Radius used by the command line when none is given
    pub radius: Distance,
    /// Concurrent search settings
    pub search: ConcurrentSearchConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            radius: 2,
            search: ConcurrentSearchConfig::default(),
        }
    }
}

/// Get the XDG config directory for bktree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "bktree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("bktree.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> TreeResult<RawSettings> {
    let content = std::fs::read_to_string(path).map_err(|e| TreeError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| TreeError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Overlay wins wherever it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            radius: overlay.radius.unwrap_or(self.radius),
            search: ConcurrentSearchConfig {
                workers: overlay.search.workers.or(self.search.workers),
                budget_ms: overlay.search.budget_ms.unwrap_or(self.search.budget_ms),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Optional explicit config file; it must exist if given
    pub fn load(config_file: Option<&Path>) -> TreeResult<Self> {
        Self::load_layers(global_config_path().as_deref(), config_file, None)
    }

    /// Layered loading with every source named by the caller.
    ///
    /// A missing `global` file is skipped, a missing `config_file` is an error.
    /// `env` replaces the process environment when given; keys are read the
    /// same way (`BKTREE_RADIUS`, `BKTREE_SEARCH__WORKERS`, ...).
    pub fn load_layers(
        global: Option<&Path>,
        config_file: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> TreeResult<Self> {
        let mut current = Self::default();

        if let Some(global_path) = global {
            if global_path.exists() {
                current = current.merge_with(&load_raw_settings(global_path)?);
            }
        }

        if let Some(path) = config_file {
            current = current.merge_with(&load_raw_settings(path)?);
        }

        current.apply_env_overrides(env_source().source(env))
    }

    /// Apply BKTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut self, source: Environment) -> TreeResult<Self> {
        let config = Config::builder()
            .add_source(source)
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get::<Distance>("radius") {
            self.radius = val;
        }
        if let Ok(val) = config.get::<usize>("search.workers") {
            self.search.workers = Some(val);
        }
        if let Ok(val) = config.get::<u64>("search.budget_ms") {
            self.search.budget_ms = val;
        }

        Ok(self)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> TreeResult<String> {
        toml::to_string_pretty(self).map_err(|e| TreeError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# bktree configuration
#
# Locations (by precedence, lowest to highest):
#   Global:   ~/.config/bktree/bktree.toml
#   Explicit: bktree --config <file>
#   Env:      BKTREE_RADIUS, BKTREE_SEARCH__WORKERS, BKTREE_SEARCH__BUDGET_MS

# Radius used by `bktree search` when -r is not given
# radius = 2

[search]
# Worker threads for --concurrent (default: number of CPUs)
# workers = 4

# Time budget in milliseconds; the result is partial if it runs out
# budget_ms = 10
"#
        .to_string()
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("BKTREE")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn config_err(e: ConfigError) -> TreeError {
    TreeError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> Environment {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        env_source().source(Some(vars))
    }

    #[test]
    fn given_defaults_when_created_then_budget_is_ten_millis() {
        let settings = Settings::default();
        assert_eq!(settings.radius, 2);
        assert_eq!(settings.search.workers, None);
        assert_eq!(settings.search.budget(), Duration::from_millis(10));
    }

    #[test]
    fn given_zero_workers_when_counting_then_clamps_to_one() {
        let search = ConcurrentSearchConfig::default().with_workers(0);
        assert_eq!(search.worker_count(), 1);
    }

    #[test]
    fn given_no_workers_when_counting_then_uses_available_parallelism() {
        assert!(ConcurrentSearchConfig::default().worker_count() >= 1);
    }

    #[test]
    fn given_huge_budget_when_converting_then_caps_it() {
        let search = ConcurrentSearchConfig {
            workers: None,
            budget_ms: u64::MAX,
        };
        assert_eq!(search.budget(), Duration::from_millis(MAX_BUDGET_MS));
    }

    #[test]
    fn given_overlay_when_merging_then_specified_values_win() {
        let base = Settings::default();
        let overlay = RawSettings {
            radius: None,
            search: RawSearchConfig {
                workers: Some(3),
                budget_ms: None,
            },
        };

        let merged = base.merge_with(&overlay);

        assert_eq!(merged.radius, 2);
        assert_eq!(merged.search.workers, Some(3));
        assert_eq!(merged.search.budget_ms, 10);
    }

    #[test]
    fn given_env_vars_when_applying_overrides_then_replace_values() {
        let env = env_from(&[
            ("BKTREE_RADIUS", "4"),
            ("BKTREE_SEARCH__WORKERS", "6"),
            ("BKTREE_SEARCH__BUDGET_MS", "250"),
        ]);

        let settings = Settings::default().apply_env_overrides(env).unwrap();

        assert_eq!(settings.radius, 4);
        assert_eq!(settings.search.workers, Some(6));
        assert_eq!(settings.search.budget_ms, 250);
    }

    #[test]
    fn given_unrelated_env_vars_when_applying_overrides_then_keeps_values() {
        let env = env_from(&[("OTHER_RADIUS", "9")]);
        let settings = Settings::default().apply_env_overrides(env).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn given_settings_when_rendered_then_toml_round_trips() {
        let settings = Settings {
            radius: 1,
            search: ConcurrentSearchConfig {
                workers: Some(2),
                budget_ms: 50,
            },
        };
        let rendered = settings.to_toml().unwrap();
        let parsed: Settings = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn given_template_when_parsed_then_is_valid_toml() {
        let parsed: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert!(parsed.radius.is_none());
        assert!(parsed.search.budget_ms.is_none());
    }
}
