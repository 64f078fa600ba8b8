//! TOML-based application configuration.
//!
//! Stores tunables for:
//! - the AI-credit budget (instruction cost)
//! - the simulated instruction assistant (latency, failure rate, seed)
//! - feedback scoring (points per thumbs-up/down)
//! - integrations (WhatsApp bot id)
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::money::Usd;

/// Budget configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    #[serde(default = "default_cost_per_instruction")]
    pub cost_per_instruction_usd: f64,
}

/// Simulated instruction assistant configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstructionsConfig {
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
    /// Probability (0.0-1.0) that a fetch fails with a connection error.
    #[serde(default = "default_failure_rate")]
    pub failure_rate: f64,
    /// Random seed for reproducible runs (None = random)
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Feedback scoring configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_feedback_step")]
    pub feedback_step: u8,
}

/// Integrations configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationsConfig {
    #[serde(default = "default_whatsapp_bot_id")]
    pub whatsapp_bot_id: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub budget: BudgetConfig,
    #[serde(default)]
    pub instructions: InstructionsConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub integrations: IntegrationsConfig,
}

// Default functions
fn default_cost_per_instruction() -> f64 {
    0.02
}
fn default_base_delay_ms() -> u64 {
    800
}
fn default_jitter_ms() -> u64 {
    400
}
fn default_failure_rate() -> f64 {
    0.1
}
fn default_feedback_step() -> u8 {
    crate::scoring::FEEDBACK_STEP
}
fn default_whatsapp_bot_id() -> String {
    crate::integrations::DEFAULT_WHATSAPP_BOT_ID.into()
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            cost_per_instruction_usd: default_cost_per_instruction(),
        }
    }
}

impl Default for InstructionsConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            jitter_ms: default_jitter_ms(),
            failure_rate: default_failure_rate(),
            seed: None,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            feedback_step: default_feedback_step(),
        }
    }
}

impl Default for IntegrationsConfig {
    fn default() -> Self {
        Self {
            whatsapp_bot_id: default_whatsapp_bot_id(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(invalid("config key is empty".into()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current
                    .get_mut(part)
                    .ok_or_else(|| invalid("unknown config key".into()))?;
                continue;
            }

            let obj = current
                .as_object_mut()
                .ok_or_else(|| invalid("unknown config key".into()))?;
            let existing = obj
                .get(part)
                .ok_or_else(|| invalid("unknown config key".into()))?;

            // Optional fields serialize as null; accept a number or "none".
            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                ),
                serde_json::Value::Number(_) | serde_json::Value::Null => {
                    if existing.is_null() && value.eq_ignore_ascii_case("none") {
                        serde_json::Value::Null
                    } else if let Ok(n) = value.parse::<u64>() {
                        serde_json::Value::Number(n.into())
                    } else if let Ok(n) = value.parse::<f64>() {
                        serde_json::Number::from_f64(n)
                            .map(serde_json::Value::Number)
                            .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                    } else {
                        return Err(invalid(format!("cannot parse '{value}' as number")));
                    }
                }
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                serde_json::Value::String(_) => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(invalid("unknown config key".into()))
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults if no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults if the file is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit it.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save. Returns error if key is unknown.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let rate = self.instructions.failure_rate;
        if !(0.0..=1.0).contains(&rate) {
            return Err(ConfigError::InvalidValue {
                key: "instructions.failure_rate".into(),
                message: format!("{rate} is not within 0.0..=1.0"),
            });
        }
        let cost = self.budget.cost_per_instruction_usd;
        if !Usd::try_from_dollars(cost).is_some_and(Usd::is_positive) {
            return Err(ConfigError::InvalidValue {
                key: "budget.cost_per_instruction_usd".into(),
                message: format!("{cost} is not at least one cent"),
            });
        }
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load config, using defaults");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.budget.cost_per_instruction_usd, 0.02);
        assert_eq!(parsed.scoring.feedback_step, 3);
        assert_eq!(parsed.instructions.seed, None);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[instructions]\nfailure_rate = 0.0\n").unwrap();
        assert_eq!(parsed.instructions.failure_rate, 0.0);
        assert_eq!(parsed.instructions.base_delay_ms, 800);
        assert_eq!(parsed.budget.cost_per_instruction_usd, 0.02);
        assert_eq!(parsed.integrations.whatsapp_bot_id, "+1-555-COO-HELP");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("scoring.feedback_step").as_deref(), Some("3"));
        assert_eq!(cfg.get("instructions.failure_rate").as_deref(), Some("0.1"));
        assert_eq!(
            cfg.get("integrations.whatsapp_bot_id").as_deref(),
            Some("+1-555-COO-HELP")
        );
        assert!(cfg.get("budget.missing_key").is_none());
    }

    #[test]
    fn apply_updates_nested_number() {
        let mut cfg = Config::default();
        cfg.apply("instructions.base_delay_ms", "0").unwrap();
        assert_eq!(cfg.instructions.base_delay_ms, 0);
        cfg.apply("budget.cost_per_instruction_usd", "0.05").unwrap();
        assert_eq!(cfg.budget.cost_per_instruction_usd, 0.05);
    }

    #[test]
    fn apply_sets_and_clears_optional_seed() {
        let mut cfg = Config::default();
        cfg.apply("instructions.seed", "42").unwrap();
        assert_eq!(cfg.instructions.seed, Some(42));
        cfg.apply("instructions.seed", "none").unwrap();
        assert_eq!(cfg.instructions.seed, None);
    }

    #[test]
    fn apply_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(cfg.apply("budget.nonexistent", "1").is_err());
        assert!(cfg.apply("", "1").is_err());
    }

    #[test]
    fn apply_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.apply("scoring.feedback_step", "lots").is_err());
        assert_eq!(cfg.scoring.feedback_step, 3);
    }

    #[test]
    fn apply_rejects_out_of_range_failure_rate() {
        let mut cfg = Config::default();
        assert!(cfg.apply("instructions.failure_rate", "1.5").is_err());
        assert_eq!(cfg.instructions.failure_rate, 0.1);
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.instructions.jitter_ms, 400);
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "budget = [").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }

    #[test]
    fn apply_rejects_cost_that_rounds_to_zero_cents() {
        let mut cfg = Config::default();
        assert!(cfg.apply("budget.cost_per_instruction_usd", "0.004").is_err());
        assert!(cfg.apply("budget.cost_per_instruction_usd", "-1").is_err());
        assert!(cfg.apply("budget.cost_per_instruction_usd", "1e300").is_err());
        assert_eq!(cfg.budget.cost_per_instruction_usd, 0.02);
        cfg.apply("budget.cost_per_instruction_usd", "0.01").unwrap();
    }

    #[test]
    fn load_from_validates_hand_edited_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(&path, "[instructions]\nfailure_rate = 5.0\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::InvalidValue { .. })
        ));

        std::fs::write(&path, "[budget]\ncost_per_instruction_usd = -1.0\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
