use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::workflow::{AlertThresholds, RfqWorkflow};

pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["rfqflow.toml", "config/rfqflow.toml"];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub alerts: AlertThresholds,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Compact }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub deadline_warning_days: Option<u32>,
    pub overdue_days: Option<u32>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATHS[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn workflow(&self) -> RfqWorkflow {
        RfqWorkflow::new(self.alerts)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(alerts) = patch.alerts {
            if let Some(days) = alerts.deadline_warning_days {
                self.alerts.deadline_warning_days = days;
            }
            if let Some(days) = alerts.no_response_days {
                self.alerts.no_response_days = days;
            }
            if let Some(pct) = alerts.low_response_rate_pct {
                self.alerts.low_response_rate_pct = pct;
            }
            if let Some(days) = alerts.low_response_window_days {
                self.alerts.low_response_window_days = days;
            }
            if let Some(days) = alerts.overdue_days {
                self.alerts.overdue_days = days;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("RFQFLOW_ALERTS_DEADLINE_WARNING_DAYS") {
            self.alerts.deadline_warning_days =
                parse_u32("RFQFLOW_ALERTS_DEADLINE_WARNING_DAYS", &value)?;
        }
        if let Some(value) = read_env("RFQFLOW_ALERTS_NO_RESPONSE_DAYS") {
            self.alerts.no_response_days = parse_u32("RFQFLOW_ALERTS_NO_RESPONSE_DAYS", &value)?;
        }
        if let Some(value) = read_env("RFQFLOW_ALERTS_LOW_RESPONSE_RATE_PCT") {
            self.alerts.low_response_rate_pct =
                parse_u32("RFQFLOW_ALERTS_LOW_RESPONSE_RATE_PCT", &value)?;
        }
        if let Some(value) = read_env("RFQFLOW_ALERTS_LOW_RESPONSE_WINDOW_DAYS") {
            self.alerts.low_response_window_days =
                parse_u32("RFQFLOW_ALERTS_LOW_RESPONSE_WINDOW_DAYS", &value)?;
        }
        if let Some(value) = read_env("RFQFLOW_ALERTS_OVERDUE_DAYS") {
            self.alerts.overdue_days = parse_u32("RFQFLOW_ALERTS_OVERDUE_DAYS", &value)?;
        }

        let log_level = read_env("RFQFLOW_LOGGING_LEVEL").or_else(|| read_env("RFQFLOW_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("RFQFLOW_LOGGING_FORMAT").or_else(|| read_env("RFQFLOW_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(days) = overrides.deadline_warning_days {
            self.alerts.deadline_warning_days = days;
        }
        if let Some(days) = overrides.overdue_days {
            self.alerts.overdue_days = days;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_alerts(&self.alerts)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    DEFAULT_CONFIG_PATHS.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

/// Expands `${VAR}` references from the process environment.
pub fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_alerts(alerts: &AlertThresholds) -> Result<(), ConfigError> {
    let checks = [
        ("alerts.deadline_warning_days", alerts.deadline_warning_days, 30),
        ("alerts.no_response_days", alerts.no_response_days, 90),
        ("alerts.low_response_rate_pct", alerts.low_response_rate_pct, 100),
        ("alerts.low_response_window_days", alerts.low_response_window_days, 30),
        ("alerts.overdue_days", alerts.overdue_days, 365),
    ];

    for (key, value, max) in checks {
        if value == 0 || value > max {
            return Err(ConfigError::Validation(format!("{key} must be in range 1..={max}")));
        }
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigPatch {
    alerts: Option<AlertsPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct AlertsPatch {
    deadline_warning_days: Option<u32>,
    no_response_days: Option<u32>,
    low_response_rate_pct: Option<u32>,
    low_response_window_days: Option<u32>,
    overdue_days: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
    use crate::workflow::AlertThresholds;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const RFQFLOW_VARS: [&str; 9] = [
        "RFQFLOW_ALERTS_DEADLINE_WARNING_DAYS",
        "RFQFLOW_ALERTS_NO_RESPONSE_DAYS",
        "RFQFLOW_ALERTS_LOW_RESPONSE_RATE_PCT",
        "RFQFLOW_ALERTS_LOW_RESPONSE_WINDOW_DAYS",
        "RFQFLOW_ALERTS_OVERDUE_DAYS",
        "RFQFLOW_LOGGING_LEVEL",
        "RFQFLOW_LOG_LEVEL",
        "RFQFLOW_LOGGING_FORMAT",
        "RFQFLOW_LOG_FORMAT",
    ];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    fn write_config(dir: &TempDir, body: &str) -> Result<std::path::PathBuf, String> {
        let path = dir.path().join("rfqflow.toml");
        fs::write(&path, body).map_err(|err| err.to_string())?;
        Ok(path)
    }

    #[test]
    fn defaults_match_documented_thresholds() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&RFQFLOW_VARS);

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.alerts == AlertThresholds::default(), "alerts should use defaults")?;
        ensure(config.logging.level == "info", "default log level should be info")?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&RFQFLOW_VARS);
        env::set_var("TEST_RFQFLOW_OVERDUE", "14");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = write_config(
                &dir,
                r#"
[alerts]
overdue_days = ${TEST_RFQFLOW_OVERDUE}
"#,
            )?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.alerts.overdue_days == 14, "overdue days should come from environment")
        })();

        clear_vars(&["TEST_RFQFLOW_OVERDUE"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&RFQFLOW_VARS);
        env::set_var("RFQFLOW_ALERTS_NO_RESPONSE_DAYS", "5");
        env::set_var("RFQFLOW_ALERTS_OVERDUE_DAYS", "10");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = write_config(
                &dir,
                r#"
[alerts]
deadline_warning_days = 4
no_response_days = 6
overdue_days = 12

[logging]
level = "warn"
format = "json"
"#,
            )?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    overdue_days: Some(21),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.alerts.deadline_warning_days == 4, "file value should beat default")?;
            ensure(config.alerts.no_response_days == 5, "env value should beat file")?;
            ensure(config.alerts.overdue_days == 21, "explicit override should win")?;
            ensure(config.alerts.low_response_rate_pct == 50, "untouched keys keep defaults")?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(matches!(config.logging.format, LogFormat::Json), "file format should apply")
        })();

        clear_vars(&["RFQFLOW_ALERTS_NO_RESPONSE_DAYS", "RFQFLOW_ALERTS_OVERDUE_DAYS"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&RFQFLOW_VARS);
        env::set_var("RFQFLOW_LOG_LEVEL", "warn");
        env::set_var("RFQFLOW_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )
        })();

        clear_vars(&["RFQFLOW_LOG_LEVEL", "RFQFLOW_LOG_FORMAT"]);
        result
    }

    #[test]
    fn out_of_range_threshold_fails_validation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&RFQFLOW_VARS);
        env::set_var("RFQFLOW_ALERTS_LOW_RESPONSE_RATE_PCT", "150");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            ensure(
                matches!(
                    error,
                    ConfigError::Validation(ref message)
                        if message.contains("alerts.low_response_rate_pct")
                ),
                "validation failure should name the offending key",
            )
        })();

        clear_vars(&["RFQFLOW_ALERTS_LOW_RESPONSE_RATE_PCT"]);
        result
    }

    #[test]
    fn non_numeric_env_override_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&RFQFLOW_VARS);
        env::set_var("RFQFLOW_ALERTS_OVERDUE_DAYS", "a week");

        let result = match AppConfig::load(LoadOptions::default()) {
            Err(ConfigError::InvalidEnvOverride { key, .. }) => {
                ensure(key == "RFQFLOW_ALERTS_OVERDUE_DAYS", "error should name the variable")
            }
            other => Err(format!("expected invalid override error, got {other:?}")),
        };

        clear_vars(&["RFQFLOW_ALERTS_OVERDUE_DAYS"]);
        result
    }

    #[test]
    fn required_missing_file_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&RFQFLOW_VARS);

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let missing = dir.path().join("absent.toml");
        let result = AppConfig::load(LoadOptions {
            config_path: Some(missing.clone()),
            require_file: true,
            ..LoadOptions::default()
        });

        ensure(
            matches!(result, Err(ConfigError::MissingConfigFile(ref path)) if *path == missing),
            "missing required file should be reported with its path",
        )
    }

    #[test]
    fn unknown_keys_are_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&RFQFLOW_VARS);

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = write_config(&dir, "[alerts]\noverdue_dayz = 3\n")?;
        let result =
            AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() });

        ensure(matches!(result, Err(ConfigError::ParseFile { .. })), "typos should fail parsing")
    }
}
