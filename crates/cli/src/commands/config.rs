use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rfqflow_core::config::{
    interpolate_env_vars, AppConfig, ConfigOverrides, LogFormat, DEFAULT_CONFIG_PATHS,
};
use serde::Serialize;
use toml::Value;

use crate::commands::CommandResult;

#[derive(Debug, Serialize)]
struct ConfigEntry {
    key: &'static str,
    value: String,
    source: String,
}

struct FieldSpec {
    key: &'static str,
    env_keys: &'static [&'static str],
    overridden: bool,
    value: String,
}

pub fn run(
    config: &AppConfig,
    explicit_path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> CommandResult {
    let config_file_path = detect_config_path(explicit_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let alerts = &config.alerts;
    let fields = [
        FieldSpec {
            key: "alerts.deadline_warning_days",
            env_keys: &["RFQFLOW_ALERTS_DEADLINE_WARNING_DAYS"],
            overridden: overrides.deadline_warning_days.is_some(),
            value: alerts.deadline_warning_days.to_string(),
        },
        FieldSpec {
            key: "alerts.no_response_days",
            env_keys: &["RFQFLOW_ALERTS_NO_RESPONSE_DAYS"],
            overridden: false,
            value: alerts.no_response_days.to_string(),
        },
        FieldSpec {
            key: "alerts.low_response_rate_pct",
            env_keys: &["RFQFLOW_ALERTS_LOW_RESPONSE_RATE_PCT"],
            overridden: false,
            value: alerts.low_response_rate_pct.to_string(),
        },
        FieldSpec {
            key: "alerts.low_response_window_days",
            env_keys: &["RFQFLOW_ALERTS_LOW_RESPONSE_WINDOW_DAYS"],
            overridden: false,
            value: alerts.low_response_window_days.to_string(),
        },
        FieldSpec {
            key: "alerts.overdue_days",
            env_keys: &["RFQFLOW_ALERTS_OVERDUE_DAYS"],
            overridden: overrides.overdue_days.is_some(),
            value: alerts.overdue_days.to_string(),
        },
        FieldSpec {
            key: "logging.level",
            env_keys: &["RFQFLOW_LOGGING_LEVEL", "RFQFLOW_LOG_LEVEL"],
            overridden: overrides.log_level.is_some(),
            value: config.logging.level.clone(),
        },
        FieldSpec {
            key: "logging.format",
            env_keys: &["RFQFLOW_LOGGING_FORMAT", "RFQFLOW_LOG_FORMAT"],
            overridden: overrides.log_format.is_some(),
            value: log_format_name(config.logging.format).to_string(),
        },
    ];

    let entries: Vec<ConfigEntry> = fields
        .into_iter()
        .map(|field| ConfigEntry {
            key: field.key,
            source: field_source(&field, config_file_doc.as_ref(), config_file_path.as_deref()),
            value: field.value,
        })
        .collect();

    CommandResult::success_with_data(
        "config",
        "effective config (source precedence: override > env > file > default)",
        &entries,
    )
}

fn detect_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then(|| path.to_path_buf());
    }

    DEFAULT_CONFIG_PATHS.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    interpolate_env_vars(&raw).ok()?.parse::<Value>().ok()
}

fn field_source(
    field: &FieldSpec,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if field.overridden {
        return "override".to_string();
    }

    let env_key = field
        .env_keys
        .iter()
        .find(|key| env::var(key).is_ok_and(|value| !value.trim().is_empty()));
    if let Some(env_key) = env_key {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, field.key) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn log_format_name(format: LogFormat) -> &'static str {
    match format {
        LogFormat::Compact => "compact",
        LogFormat::Pretty => "pretty",
        LogFormat::Json => "json",
    }
}
