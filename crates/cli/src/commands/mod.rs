pub mod config;
pub mod inspect;
pub mod plan;
pub mod report;
pub mod stages;
pub mod transition;

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use rfqflow_core::{ApplicationError, DomainError, RfqSnapshot};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data: None,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: &impl Serialize,
    ) -> Self {
        let data = match serde_json::to_value(data) {
            Ok(data) => data,
            Err(error) => {
                return Self::failure(
                    command,
                    "serialization",
                    format!("could not encode command output: {error}"),
                    1,
                );
            }
        };

        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data: Some(data),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn from_error(command: &str, error: &ApplicationError) -> Self {
        let (error_class, exit_code) = match error {
            ApplicationError::Configuration(_) => ("config_validation", 2),
            ApplicationError::Domain(
                DomainError::ActionNotAllowed { .. } | DomainError::InvalidTransition { .. },
            ) => ("transition_denied", 4),
            ApplicationError::Domain(_) | ApplicationError::Input(_) => ("input", 3),
        };
        Self::failure(command, error_class, error.to_string(), exit_code)
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn read_json_file(path: &Path) -> Result<Value, ApplicationError> {
    let raw = fs::read_to_string(path).map_err(|error| {
        ApplicationError::Input(format!("could not read `{}`: {error}", path.display()))
    })?;

    serde_json::from_str(&raw).map_err(|error| {
        ApplicationError::Input(format!("`{}` is not valid JSON: {error}", path.display()))
    })
}

pub(crate) fn load_snapshot(path: &Path) -> Result<RfqSnapshot, ApplicationError> {
    let value = read_json_file(path)?;
    Ok(RfqSnapshot::from_json_value(value)?)
}

pub(crate) fn resolve_now(now: Option<&str>) -> Result<DateTime<Utc>, ApplicationError> {
    match now {
        None => Ok(Utc::now()),
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|instant| instant.with_timezone(&Utc))
            .map_err(|error| {
                ApplicationError::Input(format!("`{raw}` is not an RFC 3339 timestamp: {error}"))
            }),
    }
}
