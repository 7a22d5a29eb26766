pub mod catalog;
pub mod config;
pub mod doctor;
pub mod recommend;
pub mod seed;

use basket_core::config::{AppConfig, LoadOptions};
use basket_core::errors::ApplicationError;
use basket_core::{ArtifactBundle, Recommender};
use serde::Serialize;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_ARTIFACTS: u8 = 3;
pub const EXIT_INVALID_ARGUMENT: u8 = 4;
pub const EXIT_ARTIFACT_WRITE: u8 = 5;

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
    correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<&'static str>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            correlation_id: None,
            hint: None,
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
            correlation_id: None,
            hint: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Failure mapped through the interface error layer, tagged with the
    /// request's correlation id.
    pub fn interface_failure(
        command: &str,
        error_class: &str,
        error: ApplicationError,
        correlation_id: &str,
        exit_code: u8,
    ) -> Self {
        let interface = error.into_interface(correlation_id);
        tracing::warn!(
            event_name = "cli.command.failed",
            command,
            error_class,
            correlation_id,
            error = %interface,
            "command failed"
        );

        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: interface.to_string(),
            correlation_id: Some(interface.correlation_id().to_string()),
            hint: Some(interface.user_message()),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

pub(crate) fn load_config(
    command: &str,
    options: &LoadOptions,
    correlation_id: &str,
) -> Result<AppConfig, CommandResult> {
    AppConfig::load(options.clone()).map_err(|error| {
        CommandResult::interface_failure(
            command,
            "config_validation",
            ApplicationError::Configuration(error.to_string()),
            correlation_id,
            EXIT_CONFIG,
        )
    })
}

/// Load config and artifacts, mapping startup failures to command payloads.
pub(crate) fn load_recommender(
    command: &str,
    options: &LoadOptions,
    correlation_id: &str,
) -> Result<(AppConfig, Recommender), CommandResult> {
    let config = load_config(command, options, correlation_id)?;

    let bundle = ArtifactBundle::load(&config.artifacts).map_err(|error| {
        CommandResult::interface_failure(
            command,
            "artifact_load",
            ApplicationError::from(error),
            correlation_id,
            EXIT_ARTIFACTS,
        )
    })?;

    Ok((config, Recommender::from(bundle)))
}

pub(crate) fn serialize_json<T: Serialize>(command: &str, payload: &T) -> CommandResult {
    match serde_json::to_string(payload) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::failure(command, "serialization", error.to_string(), 1),
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
