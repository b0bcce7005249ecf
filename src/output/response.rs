//! CLI response formatting and output.
//!
//! Provides JSON envelope, printing, and exit code mapping.

use dvcflow::error::Hint;
use dvcflow::pipeline::PipelineRunStatus;
use dvcflow::{Error, ErrorCode, Result};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CliResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CliError>,
}

#[derive(Debug, Serialize)]
pub struct CliError {
    pub code: String,
    pub message: String,
    pub details: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hints: Option<Vec<Hint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

impl<T: Serialize> CliResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            Error::internal_json(e.to_string(), Some("serialize response".to_string()))
        })
    }
}

impl CliResponse<()> {
    pub fn from_error(err: &Error) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(CliError {
                code: err.code.as_str().to_string(),
                message: err.message.clone(),
                details: err.details.clone(),
                hints: if err.hints.is_empty() {
                    None
                } else {
                    Some(err.hints.clone())
                },
                retryable: err.retryable,
            }),
        }
    }
}

fn print_response<T: Serialize>(response: &CliResponse<T>) -> Result<()> {
    use std::io::{self, Write};

    let payload = response.to_json()?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", payload) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            return Ok(()); // Exit gracefully on SIGPIPE
        }
        return Err(Error::internal_io(
            e.to_string(),
            Some("write stdout".to_string()),
        ));
    }
    Ok(())
}

pub fn print_success<T: Serialize>(data: T) -> Result<()> {
    print_response(&CliResponse::success(data))
}

pub fn map_cmd_result_to_json<T: Serialize>(
    result: Result<(T, i32)>,
) -> (Result<serde_json::Value>, i32) {
    match result {
        Ok((data, exit_code)) => match serde_json::to_value(data) {
            Ok(value) => (Ok(value), exit_code),
            Err(err) => (
                Err(Error::internal_json(
                    err.to_string(),
                    Some("serialize response".to_string()),
                )),
                1,
            ),
        },
        Err(err) => {
            let exit_code = exit_code_for_error(err.code);
            (Err(err), exit_code)
        }
    }
}

pub(crate) fn exit_code_for_error(code: ErrorCode) -> i32 {
    match code {
        ErrorCode::ConfigInvalidJson
        | ErrorCode::ConfigInvalidValue
        | ErrorCode::ValidationInvalidArgument
        | ErrorCode::MetadataMissingKey
        | ErrorCode::MetadataInvalidDescriptor
        | ErrorCode::DatasetInvalid => 2,

        ErrorCode::ConfigNotFound
        | ErrorCode::GitInvalidRepository
        | ErrorCode::GitRemoteNotFound
        | ErrorCode::DatasetNotFound => 4,

        ErrorCode::GitCommandFailed
        | ErrorCode::DvcCommandFailed
        | ErrorCode::ProcessSpawnFailed
        | ErrorCode::StorageCredentialsMissing
        | ErrorCode::StorageRequestFailed => 20,

        ErrorCode::InternalIoError
        | ErrorCode::InternalJsonError
        | ErrorCode::InternalUnexpected => 1,
    }
}

/// Exit code for a finished pipeline run: any failed step makes it 1.
pub(crate) fn exit_code_for_run(status: &PipelineRunStatus) -> i32 {
    match status {
        PipelineRunStatus::Failed | PipelineRunStatus::PartialSuccess => 1,
        _ => 0,
    }
}

pub fn print_json_result(result: Result<serde_json::Value>) -> Result<()> {
    match result {
        Ok(data) => print_success(data),
        Err(err) => print_response(&CliResponse::<()>::from_error(&err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_map_to_documented_exit_codes() {
        assert_eq!(exit_code_for_error(ErrorCode::ConfigInvalidJson), 2);
        assert_eq!(exit_code_for_error(ErrorCode::ValidationInvalidArgument), 2);
        assert_eq!(exit_code_for_error(ErrorCode::DatasetNotFound), 4);
        assert_eq!(exit_code_for_error(ErrorCode::ConfigNotFound), 4);
        assert_eq!(exit_code_for_error(ErrorCode::GitInvalidRepository), 4);
        assert_eq!(exit_code_for_error(ErrorCode::DvcCommandFailed), 20);
        assert_eq!(exit_code_for_error(ErrorCode::StorageRequestFailed), 20);
        assert_eq!(exit_code_for_error(ErrorCode::InternalUnexpected), 1);
    }

    #[test]
    fn partial_runs_exit_non_zero() {
        assert_eq!(exit_code_for_run(&PipelineRunStatus::PartialSuccess), 1);
        assert_eq!(exit_code_for_run(&PipelineRunStatus::Success), 0);
        assert_eq!(exit_code_for_run(&PipelineRunStatus::Skipped), 0);
    }

    #[test]
    fn error_envelope_omits_data_and_empty_hints() {
        let err = Error::dataset_not_found("diabetes.csv");
        let json = serde_json::to_value(CliResponse::<()>::from_error(&err)).unwrap();

        assert_eq!(json["success"], false);
        assert!(json.get("data").is_none());
        assert_eq!(json["error"]["code"], "dataset.not_found");
        assert!(json["error"].get("hints").is_none());
    }

    #[test]
    fn command_result_carries_its_exit_code() {
        let (value, code) = map_cmd_result_to_json(Ok((serde_json::json!({"rows": 2}), 1)));
        assert_eq!(value.unwrap()["rows"], 2);
        assert_eq!(code, 1);

        let (value, code) =
            map_cmd_result_to_json::<()>(Err(Error::git_invalid_repository("/tmp/x")));
        assert!(value.is_err());
        assert_eq!(code, 4);
    }
}
