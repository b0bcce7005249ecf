use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigNotFound,
    ConfigInvalidJson,
    ConfigInvalidValue,

    ValidationInvalidArgument,

    GitCommandFailed,
    GitInvalidRepository,
    GitRemoteNotFound,

    DvcCommandFailed,
    ProcessSpawnFailed,

    StorageCredentialsMissing,
    StorageRequestFailed,

    MetadataMissingKey,
    MetadataInvalidDescriptor,

    DatasetNotFound,
    DatasetInvalid,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigNotFound => "config.not_found",
            ErrorCode::ConfigInvalidJson => "config.invalid_json",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",

            ErrorCode::GitCommandFailed => "git.command_failed",
            ErrorCode::GitInvalidRepository => "git.invalid_repository",
            ErrorCode::GitRemoteNotFound => "git.remote_not_found",

            ErrorCode::DvcCommandFailed => "dvc.command_failed",
            ErrorCode::ProcessSpawnFailed => "process.spawn_failed",

            ErrorCode::StorageCredentialsMissing => "storage.credentials_missing",
            ErrorCode::StorageRequestFailed => "storage.request_failed",

            ErrorCode::MetadataMissingKey => "metadata.missing_key",
            ErrorCode::MetadataInvalidDescriptor => "metadata.invalid_descriptor",

            ErrorCode::DatasetNotFound => "dataset.not_found",
            ErrorCode::DatasetInvalid => "dataset.invalid",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigNotFoundDetails {
    pub path: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidJsonDetails {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
    pub retryable: Option<bool>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tried: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalJsonErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Captured result of an external command that exited non-zero.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandFailedDetails {
    pub command: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageRequestFailedDetails {
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_code: Option<String>,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataDetails {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
            retryable: None,
        }
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        id: Option<String>,
        tried: Option<Vec<String>>,
    ) -> Self {
        let problem = problem.into();
        let details = to_details(InvalidArgumentDetails {
            field: field.into(),
            problem: problem.clone(),
            id,
            tried,
        });

        Self::new(
            ErrorCode::ValidationInvalidArgument,
            format!("Invalid argument: {}", problem),
            details,
        )
    }

    pub fn config_not_found(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::ConfigNotFound,
            format!("Configuration file not found: {}", path),
            to_details(ConfigNotFoundDetails { path }),
        )
        .with_hint("Check the --config path")
    }

    pub fn config_invalid_json(path: impl Into<String>, err: serde_json::Error) -> Self {
        let path = path.into();
        let message = format!("Invalid JSON in configuration {}", path);
        Self::new(
            ErrorCode::ConfigInvalidJson,
            message,
            to_details(ConfigInvalidJsonDetails {
                path,
                error: err.to_string(),
            }),
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        let key = key.into();
        let problem = problem.into();
        let message = format!("Invalid configuration value '{}': {}", key, problem);
        Self::new(
            ErrorCode::ConfigInvalidValue,
            message,
            to_details(ConfigInvalidValueDetails {
                key,
                value,
                problem,
            }),
        )
    }

    pub fn git_command_failed(details: CommandFailedDetails) -> Self {
        let message = format!("git command failed: {}", first_line(&details.stderr, &details.stdout));
        Self::new(ErrorCode::GitCommandFailed, message, to_details(details))
    }

    pub fn git_invalid_repository(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::GitInvalidRepository,
            "The given path is not a valid Git repository",
            serde_json::json!({ "path": path }),
        )
        .with_hint("Run 'dvcflow init' to initialize the repository")
    }

    pub fn git_remote_not_found(remote: impl Into<String>, available: Vec<String>) -> Self {
        let remote = remote.into();
        Self::new(
            ErrorCode::GitRemoteNotFound,
            format!("Remote '{}' not found", remote),
            serde_json::json!({ "remote": remote, "available": available }),
        )
        .with_hint(format!("Register it with: git remote add {} <url>", remote))
    }

    pub fn dvc_command_failed(details: CommandFailedDetails) -> Self {
        let message = format!("dvc command failed: {}", first_line(&details.stderr, &details.stdout));
        Self::new(ErrorCode::DvcCommandFailed, message, to_details(details))
    }

    pub fn process_spawn_failed(program: impl Into<String>, error: impl Into<String>) -> Self {
        let program = program.into();
        Self::new(
            ErrorCode::ProcessSpawnFailed,
            format!("Failed to start '{}'", program),
            serde_json::json!({ "program": program, "error": error.into() }),
        )
        .with_hint(format!("Make sure '{}' is installed and on PATH", program))
    }

    pub fn storage_credentials_missing(profile: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::StorageCredentialsMissing,
            "No AWS credentials found",
            serde_json::json!({ "profile": profile.into() }),
        )
        .with_hint("Set AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY, or configure ~/.aws/credentials")
    }

    pub fn storage_request_failed(details: StorageRequestFailedDetails) -> Self {
        let message = format!("Storage request '{}' failed: {}", details.operation, details.error);
        let retryable = details.status.map(|s| s >= 500);
        let mut err = Self::new(ErrorCode::StorageRequestFailed, message, to_details(details));
        err.retryable = retryable;
        err
    }

    pub fn metadata_missing_key(path: impl Into<String>, key: impl Into<String>) -> Self {
        let path = path.into();
        let key = key.into();
        Self::new(
            ErrorCode::MetadataMissingKey,
            format!("Descriptor {} has no '{}' entry", path, key),
            to_details(MetadataDetails {
                path,
                key: Some(key),
                error: None,
            }),
        )
    }

    pub fn metadata_invalid_descriptor(path: impl Into<String>, error: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::MetadataInvalidDescriptor,
            format!("Descriptor {} could not be parsed", path),
            to_details(MetadataDetails {
                path,
                key: None,
                error: Some(error.into()),
            }),
        )
    }

    pub fn dataset_not_found(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::DatasetNotFound,
            format!("Dataset not found: {}", path),
            serde_json::json!({ "path": path }),
        )
    }

    pub fn dataset_invalid(path: impl Into<String>, error: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::DatasetInvalid,
            format!("Dataset {} could not be read as CSV", path),
            serde_json::json!({ "path": path, "error": error.into() }),
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalIoError,
            "IO error",
            to_details(InternalIoErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalJsonError,
            "JSON error",
            to_details(InternalJsonErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InternalUnexpected,
            "Unexpected error",
            serde_json::json!({ "error": error.into() }),
        )
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }
}

fn first_line<'a>(stderr: &'a str, stdout: &'a str) -> &'a str {
    let text = if stderr.trim().is_empty() { stdout } else { stderr };
    text.lines().find(|l| !l.trim().is_empty()).unwrap_or("no output").trim()
}
