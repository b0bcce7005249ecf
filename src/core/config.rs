//! Pipeline configuration loaded from `dvcflow.json`.
//!
//! Precedence, lowest first: built-in defaults, the JSON file, CLI overrides.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pipeline::FailurePolicy;
use crate::utils::io;
use crate::workflow::plan::STEP_IDS;

pub const CONFIG_FILE: &str = "dvcflow.json";

static BUCKET_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9.-]{1,61}[a-z0-9]$").unwrap());

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default = "default_dataset_path")]
    pub dataset_path: String,

    #[serde(default = "default_bucket_name")]
    pub bucket_name: String,

    #[serde(default = "default_region")]
    pub region: String,

    /// Falls back to the dataset file name up to its first `.`.
    #[serde(default)]
    pub branch_name: Option<String>,

    #[serde(default = "default_remote_name")]
    pub remote_name: String,

    #[serde(default = "default_tag_name")]
    pub tag_name: String,

    #[serde(default = "default_remote_name")]
    pub tag_remote: String,

    #[serde(default = "default_dvc_remote_name")]
    pub dvc_remote_name: String,

    #[serde(default)]
    pub commit_message: Option<String>,

    #[serde(default)]
    pub descriptor_files: Option<Vec<String>>,

    /// `null` disables the metadata step.
    #[serde(default = "default_metadata_output")]
    pub metadata_output: Option<String>,

    #[serde(default)]
    pub storage_endpoint: Option<String>,

    #[serde(default = "default_dvc_program")]
    pub dvc_program: String,

    #[serde(default)]
    pub on_failure: FailurePolicy,

    #[serde(default)]
    pub skip_steps: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dataset_path: default_dataset_path(),
            bucket_name: default_bucket_name(),
            region: default_region(),
            branch_name: None,
            remote_name: default_remote_name(),
            tag_name: default_tag_name(),
            tag_remote: default_remote_name(),
            dvc_remote_name: default_dvc_remote_name(),
            commit_message: None,
            descriptor_files: None,
            metadata_output: default_metadata_output(),
            storage_endpoint: None,
            dvc_program: default_dvc_program(),
            on_failure: FailurePolicy::default(),
            skip_steps: Vec::new(),
        }
    }
}

fn default_dataset_path() -> String {
    "diabetes.csv".to_string()
}

fn default_bucket_name() -> String {
    "daas3dvctest".to_string()
}

fn default_region() -> String {
    "ap-south-1".to_string()
}

fn default_remote_name() -> String {
    "origin".to_string()
}

fn default_tag_name() -> String {
    "v1.0".to_string()
}

fn default_dvc_remote_name() -> String {
    crate::storage::DEFAULT_DVC_REMOTE.to_string()
}

fn default_metadata_output() -> Option<String> {
    Some(crate::metadata::DEFAULT_OUTPUT.to_string())
}

fn default_dvc_program() -> String {
    crate::dvc::DEFAULT_PROGRAM.to_string()
}

impl PipelineConfig {
    pub fn effective_branch(&self) -> String {
        if let Some(name) = &self.branch_name {
            return name.clone();
        }
        let file_name = Path::new(&self.dataset_path)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.dataset_path.clone());
        file_name
            .split('.')
            .next()
            .unwrap_or_default()
            .to_string()
    }

    pub fn effective_commit_message(&self) -> String {
        self.commit_message
            .clone()
            .unwrap_or_else(|| format!("Add updated {} to DVC", self.dataset_path))
    }

    pub fn effective_descriptor_files(&self) -> Vec<String> {
        self.descriptor_files
            .clone()
            .unwrap_or_else(|| vec![format!("{}.dvc", self.dataset_path)])
    }

    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(v) = &overrides.dataset_path {
            self.dataset_path = v.clone();
        }
        if let Some(v) = &overrides.bucket_name {
            self.bucket_name = v.clone();
        }
        if let Some(v) = &overrides.region {
            self.region = v.clone();
        }
        if let Some(v) = &overrides.branch_name {
            self.branch_name = Some(v.clone());
        }
        if let Some(v) = &overrides.remote_name {
            self.remote_name = v.clone();
        }
        if let Some(v) = &overrides.tag_name {
            self.tag_name = v.clone();
        }
        if let Some(v) = &overrides.dvc_remote_name {
            self.dvc_remote_name = v.clone();
        }
        if let Some(v) = &overrides.commit_message {
            self.commit_message = Some(v.clone());
        }
        if overrides.abort_on_failure {
            self.on_failure = FailurePolicy::Abort;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let required = [
            ("dataset_path", &self.dataset_path),
            ("region", &self.region),
            ("remote_name", &self.remote_name),
            ("tag_name", &self.tag_name),
            ("tag_remote", &self.tag_remote),
            ("dvc_remote_name", &self.dvc_remote_name),
            ("dvc_program", &self.dvc_program),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(Error::config_invalid_value(
                    key,
                    Some(value.clone()),
                    "must not be empty",
                ));
            }
        }

        if self.effective_branch().trim().is_empty() {
            return Err(Error::config_invalid_value(
                "branch_name",
                self.branch_name.clone(),
                "must not be empty",
            ));
        }

        if !is_valid_bucket_name(&self.bucket_name) {
            return Err(Error::config_invalid_value(
                "bucket_name",
                Some(self.bucket_name.clone()),
                "must be 3-63 characters of lowercase letters, digits, '.' or '-', starting and ending with a letter or digit",
            )
            .with_hint("Bucket names follow S3 naming rules"));
        }

        if let Some(unknown) = self
            .skip_steps
            .iter()
            .find(|id| !STEP_IDS.contains(&id.as_str()))
        {
            return Err(Error::config_invalid_value(
                "skip_steps",
                Some(unknown.clone()),
                "is not a known step id",
            )
            .with_hint(format!("Known steps: {}", STEP_IDS.join(", "))));
        }

        Ok(())
    }
}

pub fn is_valid_bucket_name(name: &str) -> bool {
    BUCKET_NAME.is_match(name) && !name.contains("..")
}

/// Values supplied on the command line; `None` keeps the configured value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub dataset_path: Option<String>,
    pub bucket_name: Option<String>,
    pub region: Option<String>,
    pub branch_name: Option<String>,
    pub remote_name: Option<String>,
    pub tag_name: Option<String>,
    pub dvc_remote_name: Option<String>,
    pub commit_message: Option<String>,
    pub abort_on_failure: bool,
}

/// Resolve which config file applies, if any.
///
/// An explicit path must exist. Without one, `dvcflow.json` in `workdir` is
/// used when present.
pub fn config_path(explicit: Option<&str>, workdir: &Path) -> Result<Option<PathBuf>> {
    if let Some(raw) = explicit {
        let path = io::expand_home(raw);
        if !path.is_file() {
            return Err(Error::config_not_found(path.display().to_string()));
        }
        return Ok(Some(path));
    }

    let local = workdir.join(CONFIG_FILE);
    Ok(local.is_file().then_some(local))
}

pub fn parse(content: &str, path: &str) -> Result<PipelineConfig> {
    serde_json::from_str(content).map_err(|e| Error::config_invalid_json(path, e))
}

pub fn load(explicit: Option<&str>, workdir: &Path) -> Result<PipelineConfig> {
    match config_path(explicit, workdir)? {
        Some(path) => {
            let display = path.display().to_string();
            let content = io::read_file(&path, &format!("read config {}", display))?;
            parse(&content, &display)
        }
        None => Ok(PipelineConfig::default()),
    }
}

/// Load, apply CLI overrides, then validate.
pub fn resolve(
    explicit: Option<&str>,
    workdir: &Path,
    overrides: &ConfigOverrides,
) -> Result<PipelineConfig> {
    let mut config = load(explicit, workdir)?;
    config.apply(overrides);
    config.validate()?;
    Ok(config)
}
