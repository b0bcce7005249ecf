use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::PipelineConfig;
use crate::dvc::Dvc;
use crate::error::{Error, Result};
use crate::git::{self, Repo};
use crate::pipeline::{PipelineRunStatus, PipelineStep, PipelineStepExecutor, PipelineStepResult};
use crate::storage::{self, BucketStore, S3Client};
use crate::utils::io;
use crate::{dataset, metadata};

use super::plan::*;

/// Runs workflow steps against one working directory.
///
/// The repository handle produced by `git.init` is reused by later git
/// steps. When `git.init` is disabled the directory is opened instead.
pub struct WorkflowExecutor {
    workdir: PathBuf,
    config: PipelineConfig,
    repo: Option<Repo>,
    dvc: Dvc,
    store: Option<Box<dyn BucketStore>>,
}

impl WorkflowExecutor {
    pub fn new(workdir: &Path, config: PipelineConfig) -> Self {
        let dvc = Dvc::new(workdir, config.dvc_program.clone());
        Self {
            workdir: workdir.to_path_buf(),
            config,
            repo: None,
            dvc,
            store: None,
        }
    }

    /// Use `store` instead of connecting to S3.
    pub fn with_store(mut self, store: Box<dyn BucketStore>) -> Self {
        self.store = Some(store);
        self
    }

    fn repo(&mut self) -> Result<&Repo> {
        if self.repo.is_none() {
            self.repo = Some(Repo::open(&self.workdir)?);
        }
        self.repo
            .as_ref()
            .ok_or_else(|| Error::internal_unexpected("repository handle unavailable"))
    }

    fn store(&mut self) -> Result<&dyn BucketStore> {
        if self.store.is_none() {
            let client = S3Client::new(
                &self.config.region,
                self.config.storage_endpoint.as_deref(),
            )?;
            self.store = Some(Box::new(client));
        }
        self.store
            .as_deref()
            .ok_or_else(|| Error::internal_unexpected("storage client unavailable"))
    }

    fn resolve(&self, path: &str) -> PathBuf {
        io::resolve_path(&self.workdir, path)
    }

    fn init_repo(&mut self) -> Result<serde_json::Value> {
        let (repo, output) = Repo::init(&self.workdir)?;
        self.repo = Some(repo);
        to_data(&output)
    }

    fn configure_remote(&mut self) -> Result<serde_json::Value> {
        let bucket = self.config.bucket_name.clone();
        let region = self.config.region.clone();
        let remote_name = self.config.dvc_remote_name.clone();
        let dvc = self.dvc.clone();
        let store = self.store()?;
        let output = storage::configure_remote(store, &dvc, &bucket, &region, &remote_name)?;
        to_data(&output)
    }

    fn extract_metadata(&self) -> Result<serde_json::Value> {
        let output = self
            .config
            .metadata_output
            .as_deref()
            .unwrap_or(metadata::DEFAULT_OUTPUT);
        let descriptors: Vec<PathBuf> = self
            .config
            .effective_descriptor_files()
            .iter()
            .map(|d| self.resolve(d))
            .collect();
        let result = metadata::extract_to_file(&descriptors, &self.resolve(output))?;
        to_data(&result)
    }
}

fn to_data<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value)
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize step output".to_string())))
}

fn finished(step: &PipelineStep, data: serde_json::Value) -> PipelineStepResult {
    let mut result = PipelineStepResult::new(step, PipelineRunStatus::Success);
    result.data = Some(data);
    result
}

impl PipelineStepExecutor for WorkflowExecutor {
    fn execute_step(&mut self, step: &PipelineStep) -> Result<PipelineStepResult> {
        let data = match step.id.as_str() {
            GIT_INIT => self.init_repo()?,
            DVC_INIT => to_data(&self.dvc.init()?)?,
            STORAGE_REMOTE => self.configure_remote()?,
            GIT_BRANCH => {
                let branch = self.config.effective_branch();
                to_data(&git::ensure_branch(self.repo()?, &branch)?)?
            }
            DVC_ADD => to_data(&self.dvc.add(&self.config.dataset_path)?)?,
            GIT_COMMIT => {
                let message = self.config.effective_commit_message();
                to_data(&git::commit(self.repo()?, &message)?)?
            }
            DVC_PUSH => to_data(&self.dvc.push()?)?,
            GIT_PUSH => {
                let remote = self.config.remote_name.clone();
                let branch = self.config.effective_branch();
                let output = git::push_branch(self.repo()?, &remote, &branch)?;
                if output.skipped {
                    let mut result = PipelineStepResult::new(step, PipelineRunStatus::Skipped);
                    result.warnings.extend(output.reason.clone());
                    result.data = Some(to_data(&output)?);
                    return Ok(result);
                }
                to_data(&output)?
            }
            GIT_TAG => {
                let tag = self.config.tag_name.clone();
                to_data(&git::create_tag(self.repo()?, &tag)?)?
            }
            GIT_PUSH_TAG => {
                let remote = self.config.tag_remote.clone();
                let tag = self.config.tag_name.clone();
                to_data(&git::push_tag(self.repo()?, &remote, &tag)?)?
            }
            DVC_CHECKOUT => to_data(&self.dvc.checkout()?)?,
            DATASET_LOAD => {
                let path = self.resolve(&self.config.dataset_path);
                to_data(&dataset::load(&path)?)?
            }
            METADATA_EXTRACT => self.extract_metadata()?,
            other => {
                return Err(Error::validation_invalid_argument(
                    "step",
                    format!("Unknown step '{}'", other),
                    Some(other.to_string()),
                    Some(STEP_IDS.iter().map(|s| s.to_string()).collect()),
                ))
            }
        };
        Ok(finished(step, data))
    }
}
