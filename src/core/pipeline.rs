//! Sequential step pipeline.
//!
//! Steps run in declaration order. A step whose `needs` did not succeed is
//! skipped, and the failure policy decides whether a failed step stops
//! the rest of the run.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStep {
    pub id: String,
    #[serde(rename = "type")]
    pub step_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub needs: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub config: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelinePlan {
    pub steps: Vec<PipelinePlanStep>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelinePlanStep {
    pub id: String,
    #[serde(rename = "type")]
    pub step_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub needs: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub config: HashMap<String, serde_json::Value>,
    pub status: PipelineStepStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStepStatus {
    Ready,
    Missing,
    Disabled,
}

/// What to do with the remaining steps once one fails.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    #[default]
    Continue,
    Abort,
}

pub trait PipelineCapabilityResolver {
    fn is_supported(&self, step_type: &str) -> bool;
    fn missing(&self, step_type: &str) -> Vec<String>;
}

pub trait PipelineStepExecutor {
    fn execute_step(&mut self, step: &PipelineStep) -> Result<PipelineStepResult>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStepResult {
    pub id: String,
    #[serde(rename = "type")]
    pub step_type: String,
    pub status: PipelineRunStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<crate::error::Hint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PipelineStepResult {
    pub fn new(step: &PipelineStep, status: PipelineRunStatus) -> Self {
        Self {
            id: step.id.clone(),
            step_type: step.step_type.clone(),
            status,
            missing: Vec::new(),
            warnings: Vec::new(),
            hints: Vec::new(),
            data: None,
            error: None,
        }
    }

    fn skipped(step: &PipelineStep, warning: String) -> Self {
        let mut result = Self::new(step, PipelineRunStatus::Skipped);
        result.warnings.push(warning);
        result
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRunResult {
    pub steps: Vec<PipelineStepResult>,
    pub status: PipelineRunStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<PipelineRunSummary>,
}

impl PipelineRunResult {
    pub fn step(&self, id: &str) -> Option<&PipelineStepResult> {
        self.steps.iter().find(|s| s.id == id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRunSummary {
    pub total_steps: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub missing: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub next_actions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelineRunStatus {
    Success,
    PartialSuccess,
    Failed,
    Skipped,
    Missing,
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub on_failure: FailurePolicy,
    /// Step ids that must not run. Their dependents still may.
    pub disabled: Vec<String>,
}

pub fn plan(
    steps: &[PipelineStep],
    resolver: &dyn PipelineCapabilityResolver,
    disabled: &[String],
    field: &str,
) -> Result<PipelinePlan> {
    validate_steps(steps, field)?;

    let planned_steps = steps
        .iter()
        .cloned()
        .map(|step| {
            let (status, missing) = if disabled.contains(&step.id) {
                (PipelineStepStatus::Disabled, Vec::new())
            } else if resolver.is_supported(&step.step_type) {
                (PipelineStepStatus::Ready, Vec::new())
            } else {
                (
                    PipelineStepStatus::Missing,
                    resolver.missing(&step.step_type),
                )
            };
            PipelinePlanStep {
                id: step.id,
                step_type: step.step_type,
                label: step.label,
                needs: step.needs,
                config: step.config,
                status,
                missing,
            }
        })
        .collect();

    Ok(PipelinePlan {
        steps: planned_steps,
        warnings: Vec::new(),
    })
}

/// Reject duplicate ids and `needs` that do not point at an earlier step.
fn validate_steps(steps: &[PipelineStep], field: &str) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::new();
    for step in steps {
        for need in &step.needs {
            if !seen.contains(need.as_str()) {
                return Err(Error::validation_invalid_argument(
                    field,
                    format!(
                        "Step '{}' depends on '{}', which is not declared before it",
                        step.id, need
                    ),
                    None,
                    None,
                ));
            }
        }
        if !seen.insert(step.id.as_str()) {
            return Err(Error::validation_invalid_argument(
                field,
                format!("Duplicate step id '{}'", step.id),
                None,
                None,
            ));
        }
    }
    Ok(())
}

pub fn run(
    steps: &[PipelineStep],
    executor: &mut dyn PipelineStepExecutor,
    resolver: &dyn PipelineCapabilityResolver,
    options: &RunOptions,
    field: &str,
) -> Result<PipelineRunResult> {
    validate_steps(steps, field)?;

    let mut results: Vec<PipelineStepResult> = Vec::with_capacity(steps.len());
    let mut satisfied: HashSet<String> = HashSet::new();
    let mut aborted_by: Option<String> = None;

    for step in steps {
        if let Some(failed) = &aborted_by {
            results.push(PipelineStepResult::skipped(
                step,
                format!("Skipped because the run stopped after '{}' failed", failed),
            ));
            continue;
        }

        if options.disabled.contains(&step.id) {
            satisfied.insert(step.id.clone());
            results.push(PipelineStepResult::skipped(
                step,
                "Disabled by configuration".to_string(),
            ));
            continue;
        }

        if let Some(dep) = step.needs.iter().find(|n| !satisfied.contains(*n)) {
            results.push(PipelineStepResult::skipped(
                step,
                format!("Skipped because '{}' did not succeed", dep),
            ));
            continue;
        }

        let result = execute_single_step(step, executor, resolver);
        match result.status {
            PipelineRunStatus::Success | PipelineRunStatus::PartialSuccess => {
                satisfied.insert(step.id.clone());
            }
            PipelineRunStatus::Failed if options.on_failure == FailurePolicy::Abort => {
                aborted_by = Some(step.id.clone());
            }
            _ => {}
        }
        results.push(result);
    }

    let status = derive_overall_status(&results);
    let summary = build_summary(&results, &status);

    Ok(PipelineRunResult {
        steps: results,
        status,
        warnings: Vec::new(),
        summary: Some(summary),
    })
}

fn derive_overall_status(results: &[PipelineStepResult]) -> PipelineRunStatus {
    let has = |status: PipelineRunStatus| results.iter().any(|r| r.status == status);
    let has_success = has(PipelineRunStatus::Success);
    let has_failed = has(PipelineRunStatus::Failed);
    let has_missing = has(PipelineRunStatus::Missing);

    if has_failed && has_success {
        return PipelineRunStatus::PartialSuccess;
    }
    if has_failed {
        return PipelineRunStatus::Failed;
    }
    if has_missing && has_success {
        return PipelineRunStatus::PartialSuccess;
    }
    if has_missing {
        return PipelineRunStatus::Missing;
    }
    if !results.is_empty() && !has_success {
        return PipelineRunStatus::Skipped;
    }
    PipelineRunStatus::Success
}

fn build_summary(results: &[PipelineStepResult], status: &PipelineRunStatus) -> PipelineRunSummary {
    let count = |status: PipelineRunStatus| results.iter().filter(|r| r.status == status).count();

    let next_actions = match status {
        PipelineRunStatus::PartialSuccess | PipelineRunStatus::Failed => {
            vec![
                "Fix the issue and re-run (idempotent - completed steps will succeed again)"
                    .to_string(),
            ]
        }
        PipelineRunStatus::Missing => {
            vec!["Install the missing tools to run the remaining steps".to_string()]
        }
        _ => Vec::new(),
    };

    PipelineRunSummary {
        total_steps: results.len(),
        succeeded: count(PipelineRunStatus::Success),
        failed: count(PipelineRunStatus::Failed),
        skipped: count(PipelineRunStatus::Skipped),
        missing: count(PipelineRunStatus::Missing),
        next_actions,
    }
}

fn execute_single_step(
    step: &PipelineStep,
    executor: &mut dyn PipelineStepExecutor,
    resolver: &dyn PipelineCapabilityResolver,
) -> PipelineStepResult {
    if !resolver.is_supported(&step.step_type) {
        let mut result = PipelineStepResult::new(step, PipelineRunStatus::Missing);
        result.missing = resolver.missing(&step.step_type);
        return result;
    }

    match executor.execute_step(step) {
        Ok(mut result) => {
            if result.status == PipelineRunStatus::Success {
                result.missing = Vec::new();
                result.error = None;
            }
            result
        }
        Err(err) => {
            log_status!("pipeline", "Step '{}' failed: {}", step.id, err.message);
            let mut result = PipelineStepResult::new(step, PipelineRunStatus::Failed);
            result.hints = err.hints.clone();
            result.data = Some(serde_json::json!({
                "code": err.code.as_str(),
                "details": err.details,
            }));
            result.error = Some(err.message);
            result
        }
    }
}
