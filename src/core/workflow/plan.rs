//! The fixed step sequence of a dataset versioning run.

use std::collections::HashMap;

use serde_json::{json, Value};

use crate::config::PipelineConfig;
use crate::pipeline::PipelineStep;

pub const GIT_INIT: &str = "git.init";
pub const DVC_INIT: &str = "dvc.init";
pub const STORAGE_REMOTE: &str = "storage.remote";
pub const GIT_BRANCH: &str = "git.branch";
pub const DVC_ADD: &str = "dvc.add";
pub const GIT_COMMIT: &str = "git.commit";
pub const DVC_PUSH: &str = "dvc.push";
pub const GIT_PUSH: &str = "git.push";
pub const GIT_TAG: &str = "git.tag";
pub const GIT_PUSH_TAG: &str = "git.push-tag";
pub const DVC_CHECKOUT: &str = "dvc.checkout";
pub const DATASET_LOAD: &str = "dataset.load";
pub const METADATA_EXTRACT: &str = "metadata.extract";

/// Every step id, in execution order.
pub const STEP_IDS: &[&str] = &[
    GIT_INIT,
    DVC_INIT,
    STORAGE_REMOTE,
    GIT_BRANCH,
    DVC_ADD,
    GIT_COMMIT,
    DVC_PUSH,
    GIT_PUSH,
    GIT_TAG,
    GIT_PUSH_TAG,
    DVC_CHECKOUT,
    DATASET_LOAD,
    METADATA_EXTRACT,
];

/// Step types name the tool a step drives.
pub const TYPE_GIT: &str = "git";
pub const TYPE_DVC: &str = "dvc";
pub const TYPE_STORAGE: &str = "storage";
pub const TYPE_DATASET: &str = "dataset";
pub const TYPE_METADATA: &str = "metadata";

fn step(id: &str, step_type: &str, label: &str, needs: &[&str], config: Value) -> PipelineStep {
    let config: HashMap<String, Value> = match config {
        Value::Object(map) => map.into_iter().collect(),
        _ => HashMap::new(),
    };
    PipelineStep {
        id: id.to_string(),
        step_type: step_type.to_string(),
        label: Some(label.to_string()),
        needs: needs.iter().map(|n| n.to_string()).collect(),
        config,
    }
}

pub fn build_steps(config: &PipelineConfig) -> Vec<PipelineStep> {
    let branch = config.effective_branch();
    vec![
        step(GIT_INIT, TYPE_GIT, "Initialize git repository", &[], json!({})),
        step(DVC_INIT, TYPE_DVC, "Initialize DVC", &[GIT_INIT], json!({})),
        step(
            STORAGE_REMOTE,
            TYPE_STORAGE,
            "Configure S3 remote",
            &[DVC_INIT],
            json!({
                "bucket": config.bucket_name,
                "region": config.region,
                "remote": config.dvc_remote_name,
            }),
        ),
        step(
            GIT_BRANCH,
            TYPE_GIT,
            "Create and check out branch",
            &[GIT_INIT],
            json!({ "branch": branch }),
        ),
        step(
            DVC_ADD,
            TYPE_DVC,
            "Track dataset",
            &[DVC_INIT],
            json!({ "path": config.dataset_path }),
        ),
        step(
            GIT_COMMIT,
            TYPE_GIT,
            "Commit changes",
            &[GIT_INIT],
            json!({ "message": config.effective_commit_message() }),
        ),
        step(DVC_PUSH, TYPE_DVC, "Push data to remote storage", &[DVC_INIT], json!({})),
        step(
            GIT_PUSH,
            TYPE_GIT,
            "Push branch",
            &[GIT_COMMIT],
            json!({ "remote": config.remote_name, "branch": branch }),
        ),
        step(
            GIT_TAG,
            TYPE_GIT,
            "Create tag",
            &[GIT_COMMIT],
            json!({ "tag": config.tag_name }),
        ),
        step(
            GIT_PUSH_TAG,
            TYPE_GIT,
            "Push tag",
            &[GIT_TAG],
            json!({ "remote": config.tag_remote, "tag": config.tag_name }),
        ),
        step(DVC_CHECKOUT, TYPE_DVC, "Restore data version", &[DVC_INIT], json!({})),
        step(
            DATASET_LOAD,
            TYPE_DATASET,
            "Load dataset",
            &[],
            json!({ "path": config.dataset_path }),
        ),
        step(
            METADATA_EXTRACT,
            TYPE_METADATA,
            "Extract dataset metadata",
            &[],
            json!({
                "descriptors": config.effective_descriptor_files(),
                "output": config.metadata_output,
            }),
        ),
    ]
}

/// Steps that must not run: `skip_steps` plus the metadata step when its
/// output is disabled.
pub fn disabled_steps(config: &PipelineConfig) -> Vec<String> {
    let mut disabled = config.skip_steps.clone();
    if config.metadata_output.is_none() && !disabled.iter().any(|s| s == METADATA_EXTRACT) {
        disabled.push(METADATA_EXTRACT.to_string());
    }
    disabled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_follow_declared_order() {
        let steps = build_steps(&PipelineConfig::default());
        let ids: Vec<&str> = steps.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, STEP_IDS);
    }

    #[test]
    fn needs_only_point_backwards() {
        let steps = build_steps(&PipelineConfig::default());
        for (i, s) in steps.iter().enumerate() {
            for need in &s.needs {
                let pos = STEP_IDS.iter().position(|id| id == need).unwrap();
                assert!(pos < i, "{} needs later step {}", s.id, need);
            }
        }
    }

    #[test]
    fn step_config_carries_effective_values() {
        let steps = build_steps(&PipelineConfig::default());
        let branch = steps.iter().find(|s| s.id == GIT_BRANCH).unwrap();
        assert_eq!(branch.config["branch"], "diabetes");
    }

    #[test]
    fn null_metadata_output_disables_extraction() {
        let config = PipelineConfig {
            metadata_output: None,
            skip_steps: vec![GIT_PUSH.to_string()],
            ..Default::default()
        };
        assert_eq!(disabled_steps(&config), vec![GIT_PUSH, METADATA_EXTRACT]);
    }
}
