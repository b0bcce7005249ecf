//! The dataset versioning workflow: git + DVC + S3 steps run through the
//! pipeline engine.

mod executor;
pub mod plan;
mod resolver;

pub use executor::WorkflowExecutor;
pub use resolver::ToolResolver;

use std::path::Path;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::pipeline::{self, PipelinePlan, PipelineRunResult, RunOptions};

const STEPS_FIELD: &str = "steps";

fn run_options(config: &PipelineConfig) -> RunOptions {
    RunOptions {
        on_failure: config.on_failure,
        disabled: plan::disabled_steps(config),
    }
}

/// Describe what a run would do without executing anything.
pub fn plan(config: &PipelineConfig) -> Result<PipelinePlan> {
    let steps = plan::build_steps(config);
    let resolver = ToolResolver::detect(&config.dvc_program);
    pipeline::plan(&steps, &resolver, &plan::disabled_steps(config), STEPS_FIELD)
}

/// Run every step in `workdir`, talking to S3 for the bucket.
pub fn run(workdir: &Path, config: &PipelineConfig) -> Result<PipelineRunResult> {
    let mut executor = WorkflowExecutor::new(workdir, config.clone());
    run_with(&mut executor, config)
}

pub fn run_with(
    executor: &mut WorkflowExecutor,
    config: &PipelineConfig,
) -> Result<PipelineRunResult> {
    let steps = plan::build_steps(config);
    let resolver = ToolResolver::detect(&config.dvc_program);
    log_status!("workflow", "Running {} steps", steps.len());
    pipeline::run(&steps, executor, &resolver, &run_options(config), STEPS_FIELD)
}

#[cfg(all(test, unix))]
mod tests {
    use super::plan::*;
    use super::*;
    use crate::dvc::test_support::{calls, stub_dvc};
    use crate::git::test_support::{configure_identity, git};
    use crate::pipeline::{FailurePolicy, PipelineRunStatus, PipelineStepStatus};
    use crate::storage::test_support::MemoryStore;
    use std::fs;
    use tempfile::TempDir;

    const DESCRIPTOR: &str = "outs:\n- md5: a304afb96060aad90176268345e10355\n  path: diabetes.csv\n";

    struct Fixture {
        bin: TempDir,
        work: TempDir,
        origin: TempDir,
        config: PipelineConfig,
    }

    fn fixture(fail_on: Option<&str>) -> Fixture {
        let bin = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let origin = TempDir::new().unwrap();

        git(origin.path(), &["init", "--bare"]);
        git(work.path(), &["init"]);
        configure_identity(work.path());
        git(
            work.path(),
            &["remote", "add", "origin", &origin.path().display().to_string()],
        );
        fs::write(work.path().join("diabetes.csv"), "Glucose,Outcome\n148,1\n85,0\n").unwrap();
        fs::write(work.path().join("diabetes.csv.dvc"), DESCRIPTOR).unwrap();

        let program = stub_dvc(bin.path(), fail_on);
        let config = PipelineConfig {
            dvc_program: program.display().to_string(),
            ..Default::default()
        };
        Fixture {
            bin,
            work,
            origin,
            config,
        }
    }

    fn run_fixture(f: &Fixture, store: MemoryStore) -> PipelineRunResult {
        let mut executor =
            WorkflowExecutor::new(f.work.path(), f.config.clone()).with_store(Box::new(store));
        run_with(&mut executor, &f.config).unwrap()
    }

    fn status(result: &PipelineRunResult, id: &str) -> PipelineRunStatus {
        result.step(id).unwrap().status.clone()
    }

    #[test]
    fn full_run_publishes_branch_tag_and_metadata() {
        let f = fixture(None);

        let result = run_fixture(&f, MemoryStore::default());

        assert_eq!(result.status, PipelineRunStatus::Success);
        assert_eq!(
            calls(f.bin.path()),
            vec![
                "init",
                "remote add -d -f remotedvcs3 s3://daas3dvctest",
                "add diabetes.csv",
                "push",
                "checkout",
            ]
        );
        assert_eq!(git(f.origin.path(), &["branch", "--list", "diabetes"]), "diabetes");
        assert_eq!(git(f.origin.path(), &["tag", "--list"]), "v1.0");

        let load = result.step(DATASET_LOAD).unwrap();
        assert_eq!(load.data.as_ref().unwrap()["rows"], 2);

        let written = fs::read_to_string(f.work.path().join("dataset_metadata.json")).unwrap();
        let records: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(records[0]["dataset_name"], "diabetes.csv");
        assert_eq!(records[0]["md5"], "a304afb96060aad90176268345e10355");
    }

    #[test]
    fn existing_bucket_is_not_recreated() {
        let f = fixture(None);
        let result = run_fixture(&f, MemoryStore::with_buckets(&["daas3dvctest"]));

        let remote = result.step(STORAGE_REMOTE).unwrap();
        assert_eq!(remote.data.as_ref().unwrap()["bucket_created"], false);
    }

    #[test]
    fn failed_dvc_init_skips_dependent_steps_only() {
        let f = fixture(Some("init"));

        let result = run_fixture(&f, MemoryStore::default());

        assert_eq!(status(&result, DVC_INIT), PipelineRunStatus::Failed);
        for id in [STORAGE_REMOTE, DVC_ADD, DVC_PUSH, DVC_CHECKOUT] {
            assert_eq!(status(&result, id), PipelineRunStatus::Skipped, "{}", id);
        }
        assert_eq!(status(&result, GIT_COMMIT), PipelineRunStatus::Success);
        assert_eq!(status(&result, GIT_PUSH_TAG), PipelineRunStatus::Success);
        assert_eq!(result.status, PipelineRunStatus::PartialSuccess);

        let init = result.step(DVC_INIT).unwrap();
        assert_eq!(init.data.as_ref().unwrap()["code"], "dvc.command_failed");
    }

    #[test]
    fn abort_policy_stops_after_first_failure() {
        let mut f = fixture(Some("add"));
        f.config.on_failure = FailurePolicy::Abort;

        let result = run_fixture(&f, MemoryStore::default());

        assert_eq!(status(&result, DVC_ADD), PipelineRunStatus::Failed);
        for id in [GIT_COMMIT, DVC_PUSH, GIT_PUSH, GIT_TAG, METADATA_EXTRACT] {
            assert_eq!(status(&result, id), PipelineRunStatus::Skipped, "{}", id);
        }
        assert!(!calls(f.bin.path()).contains(&"push".to_string()));
    }

    #[test]
    fn missing_remote_skips_branch_push_but_fails_tag_push() {
        let f = fixture(None);
        git(f.work.path(), &["remote", "remove", "origin"]);

        let result = run_fixture(&f, MemoryStore::default());

        assert_eq!(status(&result, GIT_PUSH), PipelineRunStatus::Skipped);
        assert!(!result.step(GIT_PUSH).unwrap().warnings.is_empty());
        assert_eq!(status(&result, GIT_PUSH_TAG), PipelineRunStatus::Failed);
        let push_tag = result.step(GIT_PUSH_TAG).unwrap();
        assert_eq!(push_tag.data.as_ref().unwrap()["code"], "git.remote_not_found");
    }

    #[test]
    fn rerun_is_idempotent() {
        let f = fixture(None);
        fs::write(f.work.path().join(".gitignore"), "dataset_metadata.json\n").unwrap();
        run_fixture(&f, MemoryStore::default());

        let second = run_fixture(&f, MemoryStore::with_buckets(&["daas3dvctest"]));

        assert_eq!(second.status, PipelineRunStatus::Success);
        let commit = second.step(GIT_COMMIT).unwrap();
        assert_eq!(commit.data.as_ref().unwrap()["skipped"], true);
        let tag = second.step(GIT_TAG).unwrap();
        assert_eq!(tag.data.as_ref().unwrap()["created"], false);
    }

    #[test]
    fn plan_reports_missing_dvc_and_disabled_steps() {
        let config = PipelineConfig {
            dvc_program: "/nonexistent/dvc".to_string(),
            skip_steps: vec![GIT_PUSH.to_string()],
            ..Default::default()
        };

        let plan = plan(&config).unwrap();

        let by_id = |id: &str| plan.steps.iter().find(|s| s.id == id).unwrap().status.clone();
        assert_eq!(by_id(DVC_ADD), PipelineStepStatus::Missing);
        assert_eq!(by_id(GIT_PUSH), PipelineStepStatus::Disabled);
        assert_eq!(by_id(DATASET_LOAD), PipelineStepStatus::Ready);
    }
}
