use clap::Args;
use serde::Serialize;

use dvcflow::config::ConfigOverrides;
use dvcflow::pipeline::{PipelinePlan, PipelineRunResult};
use dvcflow::workflow;

use super::CmdResult;

#[derive(Args)]
pub struct RunArgs {
    /// Show the planned steps without executing them
    #[arg(long)]
    pub dry_run: bool,

    /// Dataset file to track
    #[arg(long)]
    pub dataset: Option<String>,

    /// S3 bucket backing the DVC remote
    #[arg(long)]
    pub bucket: Option<String>,

    /// AWS region for the bucket
    #[arg(long)]
    pub region: Option<String>,

    /// Branch to create and push
    #[arg(long)]
    pub branch: Option<String>,

    /// Git remote for the branch push
    #[arg(long)]
    pub remote: Option<String>,

    /// Tag to create and push
    #[arg(long)]
    pub tag: Option<String>,

    /// Commit message
    #[arg(short, long)]
    pub message: Option<String>,

    /// Stop at the first failed step
    #[arg(long)]
    pub abort_on_failure: bool,
}

impl RunArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            dataset_path: self.dataset.clone(),
            bucket_name: self.bucket.clone(),
            region: self.region.clone(),
            branch_name: self.branch.clone(),
            remote_name: self.remote.clone(),
            tag_name: self.tag.clone(),
            dvc_remote_name: None,
            commit_message: self.message.clone(),
            abort_on_failure: self.abort_on_failure,
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum RunOutput {
    Plan(PipelinePlan),
    Run(PipelineRunResult),
}

pub fn run(args: RunArgs, global: &super::GlobalArgs) -> CmdResult<RunOutput> {
    let config = global.resolve_config(&args.overrides())?;

    if args.dry_run {
        return Ok((RunOutput::Plan(workflow::plan(&config)?), 0));
    }

    let result = workflow::run(&global.workdir()?, &config)?;
    let exit_code = crate::output::exit_code_for_run(&result.status);
    Ok((RunOutput::Run(result), exit_code))
}
