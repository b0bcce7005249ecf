use clap::Args;

use dvcflow::config::ConfigOverrides;
use dvcflow::dvc::{Dvc, DvcOutput};
use dvcflow::git::{self, BranchOutput, Repo};

use super::CmdResult;

#[derive(Args)]
pub struct BranchArgs {
    /// Branch name (defaults to the configured branch)
    pub name: Option<String>,
}

#[derive(Args)]
pub struct TrackArgs {
    /// Dataset path (defaults to the configured dataset)
    pub path: Option<String>,
}

pub fn run_branch(args: BranchArgs, global: &super::GlobalArgs) -> CmdResult<BranchOutput> {
    let overrides = ConfigOverrides {
        branch_name: args.name,
        ..Default::default()
    };
    let config = global.resolve_config(&overrides)?;
    let repo = Repo::open(&global.workdir()?)?;

    Ok((git::ensure_branch(&repo, &config.effective_branch())?, 0))
}

pub fn run_track(args: TrackArgs, global: &super::GlobalArgs) -> CmdResult<DvcOutput> {
    let overrides = ConfigOverrides {
        dataset_path: args.path,
        ..Default::default()
    };
    let config = global.resolve_config(&overrides)?;
    let dvc = Dvc::new(global.workdir()?, config.dvc_program.as_str());

    Ok((dvc.add(&config.dataset_path)?, 0))
}
