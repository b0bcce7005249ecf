use clap::Args;
use serde::Serialize;

use dvcflow::config::ConfigOverrides;
use dvcflow::dvc::{Dvc, DvcOutput};
use dvcflow::git::{self, CommitOutput, PushOutput, Repo, TagOutput};

use super::CmdResult;

#[derive(Args)]
pub struct CommitArgs {
    /// Commit message (defaults to "Add updated <dataset> to DVC")
    #[arg(short, long)]
    pub message: Option<String>,
}

#[derive(Args)]
pub struct PushArgs {}

#[derive(Args)]
pub struct TagArgs {
    /// Tag name (defaults to the configured tag)
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PushCommandOutput {
    pub dvc: DvcOutput,
    pub git: PushOutput,
}

#[derive(Debug, Serialize)]
pub struct TagCommandOutput {
    pub tag: TagOutput,
    pub push: PushOutput,
}

pub fn run_commit(args: CommitArgs, global: &super::GlobalArgs) -> CmdResult<CommitOutput> {
    let overrides = ConfigOverrides {
        commit_message: args.message,
        ..Default::default()
    };
    let config = global.resolve_config(&overrides)?;
    let repo = Repo::open(&global.workdir()?)?;

    Ok((git::commit(&repo, &config.effective_commit_message())?, 0))
}

/// Push tracked data first, then the branch.
pub fn run_push(_args: PushArgs, global: &super::GlobalArgs) -> CmdResult<PushCommandOutput> {
    let config = global.resolve_config(&ConfigOverrides::default())?;
    let workdir = global.workdir()?;
    let repo = Repo::open(&workdir)?;

    let dvc = Dvc::new(&workdir, config.dvc_program.as_str()).push()?;
    let git = git::push_branch(&repo, &config.remote_name, &config.effective_branch())?;

    Ok((PushCommandOutput { dvc, git }, 0))
}

pub fn run_tag(args: TagArgs, global: &super::GlobalArgs) -> CmdResult<TagCommandOutput> {
    let overrides = ConfigOverrides {
        tag_name: args.name,
        ..Default::default()
    };
    let config = global.resolve_config(&overrides)?;
    let repo = Repo::open(&global.workdir()?)?;

    let tag = git::create_tag(&repo, &config.tag_name)?;
    let push = git::push_tag(&repo, &config.tag_remote, &config.tag_name)?;

    Ok((TagCommandOutput { tag, push }, 0))
}
