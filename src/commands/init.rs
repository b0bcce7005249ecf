use clap::Args;
use serde::Serialize;

use dvcflow::config::ConfigOverrides;
use dvcflow::dvc::{Dvc, DvcOutput};
use dvcflow::git::{InitOutput, Repo};

use super::CmdResult;

#[derive(Args)]
pub struct InitArgs {}

#[derive(Debug, Serialize)]
pub struct InitCommandOutput {
    pub git: InitOutput,
    pub dvc: DvcOutput,
}

pub fn run(_args: InitArgs, global: &super::GlobalArgs) -> CmdResult<InitCommandOutput> {
    let config = global.resolve_config(&ConfigOverrides::default())?;
    let workdir = global.workdir()?;

    let (_, git) = Repo::init(&workdir)?;
    let dvc = Dvc::new(&workdir, config.dvc_program.as_str()).init()?;

    Ok((InitCommandOutput { git, dvc }, 0))
}
