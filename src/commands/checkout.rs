use clap::Args;

use dvcflow::config::ConfigOverrides;
use dvcflow::dvc::{Dvc, DvcOutput};

use super::CmdResult;

#[derive(Args)]
pub struct CheckoutArgs {}

pub fn run(_args: CheckoutArgs, global: &super::GlobalArgs) -> CmdResult<DvcOutput> {
    let config = global.resolve_config(&ConfigOverrides::default())?;
    let dvc = Dvc::new(global.workdir()?, config.dvc_program.as_str());

    Ok((dvc.checkout()?, 0))
}
