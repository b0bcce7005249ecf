use clap::Args;

use dvcflow::config::ConfigOverrides;
use dvcflow::dataset::{self, DatasetShape};
use dvcflow::io;

use super::CmdResult;

#[derive(Args)]
pub struct LoadArgs {
    /// CSV file to load (defaults to the configured dataset)
    pub path: Option<String>,
}

pub fn run(args: LoadArgs, global: &super::GlobalArgs) -> CmdResult<DatasetShape> {
    let overrides = ConfigOverrides {
        dataset_path: args.path,
        ..Default::default()
    };
    let config = global.resolve_config(&overrides)?;
    let path = io::resolve_path(&global.workdir()?, &config.dataset_path);

    Ok((dataset::load(&path)?, 0))
}
