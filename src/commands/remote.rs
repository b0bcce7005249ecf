use clap::Args;

use dvcflow::config::ConfigOverrides;
use dvcflow::dvc::Dvc;
use dvcflow::storage::{self, RemoteOutput, S3Client};

use super::CmdResult;

#[derive(Args)]
pub struct RemoteArgs {
    /// S3 bucket name
    #[arg(long)]
    pub bucket: Option<String>,

    /// AWS region
    #[arg(long)]
    pub region: Option<String>,

    /// DVC remote name
    #[arg(long)]
    pub name: Option<String>,
}

pub fn run(args: RemoteArgs, global: &super::GlobalArgs) -> CmdResult<RemoteOutput> {
    let overrides = ConfigOverrides {
        bucket_name: args.bucket,
        region: args.region,
        dvc_remote_name: args.name,
        ..Default::default()
    };
    let config = global.resolve_config(&overrides)?;

    let client = S3Client::new(&config.region, config.storage_endpoint.as_deref())?;
    let dvc = Dvc::new(global.workdir()?, config.dvc_program.as_str());
    let output = storage::configure_remote(
        &client,
        &dvc,
        &config.bucket_name,
        &config.region,
        &config.dvc_remote_name,
    )?;

    Ok((output, 0))
}
