use clap::{Args, Subcommand};
use serde::Serialize;

use dvcflow::config::{self, ConfigOverrides, PipelineConfig};

use super::CmdResult;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Display the effective configuration (defaults + file)
    Show,
}

#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    config: PipelineConfig,
    branch: String,
    commit_message: String,
    descriptor_files: Vec<String>,
}

pub fn run(args: ConfigArgs, global: &super::GlobalArgs) -> CmdResult<ConfigOutput> {
    match args.command {
        ConfigCommand::Show => {
            let workdir = global.workdir()?;
            let path = config::config_path(global.config.as_deref(), &workdir)?;
            let config = global.resolve_config(&ConfigOverrides::default())?;

            Ok((
                ConfigOutput {
                    command: "config.show".to_string(),
                    path: path.map(|p| p.display().to_string()),
                    branch: config.effective_branch(),
                    commit_message: config.effective_commit_message(),
                    descriptor_files: config.effective_descriptor_files(),
                    config,
                },
                0,
            ))
        }
    }
}
