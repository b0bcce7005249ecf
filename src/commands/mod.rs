use std::path::PathBuf;

use dvcflow::config::{self, ConfigOverrides, PipelineConfig};

pub type CmdResult<T> = dvcflow::Result<(T, i32)>;

pub(crate) struct GlobalArgs {
    /// Explicit config file; falls back to `./dvcflow.json`.
    pub config: Option<String>,
}

impl GlobalArgs {
    pub fn workdir(&self) -> dvcflow::Result<PathBuf> {
        std::env::current_dir().map_err(|e| {
            dvcflow::Error::internal_io(e.to_string(), Some("resolve working directory".to_string()))
        })
    }

    /// Effective configuration for the working directory.
    pub fn resolve_config(&self, overrides: &ConfigOverrides) -> dvcflow::Result<PipelineConfig> {
        config::resolve(self.config.as_deref(), &self.workdir()?, overrides)
    }
}

pub mod checkout;
pub mod config_cmd;
pub mod init;
pub mod load;
pub mod metadata;
pub mod publish;
pub mod remote;
pub mod repo;
pub mod run;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (dvcflow::Result<serde_json::Value>, i32) {
    match command {
        crate::Commands::Run(args) => dispatch!(args, global, run),
        crate::Commands::Init(args) => dispatch!(args, global, init),
        crate::Commands::Branch(args) => {
            crate::output::map_cmd_result_to_json(repo::run_branch(args, global))
        }
        crate::Commands::Track(args) => {
            crate::output::map_cmd_result_to_json(repo::run_track(args, global))
        }
        crate::Commands::Remote(args) => dispatch!(args, global, remote),
        crate::Commands::Commit(args) => {
            crate::output::map_cmd_result_to_json(publish::run_commit(args, global))
        }
        crate::Commands::Push(args) => {
            crate::output::map_cmd_result_to_json(publish::run_push(args, global))
        }
        crate::Commands::Tag(args) => {
            crate::output::map_cmd_result_to_json(publish::run_tag(args, global))
        }
        crate::Commands::Checkout(args) => dispatch!(args, global, checkout),
        crate::Commands::Load(args) => dispatch!(args, global, load),
        crate::Commands::Metadata(args) => dispatch!(args, global, metadata),
        crate::Commands::Config(args) => dispatch!(args, global, config_cmd),
    }
}
