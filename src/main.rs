use clap::{Parser, Subcommand};

use commands::GlobalArgs;

mod commands;
mod output;

use commands::{checkout, config_cmd, init, load, metadata, publish, remote, repo, run};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "dvcflow")]
#[command(version = VERSION)]
#[command(about = "Version datasets with git, DVC and S3")]
struct Cli {
    /// Config file (defaults to ./dvcflow.json when present)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the whole workflow, or plan it with --dry-run
    Run(run::RunArgs),
    /// Initialize git and DVC in the working directory
    Init(init::InitArgs),
    /// Create (if needed) and check out a branch
    Branch(repo::BranchArgs),
    /// Track the dataset with DVC
    Track(repo::TrackArgs),
    /// Ensure the S3 bucket exists and register it as the DVC remote
    Remote(remote::RemoteArgs),
    /// Stage all changes and commit
    Commit(publish::CommitArgs),
    /// Push tracked data, then the branch
    Push(publish::PushArgs),
    /// Create a tag and push it
    Tag(publish::TagArgs),
    /// Restore the tracked data version
    Checkout(checkout::CheckoutArgs),
    /// Load the dataset and report its shape
    Load(load::LoadArgs),
    /// Extract dataset metadata from DVC descriptor files
    Metadata(metadata::MetadataArgs),
    /// Inspect configuration
    Config(config_cmd::ConfigArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let global = GlobalArgs { config: cli.config };

    let (json_result, exit_code) = commands::run_json(cli.command, &global);
    if output::print_json_result(json_result).is_err() {
        return std::process::ExitCode::from(1);
    }

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
