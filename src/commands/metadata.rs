use std::path::PathBuf;

use clap::Args;

use dvcflow::config::ConfigOverrides;
use dvcflow::io;
use dvcflow::metadata::{self, MetadataOutput};

use super::CmdResult;

#[derive(Args)]
pub struct MetadataArgs {
    /// Descriptor (.dvc) files; all *.dvc files in the working directory when omitted
    pub files: Vec<String>,

    /// Output JSON file
    #[arg(short, long)]
    pub output: Option<String>,
}

pub fn run(args: MetadataArgs, global: &super::GlobalArgs) -> CmdResult<MetadataOutput> {
    let config = global.resolve_config(&ConfigOverrides::default())?;
    let workdir = global.workdir()?;

    let descriptors: Vec<PathBuf> = if args.files.is_empty() {
        metadata::discover_descriptors(&workdir)?
    } else {
        args.files.iter().map(|f| io::resolve_path(&workdir, f)).collect()
    };

    let output = args
        .output
        .or(config.metadata_output)
        .unwrap_or_else(|| metadata::DEFAULT_OUTPUT.to_string());

    Ok((metadata::extract_to_file(&descriptors, &io::resolve_path(&workdir, &output))?, 0))
}
