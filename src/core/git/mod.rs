//! Git operations, run through the `git` binary in the repository root.
//!
//! - `repo` - repository handle and init/open
//! - `branch` - idempotent branch creation and checkout
//! - `publish` - stage, commit, push and tag

mod branch;
mod publish;
mod repo;

pub use branch::*;
pub use publish::*;
pub use repo::*;

use std::path::Path;

use crate::error::{Error, Result};
use crate::utils::command::{self, ProcessOutput};

const GIT: &str = "git";

fn execute_git(path: &Path, args: &[&str]) -> Result<ProcessOutput> {
    command::capture(path, GIT, args)
}

/// Run git and turn a non-zero exit into `git.command_failed`.
fn git_checked(path: &Path, args: &[&str]) -> Result<ProcessOutput> {
    execute_git(path, args)?.require_success(Error::git_command_failed)
}

/// Run git, returning trimmed stdout when it succeeds with output.
fn git_optional(path: &Path, args: &[&str]) -> Option<String> {
    match execute_git(path, args) {
        Ok(out) if out.success && !out.stdout.is_empty() => Some(out.stdout),
        _ => None,
    }
}

pub(crate) fn is_git_repo(path: &Path) -> bool {
    command::succeeded_in(path, GIT, &["rev-parse", "--git-dir"])
}
