use serde::Serialize;

use crate::error::{Error, Result};

use super::{git_checked, Repo, GIT};
use crate::utils::command;

#[derive(Debug, Clone, Serialize)]
pub struct BranchOutput {
    pub branch: String,
    pub created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<String>,
    /// Set when the repository has no commits and the branch ref will
    /// only exist after the first commit.
    pub unborn: bool,
}

/// Reject empty names and names git would refuse as a branch.
pub fn validate_branch_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation_invalid_argument(
            "branch_name",
            "Branch name cannot be empty",
            None,
            None,
        ));
    }
    if !command::succeeded_in(
        std::path::Path::new("."),
        GIT,
        &["check-ref-format", "--branch", name],
    ) {
        return Err(Error::validation_invalid_argument(
            "branch_name",
            format!("'{}' is not a valid branch name", name),
            Some(name.to_string()),
            None,
        ));
    }
    Ok(())
}

pub fn branch_exists(repo: &Repo, name: &str) -> bool {
    repo.ref_exists(&format!("refs/heads/{}", name))
}

/// Make sure `name` exists and is checked out.
///
/// Creating is skipped when the branch already exists; checkout always runs.
pub fn ensure_branch(repo: &Repo, name: &str) -> Result<BranchOutput> {
    repo.ensure_valid()?;
    validate_branch_name(name)?;

    let previous = repo.current_branch();

    if !repo.has_commits() {
        // Nothing to point a ref at yet: aim HEAD at the new name instead.
        let created = previous.as_deref() != Some(name);
        if created {
            git_checked(
                repo.root(),
                &["symbolic-ref", "HEAD", &format!("refs/heads/{}", name)],
            )?;
            log_status!("git", "Branch '{}' created (pending first commit)", name);
        } else {
            log_status!("git", "Branch '{}' already exists.", name);
        }
        return Ok(BranchOutput {
            branch: name.to_string(),
            created,
            previous,
            head: None,
            unborn: true,
        });
    }

    let created = if branch_exists(repo, name) {
        log_status!("git", "Branch '{}' already exists.", name);
        false
    } else {
        git_checked(repo.root(), &["branch", name])?;
        log_status!("git", "Branch '{}' created successfully.", name);
        true
    };

    git_checked(repo.root(), &["checkout", name, "--"])?;
    log_status!("git", "Switched to branch '{}'.", name);

    Ok(BranchOutput {
        branch: name.to_string(),
        created,
        previous,
        head: repo.head_commit(),
        unborn: false,
    })
}
