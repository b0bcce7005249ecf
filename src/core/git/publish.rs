use serde::Serialize;

use crate::error::{Error, Result};
use crate::utils::command::ProcessOutput;

use super::{execute_git, git_checked, Repo};

#[derive(Debug, Clone, Serialize)]
pub struct CommitOutput {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PushOutput {
    pub remote: String,
    pub refspec: String,
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<ProcessOutput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagOutput {
    pub tag: String,
    pub created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}

/// Stage every change in the working copy, including deletions.
pub fn stage_all(repo: &Repo) -> Result<ProcessOutput> {
    git_checked(repo.root(), &["add", "--all"])
}

/// Stage all changes and commit them.
///
/// An empty index is reported as a skipped commit rather than an error,
/// so re-running a finished workflow stays green.
pub fn commit(repo: &Repo, message: &str) -> Result<CommitOutput> {
    if message.trim().is_empty() {
        return Err(Error::validation_invalid_argument(
            "commit_message",
            "Commit message cannot be empty",
            None,
            None,
        ));
    }
    repo.ensure_valid()?;
    stage_all(repo)?;

    let nothing_staged = execute_git(repo.root(), &["diff", "--cached", "--quiet"])?.success;
    if nothing_staged {
        log_status!("git", "Nothing to commit, working tree clean");
        return Ok(CommitOutput {
            message: message.to_string(),
            commit: repo.head_commit(),
            skipped: true,
            reason: Some("nothing to commit".to_string()),
        });
    }

    git_checked(repo.root(), &["commit", "-m", message])?;
    log_status!("git", "Committed changes with message: '{}'", message);

    Ok(CommitOutput {
        message: message.to_string(),
        commit: repo.head_commit(),
        skipped: false,
        reason: None,
    })
}

/// Push `branch` to `remote`; skipped when the remote is not registered.
pub fn push_branch(repo: &Repo, remote: &str, branch: &str) -> Result<PushOutput> {
    repo.ensure_valid()?;

    if !repo.has_remote(remote)? {
        let reason = format!("Remote '{}' not found. Skipping push.", remote);
        log_status!("git", "{}", reason);
        return Ok(PushOutput {
            remote: remote.to_string(),
            refspec: branch.to_string(),
            skipped: true,
            reason: Some(reason),
            output: None,
        });
    }

    let output = git_checked(repo.root(), &["push", remote, branch])?;
    log_status!("git", "Pushed changes to remote '{}' on branch '{}'.", remote, branch);

    Ok(PushOutput {
        remote: remote.to_string(),
        refspec: branch.to_string(),
        skipped: false,
        reason: None,
        output: Some(output),
    })
}

/// Create a lightweight tag at HEAD unless it already exists.
pub fn create_tag(repo: &Repo, tag: &str) -> Result<TagOutput> {
    repo.ensure_valid()?;
    validate_tag_name(repo, tag)?;

    let full_ref = format!("refs/tags/{}", tag);
    let created = if repo.ref_exists(&full_ref) {
        log_status!("git", "Tag '{}' already exists.", tag);
        false
    } else {
        git_checked(repo.root(), &["tag", "--", tag])?;
        log_status!("git", "Tag '{}' created successfully.", tag);
        true
    };

    let commit = execute_git(repo.root(), &["rev-list", "-n", "1", &full_ref])
        .ok()
        .filter(|o| o.success && !o.stdout.is_empty())
        .map(|o| o.stdout);

    Ok(TagOutput {
        tag: tag.to_string(),
        created,
        commit,
    })
}

/// Push a tag to `remote`, which must be registered.
pub fn push_tag(repo: &Repo, remote: &str, tag: &str) -> Result<PushOutput> {
    repo.ensure_valid()?;

    let remotes = repo.remotes()?;
    if !remotes.iter().any(|r| r == remote) {
        return Err(Error::git_remote_not_found(remote, remotes));
    }

    let refspec = format!("refs/tags/{}", tag);
    let output = git_checked(repo.root(), &["push", remote, &refspec])?;
    log_status!("git", "Tag '{}' pushed to remote '{}'.", tag, remote);

    Ok(PushOutput {
        remote: remote.to_string(),
        refspec,
        skipped: false,
        reason: None,
        output: Some(output),
    })
}

fn validate_tag_name(repo: &Repo, tag: &str) -> Result<()> {
    let valid = !tag.trim().is_empty()
        && !tag.starts_with('-')
        && execute_git(repo.root(), &["check-ref-format", &format!("refs/tags/{}", tag)])
            .map(|o| o.success)
            .unwrap_or(false);
    if valid {
        Ok(())
    } else {
        Err(Error::validation_invalid_argument(
            "tag_name",
            format!("'{}' is not a valid tag name", tag),
            Some(tag.to_string()),
            None,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support;
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn repo_with_origin() -> (TempDir, TempDir, Repo) {
        let work = TempDir::new().expect("Failed to create temp dir");
        let origin = TempDir::new().expect("Failed to create temp dir");
        test_support::git(origin.path(), &["init", "--bare"]);
        test_support::init_with_commit(work.path());
        test_support::git(
            work.path(),
            &["remote", "add", "origin", &origin.path().display().to_string()],
        );
        let repo = Repo::open(work.path()).unwrap();
        (work, origin, repo)
    }

    fn remote_has_ref(bare: &Path, full_ref: &str) -> bool {
        std::process::Command::new("git")
            .args(["rev-parse", "--verify", "--quiet", full_ref])
            .current_dir(bare)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    #[test]
    fn commit_stages_new_and_deleted_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        test_support::init_with_commit(temp_dir.path());
        let repo = Repo::open(temp_dir.path()).unwrap();
        fs::write(temp_dir.path().join("diabetes.csv.dvc"), "outs: []\n").unwrap();
        fs::remove_file(temp_dir.path().join("README.md")).unwrap();

        let out = commit(&repo, "Add updated diabetes.csv to DVC").unwrap();

        assert!(!out.skipped);
        assert_eq!(out.commit, repo.head_commit());
        let status = test_support::git(temp_dir.path(), &["status", "--porcelain"]);
        assert!(status.is_empty());
    }

    #[test]
    fn commit_with_nothing_staged_is_skipped() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        test_support::init_with_commit(temp_dir.path());
        let repo = Repo::open(temp_dir.path()).unwrap();
        let before = repo.head_commit();

        let out = commit(&repo, "again").unwrap();

        assert!(out.skipped);
        assert_eq!(repo.head_commit(), before);
    }

    #[test]
    fn commit_rejects_empty_message() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        test_support::init_with_commit(temp_dir.path());
        let repo = Repo::open(temp_dir.path()).unwrap();

        let err = commit(&repo, "  ").unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_argument");
    }

    #[test]
    fn push_branch_skips_unknown_remote() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        test_support::init_with_commit(temp_dir.path());
        let repo = Repo::open(temp_dir.path()).unwrap();

        let out = push_branch(&repo, "origin", "main").unwrap();

        assert!(out.skipped);
        assert!(out.output.is_none());
    }

    #[test]
    fn push_branch_reaches_remote() {
        let (work, origin, repo) = repo_with_origin();
        test_support::git(work.path(), &["checkout", "-b", "diabetes"]);

        let out = push_branch(&repo, "origin", "diabetes").unwrap();

        assert!(!out.skipped);
        assert!(remote_has_ref(origin.path(), "refs/heads/diabetes"));
    }

    #[test]
    fn create_tag_is_idempotent() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        test_support::init_with_commit(temp_dir.path());
        let repo = Repo::open(temp_dir.path()).unwrap();

        let first = create_tag(&repo, "v1.0").unwrap();
        let second = create_tag(&repo, "v1.0").unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.commit, repo.head_commit());
    }

    #[test]
    fn create_tag_rejects_option_like_name() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        test_support::init_with_commit(temp_dir.path());
        let repo = Repo::open(temp_dir.path()).unwrap();

        let err = create_tag(&repo, "-d").unwrap_err();

        assert_eq!(err.code.as_str(), "validation.invalid_argument");
        assert!(test_support::git(temp_dir.path(), &["tag", "--list"]).is_empty());
    }

    #[test]
    fn push_tag_requires_registered_remote() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        test_support::init_with_commit(temp_dir.path());
        let repo = Repo::open(temp_dir.path()).unwrap();
        create_tag(&repo, "v1.0").unwrap();

        let err = push_tag(&repo, "origin", "v1.0").unwrap_err();
        assert_eq!(err.code.as_str(), "git.remote_not_found");
    }

    #[test]
    fn push_tag_reaches_remote() {
        let (_work, origin, repo) = repo_with_origin();
        create_tag(&repo, "v1.0").unwrap();

        push_tag(&repo, "origin", "v1.0").unwrap();

        assert!(remote_has_ref(origin.path(), "refs/tags/v1.0"));
    }
}
