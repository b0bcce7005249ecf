use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};

use super::{execute_git, git_checked, git_optional, is_git_repo};

/// Handle to a git working copy.
#[derive(Debug, Clone, Serialize)]
pub struct Repo {
    root: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct InitOutput {
    pub path: String,
    pub reinitialized: bool,
}

impl Repo {
    /// Initialize (or re-initialize) a repository at `path`.
    pub fn init(path: &Path) -> Result<(Self, InitOutput)> {
        let reinitialized = path.join(".git").exists();
        git_checked(path, &["init"])?;

        if reinitialized {
            log_status!("git", "Reinitialized Git repository in {}", path.display());
        } else {
            log_status!("git", "Initialized a Git repository in {}", path.display());
        }

        let repo = Self {
            root: path.to_path_buf(),
        };
        let output = InitOutput {
            path: path.display().to_string(),
            reinitialized,
        };
        Ok((repo, output))
    }

    /// Open the repository containing `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if !is_git_repo(path) {
            return Err(Error::git_invalid_repository(path.display().to_string()));
        }
        let root = git_optional(path, &["rev-parse", "--show-toplevel"])
            .map(PathBuf::from)
            .unwrap_or_else(|| path.to_path_buf());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Fail with `git.invalid_repository` if the working copy went away.
    pub fn ensure_valid(&self) -> Result<()> {
        if is_git_repo(&self.root) {
            Ok(())
        } else {
            Err(Error::git_invalid_repository(self.root.display().to_string()))
        }
    }

    pub fn has_commits(&self) -> bool {
        git_optional(&self.root, &["rev-parse", "--verify", "--quiet", "HEAD"]).is_some()
    }

    pub fn head_commit(&self) -> Option<String> {
        git_optional(&self.root, &["rev-parse", "--verify", "--quiet", "HEAD"])
    }

    /// Name of the branch HEAD points at, even when it has no commits yet.
    pub fn current_branch(&self) -> Option<String> {
        git_optional(&self.root, &["symbolic-ref", "--short", "HEAD"])
    }

    pub fn remotes(&self) -> Result<Vec<String>> {
        let out = git_checked(&self.root, &["remote"])?;
        Ok(out
            .stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }

    pub fn has_remote(&self, name: &str) -> Result<bool> {
        Ok(self.remotes()?.iter().any(|r| r == name))
    }

    pub(crate) fn ref_exists(&self, full_ref: &str) -> bool {
        execute_git(&self.root, &["rev-parse", "--verify", "--quiet", full_ref])
            .map(|o| o.success)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_is_idempotent() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let (_, first) = Repo::init(temp_dir.path()).unwrap();
        assert!(!first.reinitialized);

        let (repo, second) = Repo::init(temp_dir.path()).unwrap();
        assert!(second.reinitialized);
        assert!(repo.ensure_valid().is_ok());
    }

    #[test]
    fn open_rejects_plain_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let err = Repo::open(temp_dir.path()).unwrap_err();
        assert_eq!(err.code.as_str(), "git.invalid_repository");
    }

    #[test]
    fn fresh_repo_has_no_commits_but_a_current_branch() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let (repo, _) = Repo::init(temp_dir.path()).unwrap();

        assert!(!repo.has_commits());
        assert!(repo.head_commit().is_none());
        assert!(repo.current_branch().is_some());
    }

    #[test]
    fn remotes_lists_registered_names() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        test_support::init_with_commit(temp_dir.path());
        test_support::git(
            temp_dir.path(),
            &["remote", "add", "origin", "https://example.com/repo.git"],
        );

        let repo = Repo::open(temp_dir.path()).unwrap();
        assert_eq!(repo.remotes().unwrap(), vec!["origin".to_string()]);
        assert!(repo.has_remote("origin").unwrap());
        assert!(!repo.has_remote("upstream").unwrap());
    }
}
