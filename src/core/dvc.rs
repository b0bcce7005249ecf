//! DVC (data version control) operations via the `dvc` CLI.
//!
//! Every call captures the exit code and output; a non-zero exit becomes
//! `dvc.command_failed`.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::utils::command::{self, ProcessOutput};
use crate::utils::io;

pub const DEFAULT_PROGRAM: &str = "dvc";

#[derive(Debug, Clone, Serialize)]
pub struct DvcOutput {
    pub action: String,
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<ProcessOutput>,
}

impl DvcOutput {
    fn ran(action: &str, output: ProcessOutput) -> Self {
        Self {
            action: action.to_string(),
            skipped: false,
            reason: None,
            output: Some(output),
        }
    }
}

/// A DVC project rooted at `workdir`.
#[derive(Debug, Clone)]
pub struct Dvc {
    workdir: PathBuf,
    program: String,
}

impl Dvc {
    pub fn new(workdir: impl Into<PathBuf>, program: impl Into<String>) -> Self {
        Self {
            workdir: workdir.into(),
            program: program.into(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<ProcessOutput> {
        command::capture(&self.workdir, &self.program, args)?
            .require_success(Error::dvc_command_failed)
    }

    pub fn is_initialized(&self) -> bool {
        self.workdir.join(".dvc").is_dir()
    }

    /// Run `dvc init` unless the project already has a `.dvc` directory.
    pub fn init(&self) -> Result<DvcOutput> {
        if self.is_initialized() {
            log_status!("dvc", "DVC is already initialized.");
            return Ok(DvcOutput {
                action: "init".to_string(),
                skipped: true,
                reason: Some("DVC is already initialized".to_string()),
                output: None,
            });
        }

        let output = self.run(&["init"])?;
        log_status!("dvc", "Initialized DVC.");
        Ok(DvcOutput::ran("init", output))
    }

    /// Start tracking `path` (relative to the workdir, `~` expanded).
    pub fn add(&self, path: &str) -> Result<DvcOutput> {
        if !io::resolve_path(&self.workdir, path).exists() {
            return Err(Error::dataset_not_found(path));
        }

        let expanded = io::expand_home(path).to_string_lossy().to_string();
        let output = self.run(&["add", &expanded])?;
        log_status!("dvc", "Added '{}' to DVC tracking.", path);
        Ok(DvcOutput::ran("add", output))
    }

    /// Register `url` as the default remote, replacing any remote of the same name.
    pub fn add_default_remote(&self, name: &str, url: &str) -> Result<DvcOutput> {
        let output = self.run(&["remote", "add", "-d", "-f", name, url])?;
        log_status!("dvc", "Configured DVC remote '{}' with {}", name, url);
        Ok(DvcOutput::ran("remote.add", output))
    }

    pub fn push(&self) -> Result<DvcOutput> {
        let output = self.run(&["push"])?;
        log_status!("dvc", "Pushed data to DVC remote storage.");
        Ok(DvcOutput::ran("push", output))
    }

    pub fn checkout(&self) -> Result<DvcOutput> {
        let output = self.run(&["checkout"])?;
        log_status!("dvc", "Checked out data to restore the version.");
        Ok(DvcOutput::ran("checkout", output))
    }
}

#[cfg(all(test, unix))]
pub(crate) mod test_support {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    /// Write a stand-in `dvc` script into `dir`.
    ///
    /// It answers `--version`, appends any other arguments to `dvc-calls.log`
    /// in `dir`, creates `.dvc` on `init`, and exits 1 when its first
    /// argument equals `fail_on`.
    pub fn stub_dvc(dir: &Path, fail_on: Option<&str>) -> PathBuf {
        let log = dir.join("dvc-calls.log");
        let fail = fail_on.unwrap_or("");
        let script = format!(
            "#!/bin/sh\n\
             if [ \"$1\" = \"--version\" ]; then echo 3.0.0; exit 0; fi\n\
             echo \"$*\" >> '{log}'\n\
             if [ \"$1\" = \"{fail}\" ]; then echo \"ERROR: $1 failed\" >&2; exit 1; fi\n\
             if [ \"$1\" = \"init\" ]; then mkdir -p .dvc; fi\n\
             exit 0\n",
            log = log.display(),
            fail = fail,
        );
        let path = dir.join("fake-dvc");
        fs::write(&path, script).expect("Failed to write stub");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("Failed to chmod stub");
        path
    }

    pub fn calls(dir: &Path) -> Vec<String> {
        fs::read_to_string(dir.join("dvc-calls.log"))
            .unwrap_or_default()
            .lines()
            .map(String::from)
            .collect()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::test_support::{calls, stub_dvc};
    use super::*;
    use tempfile::TempDir;

    fn project(fail_on: Option<&str>) -> (TempDir, TempDir, Dvc) {
        let bin = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let program = stub_dvc(bin.path(), fail_on);
        let dvc = Dvc::new(work.path(), program.display().to_string());
        (bin, work, dvc)
    }

    #[test]
    fn init_runs_once() {
        let (bin, _work, dvc) = project(None);

        let first = dvc.init().unwrap();
        let second = dvc.init().unwrap();

        assert!(!first.skipped);
        assert!(second.skipped);
        assert_eq!(calls(bin.path()), vec!["init"]);
    }

    #[test]
    fn add_requires_existing_dataset() {
        let (bin, _work, dvc) = project(None);

        let err = dvc.add("diabetes.csv").unwrap_err();

        assert_eq!(err.code.as_str(), "dataset.not_found");
        assert!(calls(bin.path()).is_empty());
    }

    #[test]
    fn add_passes_path_through() {
        let (bin, work, dvc) = project(None);
        std::fs::write(work.path().join("diabetes.csv"), "a,b\n1,2\n").unwrap();

        dvc.add("diabetes.csv").unwrap();

        assert_eq!(calls(bin.path()), vec!["add diabetes.csv"]);
    }

    #[test]
    fn add_accepts_absolute_dataset_path() {
        let (bin, work, dvc) = project(None);
        let dataset = work.path().join("diabetes.csv");
        std::fs::write(&dataset, "a,b\n1,2\n").unwrap();
        let absolute = dataset.display().to_string();

        dvc.add(&absolute).unwrap();

        assert_eq!(calls(bin.path()), vec![format!("add {}", absolute)]);
    }

    #[test]
    fn default_remote_is_forced() {
        let (bin, _work, dvc) = project(None);

        dvc.add_default_remote("remotedvcs3", "s3://daas3dvctest").unwrap();

        assert_eq!(
            calls(bin.path()),
            vec!["remote add -d -f remotedvcs3 s3://daas3dvctest"]
        );
    }

    #[test]
    fn failed_exit_is_an_error() {
        let (_bin, _work, dvc) = project(Some("push"));

        let err = dvc.push().unwrap_err();

        assert_eq!(err.code.as_str(), "dvc.command_failed");
        assert_eq!(err.details["exitCode"], 1);
        assert_eq!(err.details["stderr"], "ERROR: push failed");
    }
}
