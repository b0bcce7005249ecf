use crate::pipeline::PipelineCapabilityResolver;
use crate::utils::command;

use super::plan::{TYPE_DVC, TYPE_GIT, TYPE_STORAGE};

const GIT: &str = "git";

/// Checks once whether `git` and the configured DVC program can be started.
pub struct ToolResolver {
    dvc_program: String,
    git_available: bool,
    dvc_available: bool,
}

impl ToolResolver {
    pub fn detect(dvc_program: &str) -> Self {
        Self {
            dvc_program: dvc_program.to_string(),
            git_available: command::is_available(GIT),
            dvc_available: command::is_available(dvc_program),
        }
    }

    fn required_tool(&self, step_type: &str) -> Option<(&str, bool)> {
        match step_type {
            TYPE_GIT => Some((GIT, self.git_available)),
            // Registering the remote goes through `dvc remote add`.
            TYPE_DVC | TYPE_STORAGE => Some((self.dvc_program.as_str(), self.dvc_available)),
            _ => None,
        }
    }
}

impl PipelineCapabilityResolver for ToolResolver {
    fn is_supported(&self, step_type: &str) -> bool {
        self.required_tool(step_type)
            .map(|(_, available)| available)
            .unwrap_or(true)
    }

    fn missing(&self, step_type: &str) -> Vec<String> {
        match self.required_tool(step_type) {
            Some((tool, false)) => vec![tool.to_string()],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_dvc_marks_dvc_and_storage_steps_missing() {
        let resolver = ToolResolver::detect("/nonexistent/dvc");

        assert!(!resolver.is_supported(TYPE_DVC));
        assert!(!resolver.is_supported(TYPE_STORAGE));
        assert_eq!(resolver.missing(TYPE_DVC), vec!["/nonexistent/dvc"]);
        assert!(resolver.is_supported("dataset"));
        assert!(resolver.missing("metadata").is_empty());
    }

    #[test]
    fn git_is_detected() {
        let resolver = ToolResolver::detect("/nonexistent/dvc");
        assert!(resolver.is_supported(TYPE_GIT));
    }
}
