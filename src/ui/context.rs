//! UI context for detecting interactive vs CI environments

use std::io::IsTerminal;

const CI_VARS: [&str; 8] = [
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "CIRCLECI",
    "TRAVIS",
    "JENKINS_URL",
    "BUILDKITE",
    "TEAMCITY_VERSION",
    "TF_BUILD",
];

/// UI context that determines output behavior
#[derive(Debug, Clone)]
pub struct UiContext {
    interactive: bool,
    /// Forced plain output, e.g. when logs go out as JSON
    plain: bool,
}

impl UiContext {
    /// Detect the current environment
    pub fn detect() -> Self {
        Self {
            interactive: Self::detect_interactive(),
            plain: false,
        }
    }

    /// Create a non-interactive context (for testing or explicit CI mode)
    pub fn non_interactive() -> Self {
        Self {
            interactive: false,
            plain: true,
        }
    }

    /// Force plain output regardless of the terminal
    pub fn with_plain(mut self, plain: bool) -> Self {
        self.plain = self.plain || plain;
        self
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Check if we should use cliclack styling
    pub fn use_fancy_output(&self) -> bool {
        self.interactive && !self.plain
    }

    fn detect_interactive() -> bool {
        if !std::io::stdout().is_terminal() {
            return false;
        }

        if std::env::var("CI").is_ok() {
            return false;
        }

        !CI_VARS.iter().any(|var| std::env::var(var).is_ok())
    }
}
