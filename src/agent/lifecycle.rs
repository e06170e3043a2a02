//! Agent lifecycle state machine
//!
//! ```text
//! uninstalled -> installing -> installed (waiting) -> activating -> active
//!                     |                |                              |
//!                     +--> redundant <-+------------------------------+
//! ```
//!
//! The agent only moves when the host delivers an event. A failed install
//! ends in `Redundant`: that agent never becomes active.

use crate::error::{ShellcacheError, ShellcacheResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of one agent (one generation)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Uninstalled,
    Installing,
    /// Installed and waiting to be activated
    Installed,
    Activating,
    Active,
    /// Failed to install, or superseded by a newer generation
    Redundant,
}

/// Steps that move the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStep {
    InstallStarted,
    InstallSucceeded,
    InstallFailed,
    ActivateStarted,
    ActivateCompleted,
    Superseded,
}

impl LifecycleState {
    /// Successor state for a step, or an error if the step is not allowed here
    pub fn next(self, step: LifecycleStep) -> ShellcacheResult<Self> {
        use LifecycleState::*;
        use LifecycleStep::*;

        match (self, step) {
            (Uninstalled, InstallStarted) => Ok(Installing),
            (Installing, InstallSucceeded) => Ok(Installed),
            (Installing, InstallFailed) => Ok(Redundant),
            (Installed, ActivateStarted) => Ok(Activating),
            (Activating, ActivateCompleted) => Ok(Active),
            (Installed | Active, Superseded) => Ok(Redundant),
            (state, step) => Err(ShellcacheError::InvalidTransition {
                event: step.to_string(),
                state: state.to_string(),
            }),
        }
    }

    /// Whether fetches are intercepted in this state
    pub fn is_controlling(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninstalled => "uninstalled",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Active => "active",
            Self::Redundant => "redundant",
        };
        write!(f, "{}", name)
    }
}

impl fmt::Display for LifecycleStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InstallStarted => "start install",
            Self::InstallSucceeded => "finish install",
            Self::InstallFailed => "fail install",
            Self::ActivateStarted => "start activation",
            Self::ActivateCompleted => "finish activation",
            Self::Superseded => "supersede",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LifecycleState::*;
    use LifecycleStep::*;

    #[test]
    fn happy_path() {
        let state = Uninstalled
            .next(InstallStarted)
            .and_then(|s| s.next(InstallSucceeded))
            .and_then(|s| s.next(ActivateStarted))
            .and_then(|s| s.next(ActivateCompleted))
            .unwrap();
        assert_eq!(state, Active);
        assert!(state.is_controlling());
    }

    #[test]
    fn failed_install_is_redundant() {
        let state = Uninstalled
            .next(InstallStarted)
            .and_then(|s| s.next(InstallFailed))
            .unwrap();
        assert_eq!(state, Redundant);
        assert!(state.next(ActivateStarted).is_err());
    }

    #[test]
    fn cannot_activate_before_install() {
        let err = Uninstalled.next(ActivateStarted).unwrap_err();
        assert!(err.to_string().contains("uninstalled"));
    }

    #[test]
    fn cannot_install_twice() {
        assert!(Installed.next(InstallStarted).is_err());
        assert!(Active.next(InstallStarted).is_err());
    }

    #[test]
    fn supersede() {
        assert_eq!(Active.next(Superseded).unwrap(), Redundant);
        assert_eq!(Installed.next(Superseded).unwrap(), Redundant);
        assert!(Installing.next(Superseded).is_err());
    }

    #[test]
    fn only_active_controls() {
        for state in [Uninstalled, Installing, Installed, Activating, Redundant] {
            assert!(!state.is_controlling());
        }
    }

    #[test]
    fn state_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Installed).unwrap(), "\"installed\"");
    }
}
