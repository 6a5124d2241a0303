//! Strategy switch suggestions
//!
//! After a classified failure, proposes an alternate action the caller may
//! take instead. Suggestions are advisory: the engine attaches them to the
//! step result and never applies them.

use crate::backend::ErrorCode;
use crate::error::StepError;
use keel_plan::{Action, Step, StrategySwitch, SuggestedAction};

/// Project files that are created by an init command rather than written
const INIT_COMMANDS: &[(&str, &str)] = &[
    ("package.json", "npm init -y"),
    ("tsconfig.json", "npx tsc --init"),
    ("Cargo.toml", "cargo init"),
    ("pyproject.toml", "poetry init -n"),
];

/// Suggest an alternate action for a failed step
///
/// Only a read of a missing file has an alternative. Unrecoverable backend
/// errors and every other failure yield `None`.
#[must_use]
pub fn suggest_strategy(step: &Step, error: &StepError) -> Option<StrategySwitch> {
    let StepError::Backend(backend) = error else {
        return None;
    };
    if step.action != Action::Read || backend.code != ErrorCode::NotFound {
        return None;
    }

    let path = step.path.as_deref().unwrap_or(&backend.path);
    let name = path.rsplit('/').next().unwrap_or(path);
    let switch = match init_command(name) {
        Some(command) => StrategySwitch {
            action: SuggestedAction::Init {
                command: command.to_string(),
            },
            rationale: format!("{name} does not exist yet; scaffold it with `{command}`"),
        },
        None => StrategySwitch {
            action: SuggestedAction::Write,
            rationale: format!("{path} does not exist yet; write it instead of reading it"),
        },
    };
    Some(switch)
}

/// Init command that creates a well-known project file
#[must_use]
pub fn init_command(file_name: &str) -> Option<&'static str> {
    INIT_COMMANDS
        .iter()
        .find(|(name, _)| *name == file_name)
        .map(|(_, command)| *command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendError;

    fn not_found(path: &str) -> StepError {
        BackendError::new(ErrorCode::NotFound, path, "No such file or directory").into()
    }

    #[test]
    fn missing_read_suggests_write() {
        let step = Step::new(1, Action::Read, "r").with_path("src/store/cart.ts");
        let switch = suggest_strategy(&step, &not_found("src/store/cart.ts")).unwrap();
        assert_eq!(switch.action, SuggestedAction::Write);
        assert!(switch.rationale.contains("src/store/cart.ts"));
    }

    #[test]
    fn manifests_suggest_init() {
        for (path, command) in [
            ("package.json", "npm init -y"),
            ("app/tsconfig.json", "npx tsc --init"),
            ("Cargo.toml", "cargo init"),
            ("pyproject.toml", "poetry init -n"),
        ] {
            let step = Step::new(1, Action::Read, "r").with_path(path);
            let switch = suggest_strategy(&step, &not_found(path)).unwrap();
            assert_eq!(
                switch.action,
                SuggestedAction::Init {
                    command: command.to_string()
                }
            );
        }
    }

    #[test]
    fn no_suggestion_otherwise() {
        let read = Step::new(1, Action::Read, "r").with_path("a.ts");
        let denied: StepError = BackendError::new(ErrorCode::PermissionDenied, "a.ts", "denied").into();
        assert!(suggest_strategy(&read, &denied).is_none());

        let dir: StepError = BackendError::new(ErrorCode::IsADirectory, "a.ts", "dir").into();
        assert!(suggest_strategy(&read, &dir).is_none());

        let write = Step::new(2, Action::Write, "w").with_path("a.ts");
        assert!(suggest_strategy(&write, &not_found("a.ts")).is_none());

        let greenfield = StepError::Greenfield {
            path: "a.ts".to_string(),
        };
        assert!(suggest_strategy(&read, &greenfield).is_none());
    }
}
