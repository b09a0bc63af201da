//! # Action Validation
//!
//! Syntactic gate run before every action. Never touches the filesystem.

use crate::domain::error::Violation;
use crate::domain::types::AgentAction;

/// Checks an action's structural preconditions.
pub fn validate(action: &AgentAction) -> Result<(), Violation> {
    if let Some(path) = action.path() {
        check_path(path)?;
    }

    match action {
        AgentAction::ExecuteCommand { command, .. } if command.trim().is_empty() => {
            Err(Violation::EmptyCommand)
        }
        AgentAction::ModifyFile { search, .. } if search.is_empty() => Err(Violation::EmptySearch),
        _ => Ok(()),
    }
}

fn check_path(path: &str) -> Result<(), Violation> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(Violation::EmptyPath);
    }
    if trimmed.contains("..") {
        return Err(Violation::PathTraversal(path.to_string()));
    }
    if is_absolute(trimmed) {
        return Err(Violation::AbsolutePath(path.to_string()));
    }
    Ok(())
}

/// Rooted on either platform: `/x`, `\x`, `C:...`.
fn is_absolute(path: &str) -> bool {
    if path.starts_with('/') || path.starts_with('\\') {
        return true;
    }
    let mut chars = path.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(drive), Some(':')) if drive.is_ascii_alphabetic()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_path_variants(path: &str) -> Vec<AgentAction> {
        vec![
            AgentAction::CreateFile {
                path: path.into(),
                content: "content".into(),
            },
            AgentAction::CreateDirectory { path: path.into() },
            AgentAction::ModifyFile {
                path: path.into(),
                search: "a".into(),
                replace: "b".into(),
            },
            AgentAction::ReadFile { path: path.into() },
        ]
    }

    #[test]
    fn test_valid_actions() {
        for action in all_path_variants("src/main.rs") {
            assert_eq!(validate(&action), Ok(()), "{action}");
        }
        let cmd = AgentAction::ExecuteCommand {
            command: "cargo build".into(),
            description: None,
        };
        assert_eq!(validate(&cmd), Ok(()));
    }

    #[test]
    fn test_traversal_rejected_for_every_variant() {
        for path in ["../etc/passwd", "a/../../b", "..", "foo..bar"] {
            for action in all_path_variants(path) {
                assert!(
                    matches!(validate(&action), Err(Violation::PathTraversal(_))),
                    "{action} should be rejected"
                );
            }
        }
    }

    #[test]
    fn test_empty_and_absolute_paths() {
        for action in all_path_variants("  ") {
            assert_eq!(validate(&action), Err(Violation::EmptyPath));
        }
        for path in ["/etc/passwd", "\\\\server\\share", "C:\\Windows"] {
            for action in all_path_variants(path) {
                assert!(matches!(validate(&action), Err(Violation::AbsolutePath(_))));
            }
        }
    }

    #[test]
    fn test_empty_command() {
        let cmd = AgentAction::ExecuteCommand {
            command: " \n".into(),
            description: Some("nothing".into()),
        };
        assert_eq!(validate(&cmd), Err(Violation::EmptyCommand));
    }

    #[test]
    fn test_empty_search_independent_of_path() {
        let modify = AgentAction::ModifyFile {
            path: "ok.txt".into(),
            search: String::new(),
            replace: "x".into(),
        };
        assert_eq!(validate(&modify), Err(Violation::EmptySearch));

        // Path problems are reported first.
        let both = AgentAction::ModifyFile {
            path: String::new(),
            search: String::new(),
            replace: String::new(),
        };
        assert_eq!(validate(&both), Err(Violation::EmptyPath));
    }
}
