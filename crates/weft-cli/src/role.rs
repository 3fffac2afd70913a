//! Role guards for CLI command access control.
//!
//! The guard enforces the trust model:
//! - Operator role (default): full command surface
//! - Agent role (WEFT_ROLE=agent): read-only commands only, so automation
//!   reading a plan cannot rewrite it

use crate::Commands;

/// Environment variable selecting the role.
pub const ROLE_ENV: &str = "WEFT_ROLE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Operator,
    Agent,
}

/// Errors from role guard checks.
#[derive(Debug, thiserror::Error)]
pub enum RoleError {
    #[error("this command is not available in agent role (WEFT_ROLE=agent)")]
    AgentRoleBlocked,

    #[error("unrecognized WEFT_ROLE value: {0} (expected \"operator\" or \"agent\")")]
    UnknownRole(String),
}

/// Read the role from the environment. Unset means operator.
pub fn current_role() -> Result<Role, RoleError> {
    role_from_value(std::env::var(ROLE_ENV).ok())
}

/// Parse a role from an explicit value (testable without env vars).
pub fn role_from_value(value: Option<String>) -> Result<Role, RoleError> {
    match value.as_deref() {
        None | Some("") | Some("operator") => Ok(Role::Operator),
        Some("agent") => Ok(Role::Agent),
        Some(other) => Err(RoleError::UnknownRole(other.to_string())),
    }
}

/// Reject mutating commands when running in the agent role.
pub fn check_command(role: Result<Role, RoleError>, command: &Commands) -> Result<(), RoleError> {
    match role? {
        Role::Operator => Ok(()),
        Role::Agent => {
            if is_read_only(command) {
                Ok(())
            } else {
                Err(RoleError::AgentRoleBlocked)
            }
        }
    }
}

fn is_read_only(command: &Commands) -> bool {
    matches!(
        command,
        Commands::Report { .. }
            | Commands::Validate { .. }
            | Commands::Questions { .. }
            | Commands::Inputs { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_role_is_operator() {
        assert_eq!(role_from_value(None).unwrap(), Role::Operator);
        assert_eq!(role_from_value(Some(String::new())).unwrap(), Role::Operator);
    }

    #[test]
    fn unknown_role_is_rejected() {
        let err = role_from_value(Some("admin".to_string())).unwrap_err();
        assert!(matches!(err, RoleError::UnknownRole(_)));
    }

    #[test]
    fn agent_role_allows_read_only_commands() {
        for command in [
            Commands::Report { json: false },
            Commands::Validate { json: true },
            Commands::Questions { json: false },
            Commands::Inputs { json: false },
        ] {
            assert!(check_command(Ok(Role::Agent), &command).is_ok());
        }
    }

    #[test]
    fn agent_role_blocks_mutating_commands() {
        let command = Commands::AddStage {
            name: "X".to_string(),
        };
        let err = check_command(Ok(Role::Agent), &command).unwrap_err();
        assert!(matches!(err, RoleError::AgentRoleBlocked));
    }

    #[test]
    fn operator_role_allows_everything() {
        let command = Commands::AddThread {
            stage: 1,
            batch: 0,
            name: "X".to_string(),
        };
        assert!(check_command(Ok(Role::Operator), &command).is_ok());
    }
}
