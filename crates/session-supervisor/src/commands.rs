//! Operator command parsing.

/// What a line of operator text asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
    /// `/restart`
    Restart,
    /// `/logout`
    Logout,
    /// `/forcelogout`
    ForceLogout,
    /// The confirm token.
    Confirm,
    /// Anything else.
    Other,
}

impl OperatorCommand {
    /// Parse trimmed operator text.
    ///
    /// Slash commands match on a case-insensitive prefix. The confirm token
    /// must match exactly after trimming, ignoring case.
    pub fn parse(text: &str, confirm_token: &str) -> Self {
        let normalized = text.trim().to_lowercase();

        if normalized.starts_with("/forcelogout") {
            OperatorCommand::ForceLogout
        } else if normalized.starts_with("/logout") {
            OperatorCommand::Logout
        } else if normalized.starts_with("/restart") {
            OperatorCommand::Restart
        } else if !normalized.is_empty() && normalized == confirm_token.trim().to_lowercase() {
            OperatorCommand::Confirm
        } else {
            OperatorCommand::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_token_is_trimmed_and_case_insensitive() {
        assert_eq!(OperatorCommand::parse("si", "si"), OperatorCommand::Confirm);
        assert_eq!(OperatorCommand::parse("  SI \n", "si"), OperatorCommand::Confirm);
        assert_eq!(OperatorCommand::parse("Si", " SI "), OperatorCommand::Confirm);
    }

    #[test]
    fn test_near_misses_are_not_confirm() {
        assert_eq!(OperatorCommand::parse("sii", "si"), OperatorCommand::Other);
        assert_eq!(OperatorCommand::parse("si por favor", "si"), OperatorCommand::Other);
        assert_eq!(OperatorCommand::parse("", "si"), OperatorCommand::Other);
    }

    #[test]
    fn test_blank_token_never_confirms() {
        assert_eq!(OperatorCommand::parse("   ", "  "), OperatorCommand::Other);
    }

    #[test]
    fn test_slash_commands() {
        assert_eq!(OperatorCommand::parse("/restart", "si"), OperatorCommand::Restart);
        assert_eq!(OperatorCommand::parse("/logout", "si"), OperatorCommand::Logout);
        assert_eq!(
            OperatorCommand::parse("/forcelogout", "si"),
            OperatorCommand::ForceLogout
        );
    }

    #[test]
    fn test_slash_commands_match_prefix_ignoring_case() {
        assert_eq!(
            OperatorCommand::parse("/Restart@warden_bot", "si"),
            OperatorCommand::Restart
        );
        assert_eq!(OperatorCommand::parse("  /LOGOUT now", "si"), OperatorCommand::Logout);
        assert_eq!(OperatorCommand::parse("restart", "si"), OperatorCommand::Other);
    }
}
