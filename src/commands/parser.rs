//! Turns a raw queued line into the command it stands for.

pub const BAN_PREFIX: &str = "/ban ";
pub const BLOCKED_TERM_PREFIX: &str = "/add_blocked_term ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    SendMessage(String),
    BanUser {
        target: String,
        reason: Option<String>,
    },
    AddBlockedTerm(String),
}

/// Parses one line. `None` means the line uses a command prefix but has no
/// usable payload and should be skipped.
pub fn parse_line(line: &str) -> Option<ChatCommand> {
    if let Some(rest) = line.strip_prefix(BAN_PREFIX) {
        // The target starts right after the prefix; "/ban  alice" has none.
        let (target, reason) = match rest.split_once(char::is_whitespace) {
            Some((target, reason)) => (target, reason.trim()),
            None => (rest, ""),
        };
        if target.is_empty() {
            return None;
        }
        return Some(ChatCommand::BanUser {
            target: target.to_string(),
            reason: (!reason.is_empty()).then(|| reason.to_string()),
        });
    }

    if let Some(rest) = line.strip_prefix(BLOCKED_TERM_PREFIX) {
        let phrase = rest.trim();
        if phrase.is_empty() {
            return None;
        }
        return Some(ChatCommand::AddBlockedTerm(phrase.to_string()));
    }

    Some(ChatCommand::SendMessage(line.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ban(target: &str, reason: Option<&str>) -> Option<ChatCommand> {
        Some(ChatCommand::BanUser {
            target: target.to_string(),
            reason: reason.map(str::to_string),
        })
    }

    #[test]
    fn test_ban_with_reason() {
        assert_eq!(parse_line("/ban alice spamming"), ban("alice", Some("spamming")));
        assert_eq!(
            parse_line("/ban alice repeated link spam"),
            ban("alice", Some("repeated link spam"))
        );
    }

    #[test]
    fn test_ban_without_reason() {
        assert_eq!(parse_line("/ban alice"), ban("alice", None));
        assert_eq!(parse_line("/ban alice   "), ban("alice", None));
    }

    #[test]
    fn test_ban_without_target_is_skipped() {
        assert_eq!(parse_line("/ban "), None);
        assert_eq!(parse_line("/ban    "), None);
        assert_eq!(parse_line("/ban  alice"), None);
        assert_eq!(parse_line("/ban \talice spamming"), None);
    }

    #[test]
    fn test_blocked_term() {
        assert_eq!(
            parse_line("/add_blocked_term buy followers"),
            Some(ChatCommand::AddBlockedTerm("buy followers".to_string()))
        );
        assert_eq!(
            parse_line("/add_blocked_term   cheap viewers  "),
            Some(ChatCommand::AddBlockedTerm("cheap viewers".to_string()))
        );
    }

    #[test]
    fn test_empty_blocked_term_is_skipped() {
        assert_eq!(parse_line("/add_blocked_term "), None);
        assert_eq!(parse_line("/add_blocked_term \t "), None);
    }

    #[test]
    fn test_everything_else_is_a_message() {
        for line in [
            "hello chat",
            "please /ban alice",
            "/ban",
            "/banana split",
            "/add_blocked_term",
            "/me waves",
            "  /ban alice",
        ] {
            assert_eq!(
                parse_line(line),
                Some(ChatCommand::SendMessage(line.to_string())),
                "line: {line:?}"
            );
        }
    }
}
