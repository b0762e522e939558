//! Command parsing for the cgpt tool.
//!
//! The free words left over after option parsing decide what an invocation
//! does: a handful of reserved first words select a subcommand, anything else
//! is a message for the model.

/// A parsed invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Send the given text as the next user message.
    Send(String),

    /// Compose the next user message in the external editor.
    Edit,

    /// Point the config at a brand-new conversation.
    Reset,

    /// Interactively pick the model.
    Model,

    /// Print the config record.
    ShowConfig,

    /// Print the active conversation record.
    ShowConversation,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses the free command-line words.
///
/// `edit` is the value of the `--edit` flag. It turns a plain message into
/// [`ChatCommand::Edit`] but does not override a subcommand.
///
/// # Examples
///
/// ```
/// # use cgpt::chat::{ChatCommand, parse_command};
/// let words = vec!["show".to_string(), "chat".to_string()];
/// assert_eq!(parse_command(false, &words), ChatCommand::ShowConversation);
/// let words = vec!["hello".to_string()];
/// assert_eq!(parse_command(false, &words), ChatCommand::Send("hello".to_string()));
/// ```
pub fn parse_command(edit: bool, words: &[String]) -> ChatCommand {
    let Some((first, rest)) = words.split_first() else {
        return if edit {
            ChatCommand::Edit
        } else {
            ChatCommand::Invalid("a message is required (or use --edit)".to_string())
        };
    };

    match first.as_str() {
        "reset" if rest.is_empty() => ChatCommand::Reset,
        "model" if rest.is_empty() => ChatCommand::Model,
        "show" => match rest {
            [what] if what == "config" => ChatCommand::ShowConfig,
            [what] if what == "chat" || what == "session" => ChatCommand::ShowConversation,
            [] => ChatCommand::Invalid("show requires one of: config, chat, session".to_string()),
            _ => ChatCommand::Invalid(format!(
                "unknown show target {:?}; expected config, chat or session",
                rest.join(" ")
            )),
        },
        _ if edit => ChatCommand::Edit,
        _ => ChatCommand::Send(words.join(" ")),
    }
}

/// Returns the usage text for the tool.
pub fn usage() -> &'static str {
    r#"cgpt [OPTIONS] <MESSAGE>...
cgpt [OPTIONS] --edit
cgpt [OPTIONS] reset
cgpt [OPTIONS] model
cgpt [OPTIONS] show config
cgpt [OPTIONS] show chat|session"#
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(input: &str) -> Vec<String> {
        input.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn parse_send() {
        assert_eq!(
            parse_command(false, &words("hello")),
            ChatCommand::Send("hello".to_string())
        );
        assert_eq!(
            parse_command(false, &words("what is rust")),
            ChatCommand::Send("what is rust".to_string())
        );
    }

    #[test]
    fn parse_edit() {
        assert_eq!(parse_command(true, &[]), ChatCommand::Edit);
        assert_eq!(parse_command(true, &words("ignored text")), ChatCommand::Edit);
    }

    #[test]
    fn parse_missing_message() {
        assert!(matches!(parse_command(false, &[]), ChatCommand::Invalid(_)));
    }

    #[test]
    fn parse_reset_and_model() {
        assert_eq!(parse_command(false, &words("reset")), ChatCommand::Reset);
        assert_eq!(parse_command(false, &words("model")), ChatCommand::Model);
        assert_eq!(parse_command(true, &words("reset")), ChatCommand::Reset);
    }

    #[test]
    fn reserved_word_inside_a_sentence_is_a_message() {
        assert_eq!(
            parse_command(false, &words("reset my password please")),
            ChatCommand::Send("reset my password please".to_string())
        );
    }

    #[test]
    fn parse_show() {
        assert_eq!(parse_command(false, &words("show config")), ChatCommand::ShowConfig);
        assert_eq!(
            parse_command(false, &words("show chat")),
            ChatCommand::ShowConversation
        );
        assert_eq!(
            parse_command(false, &words("show session")),
            ChatCommand::ShowConversation
        );
    }

    #[test]
    fn parse_show_invalid() {
        assert!(matches!(parse_command(false, &words("show")), ChatCommand::Invalid(_)));
        assert!(matches!(
            parse_command(false, &words("show models")),
            ChatCommand::Invalid(_)
        ));
        assert!(matches!(
            parse_command(false, &words("show chat now")),
            ChatCommand::Invalid(_)
        ));
    }
}
