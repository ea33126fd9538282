use super::types::Command;

/// Parse a chat line into a command. Plain text and unknown commands are
/// left for the pipeline. A bare `exit` also quits.
pub fn parse_command(input: &str) -> Option<Command> {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
        return Some(Command::Exit);
    }
    if !trimmed.starts_with('/') {
        return None;
    }

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let cmd = parts.next()?.to_lowercase();
    let args = parts.next().unwrap_or("").trim().to_lowercase();

    match cmd.as_str() {
        "/new" | "/reset" => Some(Command::New),
        "/debug" => Some(Command::Debug {
            enabled: match args.as_str() {
                "on" | "true" => Some(true),
                "off" | "false" => Some(false),
                _ => None,
            },
        }),
        "/history" => Some(Command::History),
        "/help" | "/?" => Some(Command::Help),
        "/exit" | "/quit" => Some(Command::Exit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_command() {
        assert_eq!(parse_command("/help"), Some(Command::Help));
    }

    #[test]
    fn help_question_mark() {
        assert_eq!(parse_command("/?"), Some(Command::Help));
    }

    #[test]
    fn commands_are_case_insensitive() {
        assert_eq!(parse_command("/NEW"), Some(Command::New));
    }

    #[test]
    fn reset_alias() {
        assert_eq!(parse_command("/reset"), Some(Command::New));
    }

    #[test]
    fn debug_toggle_and_explicit() {
        assert_eq!(
            parse_command("/debug"),
            Some(Command::Debug { enabled: None })
        );
        assert_eq!(
            parse_command("/debug ON"),
            Some(Command::Debug {
                enabled: Some(true)
            })
        );
        assert_eq!(
            parse_command("/debug off"),
            Some(Command::Debug {
                enabled: Some(false)
            })
        );
    }

    #[test]
    fn bare_exit_quits() {
        assert_eq!(parse_command("  exit "), Some(Command::Exit));
        assert_eq!(parse_command("Quit"), Some(Command::Exit));
        assert_eq!(parse_command("/exit"), Some(Command::Exit));
    }

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(parse_command("build an exit plan"), None);
        assert_eq!(parse_command("hello"), None);
    }

    #[test]
    fn unknown_command() {
        assert_eq!(parse_command("/foobar"), None);
    }

    #[test]
    fn empty_input() {
        assert_eq!(parse_command(""), None);
    }
}
