//! Command parser - Splits prefixed text into command token and arguments

/// A prefixed message split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// First token after the prefix, lower-cased
    pub command: String,
    /// Everything after the command token, leading whitespace removed
    pub text: String,
    /// `text` split on whitespace, empties removed
    pub args: Vec<String>,
}

/// Recognises command invocations by their prefix
#[derive(Debug, Clone)]
pub struct CommandParser {
    prefix: String,
}

impl CommandParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Parse a message text. Returns None when the text is not a command:
    /// it lacks the prefix or nothing but whitespace follows it directly.
    pub fn parse(&self, text: &str) -> Option<ParsedCommand> {
        let body = text.strip_prefix(self.prefix.as_str())?;

        // ". ping" is not a command: the token must touch the prefix
        if body.is_empty() || body.starts_with(char::is_whitespace) {
            return None;
        }

        let (token, rest) = match body.find(char::is_whitespace) {
            Some(idx) => (&body[..idx], &body[idx..]),
            None => (body, ""),
        };
        let text = rest.trim_start().to_string();
        let args = text.split_whitespace().map(String::from).collect();

        Some(ParsedCommand {
            command: token.to_lowercase(),
            text,
            args,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_with_args() {
        let parser = CommandParser::new(".");
        let parsed = parser.parse(".BC group  hello   world").unwrap();
        assert_eq!(parsed.command, "bc");
        assert_eq!(parsed.text, "group  hello   world");
        assert_eq!(parsed.args, vec!["group", "hello", "world"]);
    }

    #[test]
    fn test_parse_bare_command() {
        let parsed = CommandParser::new(".").parse(".ping").unwrap();
        assert_eq!(parsed.command, "ping");
        assert!(parsed.text.is_empty());
        assert!(parsed.args.is_empty());
    }

    #[test]
    fn test_multi_char_prefix() {
        let parsed = CommandParser::new("!!").parse("!!Menu\nnext line").unwrap();
        assert_eq!(parsed.command, "menu");
        assert_eq!(parsed.text, "next line");
    }

    #[test]
    fn test_non_commands_ignored() {
        let parser = CommandParser::new(".");
        assert!(parser.parse("ping").is_none());
        assert!(parser.parse(" .ping").is_none());
        assert!(parser.parse(".").is_none());
        assert!(parser.parse(". ping").is_none());
        assert!(parser.parse("").is_none());
    }
}
