//! Line commands for `file-navigator session`, which keeps one search engine
//! alive so history, suggestions and popular searches carry across queries.

use anyhow::{bail, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Search(String),
    Suggest(String),
    Popular,
    History,
    Quit,
}

/// Parses one input line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<SessionCommand>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let command = match verb {
        "search" | "s" => SessionCommand::Search(rest.to_string()),
        "suggest" => {
            if rest.is_empty() {
                bail!("suggest needs a partial text");
            }
            SessionCommand::Suggest(rest.to_string())
        }
        "popular" => SessionCommand::Popular,
        "history" => SessionCommand::History,
        "quit" | "exit" => SessionCommand::Quit,
        other => bail!("unknown session command {other:?} (search, suggest, popular, history, quit)"),
    };
    Ok(Some(command))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_verbs_and_trims_text() {
        assert_eq!(
            parse_line("  search   pump room  ").unwrap(),
            Some(SessionCommand::Search("pump room".into()))
        );
        assert_eq!(parse_line("s").unwrap(), Some(SessionCommand::Search(String::new())));
        assert_eq!(parse_line("popular").unwrap(), Some(SessionCommand::Popular));
        assert_eq!(parse_line("exit").unwrap(), Some(SessionCommand::Quit));
        assert_eq!(parse_line("# note").unwrap(), None);
        assert_eq!(parse_line("   ").unwrap(), None);
    }

    #[test]
    fn rejects_unknown_verbs_and_empty_suggest() {
        assert!(parse_line("delete everything").is_err());
        assert!(parse_line("suggest").is_err());
    }
}
