//! Slash-command names understood by the bot.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    Start,
    Pairs,
    Major,
    Minor,
    Exotic,
    Random,
    Stats,
    Help,
}

impl Command {
    pub const ALL: [Command; 8] = [
        Command::Start,
        Command::Pairs,
        Command::Major,
        Command::Minor,
        Command::Exotic,
        Command::Random,
        Command::Stats,
        Command::Help,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Pairs => "pairs",
            Command::Major => "major",
            Command::Minor => "minor",
            Command::Exotic => "exotic",
            Command::Random => "random",
            Command::Stats => "stats",
            Command::Help => "help",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Parse a message like `/major@forex_bot extra` into a command.
    ///
    /// Arguments are ignored; `None` for non-commands and unknown names.
    pub fn parse(text: &str) -> Option<Self> {
        let (name, _args) = parse_command(text)?;
        Self::from_name(&name)
    }

    /// The entry command: greets the user and shows the main menu.
    pub fn is_entry(self) -> bool {
        self == Command::Start
    }
}

fn parse_command(text: &str) -> Option<(String, String)> {
    let text = text.trim();
    if !text.starts_with('/') {
        return None;
    }

    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    if cmd.is_empty() {
        return None;
    }
    Some((cmd, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_addressed_commands() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("/MAJOR"), Some(Command::Major));
        assert_eq!(Command::parse("/pairs@forex_pairs_bot"), Some(Command::Pairs));
        assert_eq!(Command::parse("  /help please "), Some(Command::Help));
    }

    #[test]
    fn rejects_non_commands() {
        assert_eq!(Command::parse("start"), None);
        assert_eq!(Command::parse("/"), None);
        assert_eq!(Command::parse("/unknown"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn only_start_is_entry() {
        let entries: Vec<Command> = Command::ALL.into_iter().filter(|c| c.is_entry()).collect();
        assert_eq!(entries, vec![Command::Start]);
    }
}
