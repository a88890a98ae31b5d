//! REPL input parsing.

use std::path::PathBuf;

/// One line of user input, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    NewTopic,
    Continue,
    Models,
    /// `/persona` with no argument shows the current persona.
    Persona(Option<String>),
    Analysis,
    Export(PathBuf),
    Help,
    Quit,
    /// Anything that is not a command is sent to the tutor.
    Submit(String),
    /// A slash command that needs an argument it did not get, or is unknown.
    Invalid(String),
    Empty,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Submit(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match name.to_ascii_lowercase().as_str() {
            "new" => Command::NewTopic,
            "continue" | "c" => Command::Continue,
            "models" => Command::Models,
            "persona" if arg.is_empty() => Command::Persona(None),
            "persona" => Command::Persona(Some(arg.to_string())),
            "analysis" | "a" => Command::Analysis,
            "export" if arg.is_empty() => Command::Invalid("usage: /export <path>".to_string()),
            "export" => Command::Export(PathBuf::from(arg)),
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => Command::Invalid(format!("unknown command: /{other} (try /help)")),
        }
    }
}

pub const HELP: &str = "\
Commands:
  /new              start a new topic
  /continue, /c     let the tutor keep talking about the current topic
  /models           list available models
  /persona [text]   show or change the tutor persona (saved to config)
  /analysis, /a     show the current topic with grammar analyses
  /export <path>    write the conversation as JSON
  /help             show this help
  /quit             exit
Anything else is sent to the tutor. Chinese input is translated first.";
