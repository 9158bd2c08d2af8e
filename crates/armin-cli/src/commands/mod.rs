//! REPL command parsing.
//!
//! Lines starting with `/` are commands; anything else is sent as a chat
//! message. Message numbers are 1-based, as shown by `/history`.

use std::path::PathBuf;

/// Commands offered for completion and hints.
pub const COMMAND_NAMES: &[&str] = &[
    "/attach",
    "/edit",
    "/steps",
    "/stop",
    "/persona",
    "/personas",
    "/image",
    "/analyze",
    "/vision",
    "/settings",
    "/history",
    "/help",
    "/quit",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Plain text: send as a chat message with any pending attachments.
    Send(String),
    /// Queue files for the next message. No paths lists the queue.
    Attach(Vec<PathBuf>),
    Edit { number: usize, text: String },
    Steps(usize),
    Stop,
    Persona(String),
    Personas,
    Image(String),
    Analyze { paths: Vec<PathBuf>, prompt: String },
    Vision { path: PathBuf, prompt: String },
    Settings(Option<SettingChange>),
    History,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettingChange {
    Model(String),
    Temperature(f32),
    Search(bool),
    ApiKey(String),
}

/// Parses one trimmed, non-empty input line.
pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    if !line.starts_with('/') {
        return Ok(Command::Send(line.to_string()));
    }

    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    match name {
        "/attach" => Ok(Command::Attach(paths(rest))),
        "/edit" => {
            let (number, text) = split_number(rest, "/edit <n> <text>")?;
            if text.is_empty() {
                return Err("usage: /edit <n> <text>".to_string());
            }
            Ok(Command::Edit { number, text })
        }
        "/steps" => {
            let (number, _) = split_number(rest, "/steps <n>")?;
            Ok(Command::Steps(number))
        }
        "/stop" => Ok(Command::Stop),
        "/persona" if rest.is_empty() => Err("usage: /persona <id>".to_string()),
        "/persona" => Ok(Command::Persona(rest.to_string())),
        "/personas" => Ok(Command::Personas),
        "/image" if rest.is_empty() => Err("usage: /image <prompt>".to_string()),
        "/image" => Ok(Command::Image(rest.to_string())),
        "/analyze" => {
            let (files, prompt) = match rest.split_once("--") {
                Some((files, prompt)) => (files, prompt.trim()),
                None => (rest, ""),
            };
            let paths = paths(files);
            if paths.is_empty() {
                return Err("usage: /analyze <path>... [-- prompt]".to_string());
            }
            Ok(Command::Analyze {
                paths,
                prompt: prompt.to_string(),
            })
        }
        "/vision" => {
            let (path, prompt) = match rest.split_once(char::is_whitespace) {
                Some((path, prompt)) => (path, prompt.trim()),
                None => (rest, ""),
            };
            if path.is_empty() {
                return Err("usage: /vision <path> [prompt]".to_string());
            }
            Ok(Command::Vision {
                path: PathBuf::from(path),
                prompt: prompt.to_string(),
            })
        }
        "/settings" => parse_setting(rest).map(Command::Settings),
        "/history" => Ok(Command::History),
        "/help" => Ok(Command::Help),
        "/quit" | "/exit" => Ok(Command::Quit),
        other => Err(format!("Unknown command: {other} (try /help)")),
    }
}

fn paths(rest: &str) -> Vec<PathBuf> {
    rest.split_whitespace().map(PathBuf::from).collect()
}

fn split_number(rest: &str, usage: &str) -> Result<(usize, String), String> {
    let (number, text) = match rest.split_once(char::is_whitespace) {
        Some((number, text)) => (number, text.trim()),
        None => (rest, ""),
    };
    match number.parse::<usize>() {
        Ok(n) if n > 0 => Ok((n, text.to_string())),
        _ => Err(format!("usage: {usage}")),
    }
}

fn parse_setting(rest: &str) -> Result<Option<SettingChange>, String> {
    if rest.is_empty() {
        return Ok(None);
    }
    let usage = "usage: /settings [model <id> | temperature <0-2> | search on|off | key <api-key>]";
    let (key, value) = rest.split_once(char::is_whitespace).ok_or(usage)?;
    let value = value.trim();

    let change = match key {
        "model" => SettingChange::Model(value.to_string()),
        "temperature" => {
            let temperature = value
                .parse::<f32>()
                .map_err(|_| format!("Not a number: {value}"))?;
            SettingChange::Temperature(temperature)
        }
        "search" => match value {
            "on" | "true" => SettingChange::Search(true),
            "off" | "false" => SettingChange::Search(false),
            _ => return Err(usage.to_string()),
        },
        "key" => SettingChange::ApiKey(value.to_string()),
        _ => return Err(usage.to_string()),
    };
    Ok(Some(change))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_send() {
        assert_eq!(parse("hello there"), Ok(Command::Send("hello there".to_string())));
    }

    #[test]
    fn test_edit_and_steps() {
        assert_eq!(
            parse("/edit 3 what about 4?"),
            Ok(Command::Edit {
                number: 3,
                text: "what about 4?".to_string()
            })
        );
        assert_eq!(parse("/steps 2"), Ok(Command::Steps(2)));
        assert!(parse("/edit 0 text").is_err());
        assert!(parse("/edit 2").is_err());
        assert!(parse("/steps x").is_err());
    }

    #[test]
    fn test_analyze_with_prompt() {
        assert_eq!(
            parse("/analyze a.pdf notes.md -- compare them"),
            Ok(Command::Analyze {
                paths: vec![PathBuf::from("a.pdf"), PathBuf::from("notes.md")],
                prompt: "compare them".to_string()
            })
        );
        assert_eq!(
            parse("/analyze data.csv"),
            Ok(Command::Analyze {
                paths: vec![PathBuf::from("data.csv")],
                prompt: String::new()
            })
        );
        assert!(parse("/analyze -- only prompt").is_err());
    }

    #[test]
    fn test_vision_prompt_is_optional() {
        assert_eq!(
            parse("/vision cat.png what breed?"),
            Ok(Command::Vision {
                path: PathBuf::from("cat.png"),
                prompt: "what breed?".to_string()
            })
        );
        assert_eq!(
            parse("/vision cat.png"),
            Ok(Command::Vision {
                path: PathBuf::from("cat.png"),
                prompt: String::new()
            })
        );
    }

    #[test]
    fn test_settings_changes() {
        assert_eq!(parse("/settings"), Ok(Command::Settings(None)));
        assert_eq!(
            parse("/settings temperature 1.5"),
            Ok(Command::Settings(Some(SettingChange::Temperature(1.5))))
        );
        assert_eq!(
            parse("/settings search off"),
            Ok(Command::Settings(Some(SettingChange::Search(false))))
        );
        assert!(parse("/settings search maybe").is_err());
        assert!(parse("/settings colour blue").is_err());
    }

    #[test]
    fn test_attach_without_paths_lists_queue() {
        assert_eq!(parse("/attach"), Ok(Command::Attach(Vec::new())));
        assert_eq!(
            parse("/attach a.txt b.png"),
            Ok(Command::Attach(vec![PathBuf::from("a.txt"), PathBuf::from("b.png")]))
        );
    }

    #[test]
    fn test_unknown_command() {
        assert!(parse("/dance").unwrap_err().contains("/dance"));
        assert_eq!(parse("/exit"), Ok(Command::Quit));
    }
}
