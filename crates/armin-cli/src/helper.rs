//! rustyline integration: completes slash commands and the arguments that
//! come from a fixed set (persona ids, setting names).

use std::borrow::Cow;

use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

use armin_core::persona::get_default_presets;

use crate::commands::COMMAND_NAMES;

const SETTING_NAMES: &[&str] = &["model", "temperature", "search", "key"];

pub struct ArminHelper {
    persona_ids: Vec<String>,
}

impl ArminHelper {
    pub fn new() -> Self {
        Self {
            persona_ids: get_default_presets().into_iter().map(|p| p.id).collect(),
        }
    }

    /// Offset of the word under the cursor and the words it can become.
    fn candidates(&self, line: &str) -> (usize, Vec<&str>) {
        if !line.starts_with('/') {
            return (0, Vec::new());
        }
        let Some((command, argument)) = line.split_once(' ') else {
            let names = COMMAND_NAMES
                .iter()
                .copied()
                .filter(|name| name.starts_with(line))
                .collect();
            return (0, names);
        };
        if argument.contains(char::is_whitespace) {
            return (0, Vec::new());
        }

        let options: Vec<&str> = match command {
            "/persona" => self.persona_ids.iter().map(String::as_str).collect(),
            "/settings" => SETTING_NAMES.to_vec(),
            _ => Vec::new(),
        };
        let matching = options
            .into_iter()
            .filter(|option| option.starts_with(argument))
            .collect();
        (command.len() + 1, matching)
    }
}

impl Helper for ArminHelper {}

impl Completer for ArminHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, words) = self.candidates(&line[..pos]);
        let pairs = words
            .into_iter()
            .map(|word| Pair {
                display: word.to_string(),
                replacement: word.to_string(),
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for ArminHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        if pos < line.len() {
            return None;
        }
        let (start, words) = self.candidates(line);
        let typed = line.len() - start;
        words
            .into_iter()
            .find(|word| word.len() > typed)
            .map(|word| word[typed..].to_string())
    }
}

impl Highlighter for ArminHelper {
    /// Colors the command word only; arguments stay plain.
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if !line.starts_with('/') {
            return Cow::Borrowed(line);
        }
        match line.split_once(' ') {
            Some((command, rest)) => Cow::Owned(format!("{} {}", command.bright_cyan(), rest)),
            None => Cow::Owned(line.bright_cyan().to_string()),
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(hint.bright_black().to_string())
    }

    fn highlight_char(&self, line: &str, _pos: usize, _forced: bool) -> bool {
        line.starts_with('/')
    }
}

impl Validator for ArminHelper {}
