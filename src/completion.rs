// completion.rs

use crate::builtins::Builtin;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Context, Helper};
use std::os::unix::fs::PermissionsExt;

/// Completes the command word from built-in names and executables on `PATH`.
pub struct CommandCompleter;

impl CommandCompleter {
    pub fn new() -> Self {
        Self
    }
}

fn path_executables(prefix: &str) -> Vec<String> {
    let Ok(path_var) = std::env::var("PATH") else {
        return Vec::new();
    };
    let mut names = Vec::new();
    for dir in path_var.split(':').filter(|d| !d.is_empty()) {
        let Ok(entries) = std::fs::read_dir(dir) else { continue };
        for entry in entries.flatten() {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else { continue };
            if !name.starts_with(prefix) {
                continue;
            }
            let is_exec = entry
                .metadata()
                .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
                .unwrap_or(false);
            if is_exec {
                names.push(name.to_string());
            }
        }
    }
    names
}

pub fn command_candidates(prefix: &str) -> Vec<String> {
    let mut names: Vec<String> = Builtin::ALL
        .iter()
        .map(|b| b.name())
        .filter(|n| n.starts_with(prefix))
        .map(String::from)
        .collect();
    names.extend(path_executables(prefix));
    names.sort();
    names.dedup();
    names
}

impl Completer for CommandCompleter {
    type Candidate = Pair;
    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> Result<(usize, Vec<Pair>), ReadlineError> {
        let before = &line[..pos];
        let start = before.rfind(|c: char| c == ' ' || c == '\t').map_or(0, |i| i + 1);
        // only the command word is completed
        if !before[..start].trim().is_empty() {
            return Ok((pos, Vec::new()));
        }
        let completions = command_candidates(&before[start..])
            .into_iter()
            .map(|n| Pair { display: n.clone(), replacement: format!("{} ", n) })
            .collect();
        Ok((start, completions))
    }
}

impl Hinter for CommandCompleter {
    type Hint = String;
    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<String> {
        None
    }
}

impl Highlighter for CommandCompleter {}

impl Validator for CommandCompleter {
    fn validate(&self, _ctx: &mut ValidationContext) -> Result<ValidationResult, ReadlineError> {
        Ok(ValidationResult::Valid(None))
    }
}

impl Helper for CommandCompleter {}
