// repl.rs

use crate::builtins::help_block;
use crate::config::{Config, EditorMode};
use crate::dispatch::{Flow, Shell, ShellState};
use crate::error::ShellError;
use crate::process::reap_finished;
use crate::reader::{read_command, EditorSource, LineSource, RawStdin, ReadOutcome};
use nix::unistd::isatty;
use std::io::{self, Write};
use tracing::{debug, trace, warn};

pub fn start_repl(config: &Config) {
    let state = ShellState::new(config.history_capacity);
    let mut shell = Shell::new(state, io::stdout(), io::stderr());
    let mut source = open_source(config);
    run_loop(source.as_mut(), &mut shell);
}

fn open_source(config: &Config) -> Box<dyn LineSource> {
    let interactive = isatty(libc::STDIN_FILENO).unwrap_or(false);
    if config.editor == EditorMode::Auto && interactive {
        match EditorSource::new() {
            Ok(editor) => {
                debug!("reading commands through the line editor");
                return Box::new(editor);
            }
            Err(e) => warn!("line editor unavailable, falling back to raw input: {}", e),
        }
    }
    debug!("reading commands with read(2)");
    Box::new(RawStdin::stdin())
}

fn prompt<O: Write, E: Write>(shell: &mut Shell<O, E>) -> String {
    match std::env::current_dir() {
        Ok(cwd) => format!("{}$ ", cwd.display()),
        Err(_) => {
            shell.report(&ShellError::CurrentDir("shell"));
            String::new()
        }
    }
}

/// Prompt, read, dispatch, reap. Returns on `exit` or end of input.
pub fn run_loop<S, O, E>(source: &mut S, shell: &mut Shell<O, E>) -> Flow
where
    S: LineSource + ?Sized,
    O: Write,
    E: Write,
{
    loop {
        let prompt_text = prompt(shell);
        match read_command(source, &prompt_text, shell) {
            ReadOutcome::Line(line) => {
                if shell.dispatch_line(&line) == Flow::Exit {
                    return Flow::Exit;
                }
            }
            ReadOutcome::Interrupted => {
                shell.print("\n");
                shell.print(help_block());
            }
            ReadOutcome::Failed => {}
            ReadOutcome::Eof => {
                debug!("end of input");
                shell.print("\n");
                return Flow::Continue;
            }
        }
        let reaped = reap_finished();
        if reaped > 0 {
            trace!(reaped, "reap pass");
        }
    }
}
