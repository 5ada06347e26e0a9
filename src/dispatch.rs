// dispatch.rs

use crate::builtins::{self, Builtin};
use crate::error::{Result, ShellError};
use crate::history::HistoryStore;
use crate::parser::{tokenize, Invocation};
use crate::process;
use crate::recall;
use crate::util::{write_ignore_broken_pipe, writeln_ignore_broken_pipe};
use std::io::Write;
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;

/// Interpreter state that outlives a single command.
pub struct ShellState {
    pub history: HistoryStore,
    /// Directory left by the last successful `cd`, for `cd -`.
    pub last_dir: Option<PathBuf>,
}

impl ShellState {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            history: HistoryStore::new(history_capacity),
            last_dir: None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Shell<O: Write, E: Write> {
    pub state: ShellState,
    out: O,
    err: E,
}

impl<O: Write, E: Write> Shell<O, E> {
    pub fn new(state: ShellState, out: O, err: E) -> Self {
        Self { state, out, err }
    }

    pub fn print<B: AsRef<[u8]>>(&mut self, bytes: B) {
        let _ = write_ignore_broken_pipe(&mut self.out, bytes);
    }

    pub fn report(&mut self, error: &ShellError) {
        let _ = writeln_ignore_broken_pipe(&mut self.err, error.to_string());
    }

    /// Tokenizes and runs one line. Errors are reported, never returned.
    pub fn dispatch_line<L: AsRef<[u8]>>(&mut self, line: L) -> Flow {
        self.dispatch(line.as_ref(), true)
    }

    fn dispatch(&mut self, line: &[u8], allow_recall: bool) -> Flow {
        let invocation = tokenize(line);
        match self.execute(&invocation, allow_recall) {
            Ok(flow) => flow,
            Err(e) => {
                self.report(&e);
                Flow::Continue
            }
        }
    }

    fn execute(&mut self, invocation: &Invocation, allow_recall: bool) -> Result<Flow> {
        let Some(program) = invocation.program() else {
            return Ok(Flow::Continue);
        };
        let args = &invocation.args;
        match Builtin::from_name(program) {
            Some(Builtin::Exit) => {
                builtins::exit(args)?;
                return Ok(Flow::Exit);
            }
            Some(Builtin::Pwd) => {
                let cwd = builtins::pwd(args)?;
                self.print(cwd);
            }
            Some(Builtin::Cd) => builtins::cd(args, &mut self.state.last_dir)?,
            Some(Builtin::Help) => {
                let text = builtins::help(args)?;
                self.print(text);
            }
            Some(Builtin::History) => {
                let listing = builtins::history(args, &self.state.history)?;
                self.print(listing);
            }
            None if recall::is_recall(program.as_bytes()) => {
                return self.recall(program.as_bytes(), allow_recall);
            }
            None => {
                process::run(invocation)?;
            }
        }
        Ok(Flow::Continue)
    }

    /// A recalled line is echoed and recorded as a new entry before it runs.
    /// It may not itself be another recall.
    fn recall(&mut self, expr: &[u8], allow_recall: bool) -> Result<Flow> {
        if !allow_recall {
            return Err(ShellError::RecursiveReference);
        }
        let mut line = recall::resolve(expr, &self.state.history)?;
        self.state.history.record(&line);
        line.push(b'\n');
        self.print(&line);
        Ok(self.dispatch(&line, false))
    }
}

#[cfg(test)]
impl Shell<Vec<u8>, Vec<u8>> {
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.out).into_owned()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.err).into_owned()
    }
}
