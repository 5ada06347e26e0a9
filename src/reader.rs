// reader.rs

use crate::completion::CommandCompleter;
use crate::config::MAX_LINE;
use crate::dispatch::Shell;
use crate::error::ShellError;
use crate::recall;
use crate::signals::take_interrupt;
use crate::util::write_ignore_broken_pipe;
use bytes::BytesMut;
use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags};
use nix::unistd::read;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{CompletionType, Config, Editor};
use std::io::{self, Write};
use std::os::unix::io::RawFd;

#[derive(Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Raw bytes as read, terminator stripped.
    Line(Vec<u8>),
    /// SIGINT arrived first; nothing was read.
    Interrupted,
    /// Already reported on stderr.
    Failed,
    Eof,
}

pub trait LineSource {
    /// Shows `prompt` and blocks until a full line (terminator stripped),
    /// an interrupt, or end of input.
    fn fetch(&mut self, prompt: &str) -> io::Result<ReadOutcome>;
}

// SIGINT can land between the flag check and the blocking call, so waits
// are bounded and the flag is looked at again after each one.
const POLL_INTERVAL_MS: libc::c_int = 100;

fn clip(raw: &[u8]) -> Vec<u8> {
    raw[..raw.len().min(MAX_LINE)].to_vec()
}

/// Reads one command and records it unless it is a recall expression,
/// which gets recorded after it resolves.
pub fn read_command<S, O, E>(
    source: &mut S,
    prompt: &str,
    shell: &mut Shell<O, E>,
) -> ReadOutcome
where
    S: LineSource + ?Sized,
    O: Write,
    E: Write,
{
    match source.fetch(prompt) {
        Ok(ReadOutcome::Line(line)) => {
            if !recall::is_recall(&line) {
                shell.state.history.record(&line);
            }
            ReadOutcome::Line(line)
        }
        Ok(other) => other,
        Err(e) => {
            shell.report(&ShellError::Read(e));
            ReadOutcome::Failed
        }
    }
}

/// Plain `read(2)` on a descriptor. Bytes past the first newline are kept
/// for the next call.
pub struct RawStdin<W: Write> {
    fd: RawFd,
    pending: BytesMut,
    // dropping the tail of an over-long line until its newline shows up
    skipping: bool,
    prompt_out: W,
}

impl RawStdin<io::Stdout> {
    pub fn stdin() -> Self {
        Self::new(libc::STDIN_FILENO, io::stdout())
    }
}

impl<W: Write> RawStdin<W> {
    pub fn new(fd: RawFd, prompt_out: W) -> Self {
        Self {
            fd,
            pending: BytesMut::with_capacity(MAX_LINE),
            skipping: false,
            prompt_out,
        }
    }

    fn absorb(&mut self, bytes: &[u8]) {
        let bytes = if self.skipping {
            match bytes.iter().position(|&b| b == b'\n') {
                Some(pos) => {
                    self.skipping = false;
                    &bytes[pos..]
                }
                None => return,
            }
        } else {
            bytes
        };
        self.pending.extend_from_slice(bytes);
        if self.pending.len() > MAX_LINE && !self.pending.contains(&b'\n') {
            self.pending.truncate(MAX_LINE);
            self.skipping = true;
        }
    }

    fn take_line(&mut self) -> Option<Vec<u8>> {
        let pos = self.pending.iter().position(|&b| b == b'\n')?;
        let raw = self.pending.split_to(pos + 1);
        Some(clip(&raw[..pos]))
    }

    fn discard(&mut self) {
        self.pending.clear();
        self.skipping = false;
    }

    fn wait_readable(&self) -> nix::Result<bool> {
        let mut fds = [PollFd::new(self.fd, PollFlags::POLLIN)];
        poll(&mut fds, POLL_INTERVAL_MS).map(|ready| ready > 0)
    }
}

impl<W: Write> LineSource for RawStdin<W> {
    fn fetch(&mut self, prompt: &str) -> io::Result<ReadOutcome> {
        if take_interrupt() {
            self.discard();
            return Ok(ReadOutcome::Interrupted);
        }
        write_ignore_broken_pipe(&mut self.prompt_out, prompt)?;
        let mut chunk = [0u8; MAX_LINE];
        loop {
            if take_interrupt() {
                self.discard();
                return Ok(ReadOutcome::Interrupted);
            }
            if let Some(line) = self.take_line() {
                return Ok(ReadOutcome::Line(line));
            }
            match self.wait_readable() {
                Ok(true) => {}
                Ok(false) | Err(Errno::EINTR) => continue,
                Err(e) => return Err(e.into()),
            }
            match read(self.fd, &mut chunk) {
                Ok(0) if self.pending.is_empty() => return Ok(ReadOutcome::Eof),
                Ok(0) => {
                    let rest = self.pending.split();
                    self.skipping = false;
                    return Ok(ReadOutcome::Line(clip(&rest)));
                }
                Ok(n) => self.absorb(&chunk[..n]),
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Interactive source backed by rustyline.
pub struct EditorSource {
    editor: Editor<CommandCompleter, DefaultHistory>,
}

impl EditorSource {
    pub fn new() -> rustyline::Result<Self> {
        let config = Config::builder().completion_type(CompletionType::List).build();
        let mut editor = Editor::with_config(config)?;
        editor.set_helper(Some(CommandCompleter::new()));
        Ok(Self { editor })
    }
}

impl LineSource for EditorSource {
    fn fetch(&mut self, prompt: &str) -> io::Result<ReadOutcome> {
        if take_interrupt() {
            return Ok(ReadOutcome::Interrupted);
        }
        match self.editor.readline(prompt) {
            Ok(line) => {
                let _ = self.editor.add_history_entry(line.as_str());
                let mut bytes = line.into_bytes();
                bytes.truncate(MAX_LINE);
                Ok(ReadOutcome::Line(bytes))
            }
            Err(ReadlineError::Interrupted) => Ok(ReadOutcome::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadOutcome::Eof),
            Err(ReadlineError::Io(e)) => Err(e),
            Err(e) => Err(io::Error::new(io::ErrorKind::Other, e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::ShellState;
    use crate::signals::raise_interrupt;
    use crate::util::test_locks;
    use nix::unistd::{close, pipe, write};
    use std::collections::VecDeque;

    struct Scripted(VecDeque<io::Result<ReadOutcome>>);

    impl LineSource for Scripted {
        fn fetch(&mut self, _prompt: &str) -> io::Result<ReadOutcome> {
            self.0.pop_front().unwrap_or(Ok(ReadOutcome::Eof))
        }
    }

    fn shell() -> Shell<Vec<u8>, Vec<u8>> {
        Shell::new(ShellState::new(10), Vec::new(), Vec::new())
    }

    fn feed(input: &[u8]) -> RawStdin<Vec<u8>> {
        let (r, w) = pipe().unwrap();
        let mut written = 0;
        while written < input.len() {
            written += write(w, &input[written..]).unwrap();
        }
        close(w).unwrap();
        RawStdin::new(r, Vec::new())
    }

    fn line(source: &mut RawStdin<Vec<u8>>) -> ReadOutcome {
        source.fetch("$ ").unwrap()
    }

    fn text(s: &str) -> ReadOutcome {
        ReadOutcome::Line(s.as_bytes().to_vec())
    }

    #[test]
    fn records_plain_lines_but_not_recalls() {
        let mut source = Scripted(VecDeque::from(vec![
            Ok(ReadOutcome::Line(b"ls".to_vec())),
            Ok(ReadOutcome::Line(b"!!".to_vec())),
            Ok(ReadOutcome::Line(Vec::new())),
        ]));
        let mut sh = shell();
        for _ in 0..3 {
            read_command(&mut source, "$ ", &mut sh);
        }
        let lines: Vec<&[u8]> = sh.state.history.entries().map(|(_, l)| l).collect();
        assert_eq!(lines, vec![&b"ls"[..], &b""[..]]);
    }

    #[test]
    fn read_errors_are_reported() {
        let boom = io::Error::new(io::ErrorKind::Other, "boom");
        let mut source = Scripted(VecDeque::from(vec![Err(boom)]));
        let mut sh = shell();
        assert_eq!(read_command(&mut source, "$ ", &mut sh), ReadOutcome::Failed);
        assert!(sh.state.history.is_empty());
    }

    #[test]
    fn splits_buffered_lines_and_writes_prompt() {
        let _guard = test_locks::interrupt();
        let mut source = feed(b"pwd\nhelp cd\npartial");
        assert_eq!(line(&mut source), text("pwd"));
        assert_eq!(line(&mut source), text("help cd"));
        assert_eq!(line(&mut source), text("partial"));
        assert_eq!(line(&mut source), ReadOutcome::Eof);
        assert_eq!(source.prompt_out, b"$ $ $ $ ");
    }

    #[test]
    fn long_lines_are_truncated() {
        let _guard = test_locks::interrupt();
        let mut input = vec![b'a'; MAX_LINE * 3];
        input.extend_from_slice(b"\nnext\n");
        let mut source = feed(&input);
        assert_eq!(line(&mut source), text(&"a".repeat(MAX_LINE)));
        assert_eq!(line(&mut source), text("next"));
    }

    #[test]
    fn interrupt_discards_pending_input() {
        let _guard = test_locks::interrupt();
        let mut source = feed(b"one\ntwo\n");
        assert_eq!(line(&mut source), text("one"));
        raise_interrupt();
        assert_eq!(line(&mut source), ReadOutcome::Interrupted);
        assert_eq!(line(&mut source), ReadOutcome::Eof);
    }

    #[test]
    fn interrupt_leaves_history_alone() {
        let mut sh = shell();
        sh.state.history.record("ls");
        let mut source = Scripted(VecDeque::from(vec![Ok(ReadOutcome::Interrupted)]));
        assert_eq!(read_command(&mut source, "$ ", &mut sh), ReadOutcome::Interrupted);
        assert_eq!(sh.state.history.total(), 1);
        assert_eq!(sh.state.history.last(), Some(&b"ls"[..]));
    }

    #[test]
    fn non_utf8_input_is_kept_byte_for_byte() {
        let _guard = test_locks::interrupt();
        let mut source = feed(b"printf %s X\xffY\n\xfe\n");
        let mut sh = shell();
        let first = read_command(&mut source, "$ ", &mut sh);
        assert_eq!(first, ReadOutcome::Line(b"printf %s X\xffY".to_vec()));
        assert_eq!(line(&mut source), ReadOutcome::Line(vec![0xfe]));
        assert_eq!(sh.state.history.last(), Some(&b"printf %s X\xffY"[..]));
    }
}
