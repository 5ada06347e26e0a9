// process.rs

use crate::error::{Result, ShellError};
use crate::parser::Invocation;
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{execvp, fork, write, ForkResult, Pid};
use tracing::{debug, trace};

#[derive(Debug, PartialEq, Eq)]
pub enum Spawned {
    /// The child ran to completion.
    Foreground(WaitStatus),
    /// The child was left running; `reap_finished` collects it later.
    Background(Pid),
}

/// Forks and execs `invocation` through `PATH`. Foreground children are
/// waited for; background ones are not.
pub fn run(invocation: &Invocation) -> Result<Spawned> {
    let argv = invocation.exec_argv().ok_or(ShellError::Exec)?;
    let Some(program) = argv.first() else {
        return Err(ShellError::Exec);
    };
    let exec_failed = format!("{}\n", ShellError::Exec);

    match unsafe { fork() } {
        Ok(ForkResult::Child) => {
            let _ = execvp(program, &argv);
            let _ = write(libc::STDERR_FILENO, exec_failed.as_bytes());
            unsafe { libc::_exit(127) };
        }
        Ok(ForkResult::Parent { child }) => {
            debug!(
                pid = child.as_raw(),
                background = invocation.background,
                args = ?invocation.args,
                "spawned"
            );
            if invocation.background {
                return Ok(Spawned::Background(child));
            }
            wait_for(child).map(Spawned::Foreground)
        }
        Err(e) => Err(ShellError::Fork(e)),
    }
}

fn wait_for(child: Pid) -> Result<WaitStatus> {
    loop {
        match waitpid(child, None) {
            Ok(status) => {
                debug!(?status, "foreground child finished");
                return Ok(status);
            }
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(ShellError::Wait(e)),
        }
    }
}

/// Collects every child that has already terminated without blocking.
/// Returns how many were reclaimed.
pub fn reap_finished() -> usize {
    let mut reaped = 0;
    loop {
        match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => break,
            Ok(status) => {
                trace!(?status, "reaped background child");
                reaped += 1;
            }
            Err(Errno::EINTR) => continue,
            Err(_) => break,
        }
    }
    reaped
}
