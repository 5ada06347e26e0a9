// error.rs

use std::io;
use thiserror::Error;

/// Every recoverable failure the shell reports. The `Display` output is the
/// exact line written to stderr.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("{0}: too many arguments")]
    TooManyArguments(&'static str),
    #[error("{0}: unable to get current working directory")]
    CurrentDir(&'static str),
    #[error("cd: unable to change directory")]
    ChangeDir(#[source] io::Error),
    #[error("cd: no previous directory")]
    NoPreviousDir,
    #[error("cd: unable to find home directory")]
    HomeDir,
    #[error("shell: unable to read command")]
    Read(#[source] io::Error),
    #[error("shell: unable to fork")]
    Fork(#[source] nix::Error),
    #[error("shell: unable to execute command")]
    Exec,
    #[error("shell: unable to wait for child")]
    Wait(#[source] nix::Error),
    #[error("history: no commands in history")]
    NoHistory,
    #[error("history: invalid history reference")]
    InvalidReference,
    #[error("history: recursive history reference")]
    RecursiveReference,
}

pub type Result<T> = std::result::Result<T, ShellError>;
