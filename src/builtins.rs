// builtins.rs

use crate::error::{Result, ShellError};
use crate::history::HistoryStore;
use itertools::Itertools;
use nix::unistd::{getuid, User};
use std::env;
use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::PathBuf;
use tracing::debug;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Builtin {
    Exit,
    Pwd,
    Cd,
    Help,
    History,
}

impl Builtin {
    /// In the order `help` lists them.
    pub const ALL: [Builtin; 5] = [
        Builtin::Exit,
        Builtin::Pwd,
        Builtin::Cd,
        Builtin::Help,
        Builtin::History,
    ];

    pub fn from_name<N: AsRef<OsStr>>(name: N) -> Option<Self> {
        let name = name.as_ref();
        Self::ALL.into_iter().find(|b| OsStr::new(b.name()) == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Exit => "exit",
            Builtin::Pwd => "pwd",
            Builtin::Cd => "cd",
            Builtin::Help => "help",
            Builtin::History => "history",
        }
    }

    pub fn summary(self) -> &'static str {
        match self {
            Builtin::Exit => "exit the shell",
            Builtin::Pwd => "print the current working directory",
            Builtin::Cd => "change the working directory (cd [dir|~|~/path|-])",
            Builtin::Help => "show help for built-in commands (help [name])",
            Builtin::History => {
                "list recent commands; !! reruns the last one, !n reruns number n"
            }
        }
    }

    fn help_line(self) -> String {
        format!("{}: {}", self.name(), self.summary())
    }
}

/// One summary line per built-in, newline terminated.
pub fn help_block() -> String {
    let mut block = Builtin::ALL.iter().map(|b| b.help_line()).join("\n");
    block.push('\n');
    block
}

fn check_arity(args: &[OsString], builtin: Builtin, max_extra: usize) -> Result<()> {
    if args.len() > max_extra + 1 {
        return Err(ShellError::TooManyArguments(builtin.name()));
    }
    Ok(())
}

pub fn exit(args: &[OsString]) -> Result<()> {
    check_arity(args, Builtin::Exit, 0)
}

pub fn pwd(args: &[OsString]) -> Result<Vec<u8>> {
    check_arity(args, Builtin::Pwd, 0)?;
    let current = env::current_dir().map_err(|_| ShellError::CurrentDir("pwd"))?;
    let mut out = current.into_os_string().into_vec();
    out.push(b'\n');
    Ok(out)
}

pub fn help(args: &[OsString]) -> Result<Vec<u8>> {
    check_arity(args, Builtin::Help, 1)?;
    Ok(match args.get(1) {
        None => help_block().into_bytes(),
        Some(name) => match Builtin::from_name(name) {
            Some(builtin) => format!("{}\n", builtin.help_line()).into_bytes(),
            None => {
                let mut out = name.as_bytes().to_vec();
                out.extend_from_slice(b": external command, no built-in help available\n");
                out
            }
        },
    })
}

pub fn history(args: &[OsString], store: &HistoryStore) -> Result<Vec<u8>> {
    check_arity(args, Builtin::History, 0)?;
    let mut out = Vec::new();
    for (index, line) in store.entries().rev() {
        out.extend_from_slice(format!("{}\t", index).as_bytes());
        out.extend_from_slice(line);
        out.push(b'\n');
    }
    Ok(out)
}

pub fn home_dir() -> Result<PathBuf> {
    match User::from_uid(getuid()) {
        Ok(Some(user)) => Ok(user.dir),
        _ => Err(ShellError::HomeDir),
    }
}

/// Works out where `cd` should go. `home` is only consulted for `~` forms.
pub fn cd_target<H>(arg: Option<&OsStr>, last_dir: Option<&PathBuf>, home: H) -> Result<PathBuf>
where
    H: FnOnce() -> Result<PathBuf>,
{
    match arg.map(OsStr::as_bytes) {
        None | Some(b"~") => home(),
        Some(b"-") => last_dir.cloned().ok_or(ShellError::NoPreviousDir),
        Some(arg) => match arg.strip_prefix(b"~") {
            Some(rest) => {
                let mut joined = home()?.into_os_string();
                joined.push(OsStr::from_bytes(rest));
                Ok(PathBuf::from(joined))
            }
            None => Ok(PathBuf::from(OsStr::from_bytes(arg))),
        },
    }
}

/// Changes directory; on success `last_dir` becomes the directory we left.
pub fn cd(args: &[OsString], last_dir: &mut Option<PathBuf>) -> Result<()> {
    check_arity(args, Builtin::Cd, 1)?;
    let arg = args.get(1).map(OsString::as_os_str);
    let target = cd_target(arg, last_dir.as_ref(), home_dir)?;
    let previous = env::current_dir().ok();
    env::set_current_dir(&target).map_err(ShellError::ChangeDir)?;
    debug!(from = ?previous, to = %target.display(), "changed directory");
    if previous.is_some() {
        *last_dir = previous;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_locks;

    fn argv(line: &str) -> Vec<OsString> {
        line.split_whitespace().map(OsString::from).collect()
    }

    fn fake_home() -> Result<PathBuf> {
        Ok(PathBuf::from("/home/user"))
    }

    fn target(arg: &str) -> PathBuf {
        cd_target(Some(OsStr::new(arg)), None, fake_home).unwrap()
    }

    #[test]
    fn lookup_by_name_is_exact() {
        assert_eq!(Builtin::from_name("cd"), Some(Builtin::Cd));
        assert_eq!(Builtin::from_name("CD"), None);
        assert_eq!(Builtin::from_name("ls"), None);
        assert_eq!(Builtin::from_name(OsStr::from_bytes(b"c\xffd")), None);
    }

    #[test]
    fn help_block_order() {
        let block = help_block();
        let names: Vec<&str> = block.lines().map(|l| l.split(':').next().unwrap()).collect();
        assert_eq!(names, vec!["exit", "pwd", "cd", "help", "history"]);
        assert!(block.ends_with('\n'));
    }

    #[test]
    fn help_for_one_name() {
        let cd_help = format!("cd: {}\n", Builtin::Cd.summary());
        assert_eq!(help(&argv("help cd")).unwrap(), cd_help.into_bytes());
        assert_eq!(help(&argv("help")).unwrap(), help_block().into_bytes());
        assert!(help(&argv("help ls")).unwrap().starts_with(b"ls: external command"));
    }

    #[test]
    fn help_echoes_unknown_name_bytes() {
        let args = vec![OsString::from("help"), OsString::from_vec(b"x\xff".to_vec())];
        assert!(help(&args).unwrap().starts_with(b"x\xff: external command"));
    }

    #[test]
    fn arity_limits() {
        assert!(matches!(
            exit(&argv("exit 1")),
            Err(ShellError::TooManyArguments("exit"))
        ));
        assert!(exit(&argv("exit")).is_ok());
        assert!(matches!(
            pwd(&argv("pwd -L")),
            Err(ShellError::TooManyArguments("pwd"))
        ));
        assert!(matches!(
            help(&argv("help cd pwd")),
            Err(ShellError::TooManyArguments("help"))
        ));
        let store = HistoryStore::new(10);
        assert!(matches!(
            history(&argv("history 5"), &store),
            Err(ShellError::TooManyArguments("history"))
        ));
    }

    #[test]
    fn history_listing_is_newest_first() {
        let mut store = HistoryStore::new(2);
        for line in ["ls", "pwd", "cd /"] {
            store.record(line);
        }
        assert_eq!(history(&argv("history"), &store).unwrap(), b"2\tcd /\n1\tpwd\n");
    }

    #[test]
    fn target_resolution() {
        let last = PathBuf::from("/var");
        assert_eq!(cd_target(None, None, fake_home).unwrap(), PathBuf::from("/home/user"));
        assert_eq!(target("~"), PathBuf::from("/home/user"));
        assert_eq!(target("~/src"), PathBuf::from("/home/user/src"));
        assert_eq!(target("~x"), PathBuf::from("/home/userx"));
        let dash = cd_target(Some(OsStr::new("-")), Some(&last), fake_home);
        assert_eq!(dash.unwrap(), last);
        let no_home = cd_target(Some(OsStr::new("/tmp")), None, || Err(ShellError::HomeDir));
        assert_eq!(no_home.unwrap(), PathBuf::from("/tmp"));
        assert!(matches!(
            cd_target(Some(OsStr::new("-")), None, fake_home),
            Err(ShellError::NoPreviousDir)
        ));
    }

    #[test]
    fn cd_tracks_previous_directory() {
        let _guard = test_locks::cwd();
        let original = env::current_dir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        let target = scratch.path().canonicalize().unwrap();
        let mut last_dir = None;

        cd(&argv(&format!("cd {}", target.display())), &mut last_dir).unwrap();
        assert_eq!(env::current_dir().unwrap(), target);
        assert_eq!(last_dir.as_ref(), Some(&original));

        cd(&argv("cd -"), &mut last_dir).unwrap();
        assert_eq!(env::current_dir().unwrap(), original);
        assert_eq!(last_dir.as_ref(), Some(&target));
    }

    #[test]
    fn failed_cd_changes_nothing() {
        let _guard = test_locks::cwd();
        let original = env::current_dir().unwrap();
        let mut last_dir = Some(PathBuf::from("/previous"));

        let err = cd(&argv("cd a b"), &mut last_dir).unwrap_err();
        assert!(matches!(err, ShellError::TooManyArguments("cd")));
        let err = cd(&argv("cd /tinysh/does/not/exist"), &mut last_dir).unwrap_err();
        assert!(matches!(err, ShellError::ChangeDir(_)));

        assert_eq!(env::current_dir().unwrap(), original);
        assert_eq!(last_dir, Some(PathBuf::from("/previous")));
    }

    #[test]
    fn cd_dash_without_history_errors() {
        let _guard = test_locks::cwd();
        let mut last_dir = None;
        assert!(matches!(cd(&argv("cd -"), &mut last_dir), Err(ShellError::NoPreviousDir)));
        assert_eq!(last_dir, None);
    }
}
