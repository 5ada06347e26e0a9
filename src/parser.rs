// parser.rs

use std::ffi::{CString, OsStr, OsString};
use std::os::unix::ffi::{OsStrExt, OsStringExt};

/// One tokenized command line. Arguments keep the exact bytes that were
/// typed, so non-UTF-8 input reaches the program unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Invocation {
    pub args: Vec<OsString>,
    pub background: bool,
}

impl Invocation {
    pub fn program(&self) -> Option<&OsStr> {
        self.args.first().map(OsString::as_os_str)
    }

    /// Argument vector for `execvp`. nix appends the terminating null
    /// pointer; `None` if an argument holds an interior NUL.
    pub fn exec_argv(&self) -> Option<Vec<CString>> {
        self.args
            .iter()
            .map(|a| CString::new(a.as_bytes()).ok())
            .collect()
    }
}

fn is_separator(b: &u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n')
}

/// Splits on space, tab and newline. A token ending in `&` marks the
/// command as background: a bare `&` is dropped, otherwise only the trailing
/// `&` is stripped. The flag never resets once set.
pub fn tokenize<L: AsRef<[u8]>>(line: L) -> Invocation {
    let mut invocation = Invocation::default();
    for token in line.as_ref().split(is_separator).filter(|t| !t.is_empty()) {
        match token.strip_suffix(b"&") {
            Some([]) => invocation.background = true,
            Some(stripped) => {
                invocation.background = true;
                invocation.args.push(OsString::from_vec(stripped.to_vec()));
            }
            None => invocation.args.push(OsString::from_vec(token.to_vec())),
        }
    }
    invocation
}
