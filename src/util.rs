// util.rs

pub fn writeln_ignore_broken_pipe<W: std::io::Write, S: AsRef<str>>(
    mut w: W,
    s: S,
) -> std::io::Result<()> {
    match writeln!(w, "{}", s.as_ref()) {
        Err(ref e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

/// Writes raw bytes and flushes, so prompts show up before a blocking read.
pub fn write_ignore_broken_pipe<W: std::io::Write, B: AsRef<[u8]>>(
    mut w: W,
    bytes: B,
) -> std::io::Result<()> {
    let res = w.write_all(bytes.as_ref()).and_then(|_| w.flush());
    match res {
        Err(ref e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

#[cfg(test)]
pub(crate) mod test_locks {
    use std::sync::{Mutex, MutexGuard};

    // The working directory, the set of child processes and the interrupt
    // flag are process-wide, so tests touching one of them run one at a time.
    static CWD: Mutex<()> = Mutex::new(());
    static CHILDREN: Mutex<()> = Mutex::new(());
    static INTERRUPT: Mutex<()> = Mutex::new(());

    pub fn cwd() -> MutexGuard<'static, ()> {
        CWD.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn children() -> MutexGuard<'static, ()> {
        CHILDREN.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn interrupt() -> MutexGuard<'static, ()> {
        INTERRUPT.lock().unwrap_or_else(|e| e.into_inner())
    }
}
