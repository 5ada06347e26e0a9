// recall.rs

use crate::error::{Result, ShellError};
use crate::history::HistoryStore;
use tracing::debug;

/// True for any token the dispatcher should hand to `resolve`.
pub fn is_recall(token: &[u8]) -> bool {
    token.first() == Some(&b'!')
}

/// Turns `!!` or `!<digits>` into the history line it names.
pub fn resolve(expr: &[u8], store: &HistoryStore) -> Result<Vec<u8>> {
    let resolved = if expr == b"!!" {
        store.last().ok_or(ShellError::NoHistory)?
    } else {
        let digits = expr.strip_prefix(b"!").ok_or(ShellError::InvalidReference)?;
        if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
            return Err(ShellError::InvalidReference);
        }
        let index: usize = std::str::from_utf8(digits)
            .ok()
            .and_then(|d| d.parse().ok())
            .ok_or(ShellError::InvalidReference)?;
        store.lookup(index).ok_or(ShellError::InvalidReference)?
    };
    debug!(
        expr = %String::from_utf8_lossy(expr),
        resolved = %String::from_utf8_lossy(resolved),
        "history recall"
    );
    Ok(resolved.to_vec())
}
