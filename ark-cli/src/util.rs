use std::io::{self, BufWriter, StdoutLock, Write};
use std::path::Path;

use crate::AppError;

pub fn check_file(path: &Path) -> Result<(), AppError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(AppError::NotAFile(path.to_path_buf()))
    }
}

pub fn stdout() -> BufWriter<StdoutLock<'static>> {
    BufWriter::new(io::stdout().lock())
}

/// A closed pipe on our stdout (`ark-cli reverse big.log | head`) is a
/// normal way for the output to end.
pub fn finish_output<W: Write>(
    mut out: W,
    result: io::Result<()>,
) -> Result<(), AppError> {
    match result.and_then(|_| out.flush()) {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => Ok(other?),
    }
}

/// Run `f` with stderr pointed at the null device.
#[cfg(unix)]
pub fn quietly<T>(f: impl FnOnce() -> T) -> Result<T, AppError> {
    fs_utils::shut_up(true, false, f).map_err(AppError::SilenceError)
}

#[cfg(not(unix))]
pub fn quietly<T>(f: impl FnOnce() -> T) -> Result<T, AppError> {
    Ok(f())
}
