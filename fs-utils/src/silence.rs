use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};

const NULL_DEVICE: &str = "/dev/null";

/// Redirects stdout and/or stderr to the null device until dropped.
///
/// The original descriptors are restored on drop, panics included.
/// Redirection is process-wide: every thread loses its output meanwhile.
pub struct Silence {
    // (redirected descriptor, duplicate of what it pointed to before)
    saved: Vec<(RawFd, OwnedFd)>,
    null: File,
}

impl Silence {
    pub fn new(stderr: bool, stdout: bool) -> io::Result<Silence> {
        let null = OpenOptions::new().write(true).open(NULL_DEVICE)?;
        let mut silence = Silence {
            saved: Vec::with_capacity(2),
            null,
        };

        flush_std();
        let targets = [
            (stderr, libc::STDERR_FILENO),
            (stdout, libc::STDOUT_FILENO),
        ];
        for (_, fd) in targets.into_iter().filter(|(selected, _)| *selected) {
            // Already redirected descriptors come back when `silence` drops.
            silence.redirect(fd)?;
        }
        log::debug!("silence: {} descriptor(s) muted", silence.saved.len());
        Ok(silence)
    }

    fn redirect(&mut self, fd: RawFd) -> io::Result<()> {
        let copy = unsafe { libc::dup(fd) };
        if copy < 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: `copy` is a fresh descriptor nobody else owns.
        let copy = unsafe { OwnedFd::from_raw_fd(copy) };

        if unsafe { libc::dup2(self.null.as_raw_fd(), fd) } < 0 {
            return Err(io::Error::last_os_error());
        }
        self.saved.push((fd, copy));
        Ok(())
    }
}

impl Drop for Silence {
    fn drop(&mut self) {
        flush_std();
        for (fd, copy) in self.saved.drain(..).rev() {
            if unsafe { libc::dup2(copy.as_raw_fd(), fd) } < 0 {
                log::warn!(
                    "silence: failed to restore descriptor {fd}: {}",
                    io::Error::last_os_error()
                );
            }
        }
    }
}

fn flush_std() {
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();
}

/// Run `f` with the selected streams muted.
pub fn shut_up<T, F: FnOnce() -> T>(
    stderr: bool,
    stdout: bool,
    f: F,
) -> io::Result<T> {
    let _silence = Silence::new(stderr, stdout)?;
    Ok(f())
}
