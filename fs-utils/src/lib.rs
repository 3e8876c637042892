//! # fs-utils
//!
//! Process-level helpers shared by the command line tools.
//!
//! [`Silence`] points the standard output and error descriptors at the
//! null device for as long as it lives, which also mutes output written
//! by child processes and foreign code bypassing `std::io`.
#[cfg(unix)]
mod silence;

#[cfg(unix)]
pub use silence::{shut_up, Silence};
