//! # fs-progress
//!
//! Forward reading with a progress bar attached.
//!
//! [`ProgressReader`] reports every byte it hands out to a
//! [`ProgressSink`], normally an [`indicatif::ProgressBar`].
//! [`progress_open`] opens a file in text or binary mode and wires the
//! bar up when asked to be verbose.
//!
//! ```no_run
//! use std::io::BufRead;
//! use fs_progress::{progress_open, OpenOptions};
//!
//! let handle = progress_open("dump.sql", &OpenOptions::new("r")?)?;
//! for line in handle.lines() {
//!     let _ = line?;
//! }
//! # Ok::<(), data_error::ArkIoError>(())
//! ```
mod lines;
mod open;
mod reader;
mod sink;
mod text;

pub use indicatif::ProgressBar;
pub use lines::{count_file_lines, count_lines};
pub use open::{
    progress_open, DisplayOptions, OpenMode, OpenOptions, ReadHandle,
    DEFAULT_BUFFER_SIZE, DEFAULT_TEMPLATE,
};
pub use reader::ProgressReader;
pub use sink::{Counter, CounterState, ProgressSink};
pub use text::TextReader;
