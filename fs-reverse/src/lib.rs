//! # fs-reverse
//!
//! Reading text files from the end: [`ReverseLines`] yields lines last
//! to first while keeping only one chunk of the file in memory.
//!
//! Chunks are decoded with a [`BackwardDecoder`]; any `encoding_rs`
//! encoding without shift states works out of the box.
//!
//! ```no_run
//! use fs_reverse::{reverse_open, ReverseOptions};
//!
//! let options = ReverseOptions::default().buffer_size(4096);
//! for line in reverse_open("server.log", options)?.take(10) {
//!     println!("{}", line?);
//! }
//! # Ok::<(), data_error::ArkIoError>(())
//! ```
use std::fs::File;
use std::path::Path;

use data_error::Result;

mod decode;
mod options;
mod reader;

pub use decode::{
    max_char_bytes, BackwardDecoder, DOUBLE_BYTE_MAX_CHAR_BYTES,
    EUC_JP_MAX_CHAR_BYTES, GB18030_MAX_CHAR_BYTES,
    SINGLE_BYTE_MAX_CHAR_BYTES, UTF16_MAX_CHAR_BYTES, UTF8_MAX_CHAR_BYTES,
};
pub use encoding_rs::Encoding;
pub use options::{ReverseOptions, DEFAULT_BUFFER_SIZE};
pub use reader::ReverseLines;

/// Open `path` for reading its lines in reverse order.
///
/// Fails with [`ArkIoError::Config`](data_error::ArkIoError::Config)
/// before opening the file if the options are invalid.
pub fn reverse_open<P: AsRef<Path>, D: BackwardDecoder>(
    path: P,
    options: ReverseOptions<D>,
) -> Result<ReverseLines<File, D>> {
    options.validate()?;
    let file = File::open(path.as_ref())?;
    log::debug!("reverse: opened {}", path.as_ref().display());
    ReverseLines::new(file, options)
}
