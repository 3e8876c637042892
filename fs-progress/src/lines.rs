use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use data_error::Result;

/// Number of lines forward iteration over `reader` would produce.
///
/// A final line without a terminating `'\n'` still counts.
pub fn count_lines<R: Read>(reader: R) -> Result<usize> {
    let mut reader = BufReader::new(reader);
    let mut lines = 0;
    let mut unterminated = false;
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            break;
        }
        lines += buf.iter().filter(|&&b| b == b'\n').count();
        unterminated = buf.last() != Some(&b'\n');
        let len = buf.len();
        reader.consume(len);
    }
    Ok(lines + usize::from(unterminated))
}

pub fn count_file_lines<P: AsRef<Path>>(path: P) -> Result<usize> {
    count_lines(File::open(path)?)
}
