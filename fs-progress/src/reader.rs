use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::ops::Deref;

use indicatif::ProgressBar;

use crate::sink::ProgressSink;

/// Closes the sink exactly once, when dropped.
struct Closing<S: ProgressSink>(S);

impl<S: ProgressSink> Deref for Closing<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.0
    }
}

impl<S: ProgressSink> Drop for Closing<S> {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Buffered reader reporting every byte it hands out to a [`ProgressSink`].
///
/// Reads advance the sink by the number of bytes returned, seeks move it
/// to the new absolute position. Reading semantics and errors are those
/// of the wrapped [`BufReader`].
///
/// Dropping the reader closes the sink first and the source afterwards.
pub struct ProgressReader<R, S: ProgressSink = ProgressBar> {
    // Field order is drop order.
    sink: Closing<S>,
    inner: BufReader<R>,
}

impl<R: Read, S: ProgressSink> ProgressReader<R, S> {
    /// Wrap `inner`, announcing `total` bytes to the sink.
    pub fn new(inner: R, total: u64, sink: S) -> Self {
        Self::with_buffer(BufReader::new(inner), total, sink)
    }

    pub fn with_capacity(
        capacity: usize,
        inner: R,
        total: u64,
        sink: S,
    ) -> Self {
        let inner = BufReader::with_capacity(capacity, inner);
        Self::with_buffer(inner, total, sink)
    }

    fn with_buffer(inner: BufReader<R>, total: u64, sink: S) -> Self {
        sink.set_length(total);
        Self {
            sink: Closing(sink),
            inner,
        }
    }

    /// Return the next buffered chunk, filling the buffer if it is empty.
    /// An empty chunk means end of file.
    pub fn read_chunk(&mut self) -> io::Result<Vec<u8>> {
        let chunk = self.fill_buf()?.to_vec();
        self.consume(chunk.len());
        Ok(chunk)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn get_ref(&self) -> &R {
        self.inner.get_ref()
    }

    /// Close the sink, then hand back the source.
    /// Buffered data is discarded.
    pub fn finish(self) -> R {
        let Self { sink, inner } = self;
        drop(sink);
        inner.into_inner()
    }
}

impl<S: ProgressSink> ProgressReader<File, S> {
    /// Wrap a file, taking the total from its metadata.
    pub fn from_file(capacity: usize, file: File, sink: S) -> io::Result<Self> {
        let total = file.metadata()?.len();
        Ok(Self::with_capacity(capacity, file, total, sink))
    }
}

impl<R: Read, S: ProgressSink> Read for ProgressReader<R, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        self.sink.inc(read as u64);
        Ok(read)
    }
}

impl<R: Read, S: ProgressSink> BufRead for ProgressReader<R, S> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt);
        self.sink.inc(amt as u64);
    }
}

impl<R: Read + Seek, S: ProgressSink> Seek for ProgressReader<R, S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let position = self.inner.seek(pos)?;
        self.sink.set_position(position);
        self.sink.tick();
        Ok(position)
    }
}
