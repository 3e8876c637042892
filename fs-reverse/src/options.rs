use data_error::{ArkIoError, Result};
use encoding_rs::{Encoding, UTF_8};

use crate::decode::BackwardDecoder;

/// Chunk size used when none is configured.
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// Options of a [`ReverseLines`](crate::ReverseLines) reader.
///
/// The defaults read UTF-8 in 8 KiB chunks and skip empty lines.
#[derive(Debug, Clone)]
pub struct ReverseOptions<D = &'static Encoding> {
    pub(crate) decoder: D,
    pub(crate) allow_empty_lines: bool,
    pub(crate) buffer_size: usize,
}

impl Default for ReverseOptions {
    fn default() -> Self {
        Self {
            decoder: UTF_8,
            allow_empty_lines: false,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl ReverseOptions {
    /// Select the encoding by its WHATWG label, e.g. `"utf-8"` or `"latin1"`.
    pub fn encoding_label(self, label: &str) -> Result<Self> {
        let encoding = Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| {
                ArkIoError::config(format!("Unknown encoding label `{label}`"))
            })?;
        Ok(self.encoding(encoding))
    }

    pub fn encoding(mut self, encoding: &'static Encoding) -> Self {
        self.decoder = encoding;
        self
    }
}

impl<D: BackwardDecoder> ReverseOptions<D> {
    /// Replace the decoder with a custom one.
    pub fn decoder<E: BackwardDecoder>(self, decoder: E) -> ReverseOptions<E> {
        ReverseOptions {
            decoder,
            allow_empty_lines: self.allow_empty_lines,
            buffer_size: self.buffer_size,
        }
    }

    pub fn allow_empty_lines(mut self, allow: bool) -> Self {
        self.allow_empty_lines = allow;
        self
    }

    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    pub fn get_decoder(&self) -> &D {
        &self.decoder
    }

    pub fn get_buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn get_allow_empty_lines(&self) -> bool {
        self.allow_empty_lines
    }

    /// Check the options without touching any file.
    ///
    /// A chunk must be able to hold at least one whole character,
    /// otherwise the backward decoding could never make progress.
    pub fn validate(&self) -> Result<()> {
        let name = self.decoder.name();
        if !self.decoder.supports_backward() {
            return Err(ArkIoError::config(format!(
                "{name} cannot be decoded backward"
            )));
        }
        let min = self.decoder.max_char_bytes();
        if self.buffer_size < min {
            return Err(ArkIoError::config(format!(
                "`buffer_size` must be at least {min} for {name}, got {}",
                self.buffer_size
            )));
        }
        Ok(())
    }
}
