use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::str::FromStr;

use data_error::{ArkIoError, Result};
use encoding_rs::{Encoding, UTF_8};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::reader::ProgressReader;
use crate::text::TextReader;

pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

pub const DEFAULT_TEMPLATE: &str = "{msg} [{bar:40.cyan/blue}] \
    {bytes}/{total_bytes} [{elapsed_precise}<{eta_precise}]";

/// How the bytes of an opened file are handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Decoded text, mode `"r"`.
    #[default]
    Text,
    /// Raw bytes, mode `"rb"`.
    Binary,
}

impl FromStr for OpenMode {
    type Err = ArkIoError;

    fn from_str(mode: &str) -> Result<Self> {
        match mode {
            "r" => Ok(OpenMode::Text),
            "rb" => Ok(OpenMode::Binary),
            other => Err(ArkIoError::config(format!(
                "Unsupported mode '{other}'. \
                 Only read modes ('r', 'rb') are supported"
            ))),
        }
    }
}

/// Look of the progress bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayOptions {
    pub template: String,
    pub progress_chars: String,
    pub message: Option<String>,
    /// Draw nothing, still track positions.
    pub hidden: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            progress_chars: "#>-".to_string(),
            message: None,
            hidden: false,
        }
    }
}

impl DisplayOptions {
    fn style(&self) -> ProgressStyle {
        ProgressStyle::with_template(&self.template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars(&self.progress_chars)
    }

    /// Bar of `total` bytes drawn to stderr, unless hidden.
    pub fn bar(&self, total: u64) -> ProgressBar {
        let bar = ProgressBar::with_draw_target(
            Some(total),
            if self.hidden {
                ProgressDrawTarget::hidden()
            } else {
                ProgressDrawTarget::stderr()
            },
        );
        bar.set_style(self.style());
        if let Some(message) = &self.message {
            bar.set_message(message.clone());
        }
        bar
    }
}

/// Options of [`progress_open`].
#[derive(Debug, Clone)]
pub struct OpenOptions {
    mode: OpenMode,
    encoding: &'static Encoding,
    verbose: bool,
    buffer_size: usize,
    display: DisplayOptions,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            mode: OpenMode::Text,
            encoding: UTF_8,
            verbose: true,
            buffer_size: DEFAULT_BUFFER_SIZE,
            display: DisplayOptions::default(),
        }
    }
}

impl OpenOptions {
    /// Options for the given mode string, `"r"` or `"rb"`.
    pub fn new(mode: &str) -> Result<Self> {
        Ok(Self::default().mode(mode.parse()?))
    }

    pub fn mode(mut self, mode: OpenMode) -> Self {
        self.mode = mode;
        self
    }

    /// Encoding of text mode, ignored in binary mode.
    pub fn encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn encoding_label(self, label: &str) -> Result<Self> {
        let encoding = Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| {
                ArkIoError::config(format!("Unknown encoding label `{label}`"))
            })?;
        Ok(self.encoding(encoding))
    }

    /// Without verbosity no progress bar is created at all.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    pub fn display(mut self, display: DisplayOptions) -> Self {
        self.display = display;
        self
    }

    pub fn get_mode(&self) -> OpenMode {
        self.mode
    }

    pub fn get_encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(ArkIoError::config("`buffer_size` must be positive"));
        }
        Ok(())
    }
}

/// File opened by [`progress_open`].
///
/// Text variants yield UTF-8 regardless of the source encoding. Seeks on
/// text variants take source byte offsets and only accept absolute
/// positions.
pub enum ReadHandle {
    Binary(BufReader<File>),
    BinaryProgress(ProgressReader<File>),
    Text(TextReader<BufReader<File>>),
    TextProgress(TextReader<ProgressReader<File>>),
}

macro_rules! dispatch {
    ($handle:expr, $reader:ident => $body:expr) => {
        match $handle {
            ReadHandle::Binary($reader) => $body,
            ReadHandle::BinaryProgress($reader) => $body,
            ReadHandle::Text($reader) => $body,
            ReadHandle::TextProgress($reader) => $body,
        }
    };
}

impl ReadHandle {
    pub fn mode(&self) -> OpenMode {
        match self {
            ReadHandle::Binary(_) | ReadHandle::BinaryProgress(_) => {
                OpenMode::Binary
            }
            ReadHandle::Text(_) | ReadHandle::TextProgress(_) => {
                OpenMode::Text
            }
        }
    }

    /// The bar tracking this handle, if it has one.
    pub fn progress_bar(&self) -> Option<&ProgressBar> {
        match self {
            ReadHandle::BinaryProgress(reader) => Some(reader.sink()),
            ReadHandle::TextProgress(reader) => Some(reader.get_ref().sink()),
            _ => None,
        }
    }
}

impl Read for ReadHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        dispatch!(self, reader => reader.read(buf))
    }
}

impl BufRead for ReadHandle {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        dispatch!(self, reader => reader.fill_buf())
    }

    fn consume(&mut self, amt: usize) {
        dispatch!(self, reader => reader.consume(amt))
    }
}

impl Seek for ReadHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        dispatch!(self, reader => reader.seek(pos))
    }
}

/// Open `path` for reading, tracking consumption with a progress bar
/// when the options are verbose.
///
/// Options are validated before the file is opened.
pub fn progress_open<P: AsRef<Path>>(
    path: P,
    options: &OpenOptions,
) -> Result<ReadHandle> {
    options.validate()?;
    let path = path.as_ref();
    let file = File::open(path)?;
    let capacity = options.buffer_size;

    let handle = if options.verbose {
        let total = file.metadata()?.len();
        log::debug!("progress/{}: tracking {total} bytes", path.display());
        let bar = options.display.bar(total);
        let reader = ProgressReader::from_file(capacity, file, bar)?;
        match options.mode {
            OpenMode::Binary => ReadHandle::BinaryProgress(reader),
            OpenMode::Text => ReadHandle::TextProgress(TextReader::new(
                reader,
                options.encoding,
            )),
        }
    } else {
        let reader = BufReader::with_capacity(capacity, file);
        match options.mode {
            OpenMode::Binary => ReadHandle::Binary(reader),
            OpenMode::Text => {
                ReadHandle::Text(TextReader::new(reader, options.encoding))
            }
        }
    };
    Ok(handle)
}
