use std::io::Write;
use std::path::PathBuf;

use fs_reverse::{reverse_open, ReverseOptions, DEFAULT_BUFFER_SIZE};

use crate::util::{check_file, finish_output, stdout};
use crate::AppError;

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "reverse", about = "Print the lines of a file, last line first")]
pub struct Reverse {
    #[clap(value_parser, help = "The file to read")]
    path: PathBuf,
    #[clap(long, short = 'n', help = "Stop after this many lines")]
    lines: Option<usize>,
    #[clap(long, default_value = "utf-8", help = "Encoding label of the file")]
    encoding: String,
    #[clap(
        long,
        default_value_t = DEFAULT_BUFFER_SIZE,
        help = "Size in bytes of the chunks read from the end"
    )]
    buffer_size: usize,
    #[clap(long, short = 'e', action, help = "Print empty lines too")]
    allow_empty_lines: bool,
}

impl Reverse {
    pub fn options(&self) -> Result<ReverseOptions, AppError> {
        Ok(ReverseOptions::default()
            .encoding_label(&self.encoding)?
            .allow_empty_lines(self.allow_empty_lines)
            .buffer_size(self.buffer_size))
    }

    pub fn run(&self) -> Result<(), AppError> {
        let options = self.options()?;
        check_file(&self.path)?;

        let lines = reverse_open(&self.path, options)?;
        let limit = self.lines.unwrap_or(usize::MAX);
        log::debug!(
            "reverse/{}: {} with buffer of {} bytes",
            self.path.display(),
            self.encoding,
            self.buffer_size
        );

        let mut out = stdout();
        let mut written = Ok(());
        for line in lines.take(limit) {
            let line = line?;
            if let Err(e) = writeln!(out, "{line}") {
                written = Err(e);
                break;
            }
        }
        finish_output(out, written)
    }
}
