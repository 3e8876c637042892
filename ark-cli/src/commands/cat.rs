use std::io;
use std::path::PathBuf;

use fs_progress::{progress_open, DisplayOptions, OpenOptions};

use crate::util::{check_file, finish_output, quietly, stdout};
use crate::AppError;

#[derive(Clone, Debug, clap::Args)]
#[clap(
    name = "cat",
    about = "Copy a file to stdout, drawing a progress bar on stderr"
)]
pub struct Cat {
    #[clap(value_parser, help = "The file to read")]
    path: PathBuf,
    #[clap(long, short, action, help = "No progress bar, nothing on stderr")]
    quiet: bool,
    #[clap(long, short, action, help = "Copy raw bytes instead of text")]
    binary: bool,
    #[clap(long, default_value = "utf-8", help = "Encoding label of the file")]
    encoding: String,
}

impl Cat {
    fn options(&self) -> Result<OpenOptions, AppError> {
        let mode = if self.binary { "rb" } else { "r" };
        let display = DisplayOptions {
            message: self
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            ..Default::default()
        };
        Ok(OpenOptions::new(mode)?
            .encoding_label(&self.encoding)?
            .verbose(!self.quiet)
            .display(display))
    }

    fn copy(&self, options: &OpenOptions) -> Result<(), AppError> {
        let mut handle = progress_open(&self.path, options)?;
        let mut out = stdout();
        let copied = io::copy(&mut handle, &mut out).map(|_| ());
        finish_output(out, copied)
    }

    pub fn run(&self) -> Result<(), AppError> {
        let options = self.options()?;
        check_file(&self.path)?;
        log::debug!(
            "cat/{}: {:?} mode, {}",
            self.path.display(),
            options.get_mode(),
            options.get_encoding().name()
        );

        if self.quiet {
            quietly(|| self.copy(&options))?
        } else {
            self.copy(&options)
        }
    }
}
