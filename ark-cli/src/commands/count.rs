use std::path::PathBuf;

use fs_progress::{
    count_file_lines, count_lines, progress_open, DisplayOptions, OpenOptions,
};

use crate::util::{check_file, quietly};
use crate::AppError;

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "count", about = "Count the lines of a file")]
pub struct Count {
    #[clap(value_parser, help = "The file to count")]
    path: PathBuf,
    #[clap(long, short, action, help = "No progress bar, nothing on stderr")]
    quiet: bool,
}

impl Count {
    pub fn run(&self) -> Result<(), AppError> {
        check_file(&self.path)?;

        let count = if self.quiet {
            quietly(|| count_file_lines(&self.path))??
        } else {
            let options = OpenOptions::new("rb")?.display(DisplayOptions {
                message: Some("counting".to_string()),
                ..Default::default()
            });
            count_lines(progress_open(&self.path, &options)?)?
        };

        log::debug!("count/{}: {count} lines", self.path.display());
        println!("{count}");
        Ok(())
    }
}
