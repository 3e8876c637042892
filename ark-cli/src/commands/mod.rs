use clap::Subcommand;

mod cat;
mod count;
mod reverse;

#[derive(Debug, Subcommand)]
pub enum Commands {
    Reverse(reverse::Reverse),
    Cat(cat::Cat),
    Count(count::Count),
}
