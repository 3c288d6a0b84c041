use clap::Parser;

use crate::{cli::Cli, shell::start_shell};

mod cli;
mod disk;
mod fs;
mod shell;
mod utils;

fn main() {
    env_logger::init();
    start_shell(Cli::parse());
}
