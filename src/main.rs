mod cli;
mod config;
mod entry;
mod fix;
mod git;
mod idea;
mod init;
mod stamp;

use std::process;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
