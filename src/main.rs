use crate::{config::Config, repl::repl};
use std::{io, process};

mod command;
mod config;
mod repl;
mod util;

fn main() {
    let config = Config::from_env();

    let mut stdin = io::stdin().lock();
    let status = repl(&mut stdin, &mut io::stdout(), &config);
    process::exit(status);
}
