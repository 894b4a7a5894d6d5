use std::io::{BufRead, Write};

use anyhow::Context;

use crate::{
    command::{Command, Flow},
    config::Config,
    util::{DashError, Severity},
};

/// Prompts, reads and runs commands until `exit` or a fatal error, then
/// returns the status the shell should exit with.
pub(crate) fn repl<R: BufRead, W: Write>(reader: &mut R, out: &mut W, config: &Config) -> i32 {
    loop {
        match step(reader, out, config) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit(status)) => return status,
            Err(DashError::Nop) => {}
            Err(error) => {
                eprintln!("dash: {}", error);
                match error.severity() {
                    Severity::Fatal => return 1,
                    Severity::Recoverable | Severity::Child => {}
                }
            }
        }
    }
}

fn step<R: BufRead, W: Write>(reader: &mut R, out: &mut W, config: &Config) -> Result<Flow, DashError> {
    write!(out, "{}", config.prompt)
        .and_then(|_| out.flush())
        .context("failed to write prompt")
        .map_err(DashError::InternalError)?;

    let cmd = Command::new(reader)?;
    cmd.run(config)
}
