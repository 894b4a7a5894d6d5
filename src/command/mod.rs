mod handlers;
pub(crate) mod redirect;

use std::{
    ffi::{OsStr, OsString},
    fmt, io,
    os::unix::ffi::OsStrExt,
};

use crate::{
    config::Config,
    util::{DashError, read_command},
};

use self::handlers::{handle_cd, handle_executable, handle_exit};

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum CommandType {
    Cd,
    Exit,
    Executable(String),
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandType::Cd => write!(f, "cd"),
            CommandType::Exit => write!(f, "exit"),
            CommandType::Executable(name) => write!(f, "{}", name),
        }
    }
}

impl CommandType {
    pub(crate) fn from_str<S: AsRef<OsStr> + ?Sized>(s: &S) -> Self {
        let name = s.as_ref();
        match name.as_bytes() {
            b"cd" => CommandType::Cd,
            b"exit" => CommandType::Exit,
            _ => CommandType::Executable(name.to_string_lossy().into_owned()),
        }
    }
}

/// What the shell does once a command has run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Flow {
    Continue,
    Exit(i32),
}

#[derive(Debug)]
pub(crate) struct Command {
    pub type_: CommandType,
    pub args: Vec<OsString>,
}

impl Command {
    pub(crate) fn new<R: io::BufRead>(reader: &mut R) -> Result<Command, DashError> {
        let args = read_command(reader)?;
        Command::from_args(args)
    }

    pub(crate) fn from_args(args: Vec<OsString>) -> Result<Command, DashError> {
        // Read the name of the command from the tokenized args
        let Some(name) = args.first() else {
            return Err(DashError::Nop);
        };

        let type_ = CommandType::from_str(name);
        Ok(Command { type_, args })
    }

    pub(crate) fn run(&self, config: &Config) -> Result<Flow, DashError> {
        match self.type_ {
            CommandType::Cd => handle_cd(&self.args, config).map(|_| Flow::Continue),
            CommandType::Exit => Ok(handle_exit(&self.args)),
            CommandType::Executable(_) => handle_executable(&self.args).map(|_| Flow::Continue),
        }
    }
}
