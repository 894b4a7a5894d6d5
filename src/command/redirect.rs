use std::{
    ffi::{OsStr, OsString},
    fmt,
    fs::{File, OpenOptions},
    io,
    os::{
        fd::{IntoRawFd, RawFd},
        unix::{ffi::OsStrExt, fs::OpenOptionsExt},
    },
    path::Path,
};

use nix::{libc, unistd};

use crate::util::DashError;

/// Permission bits for files created by a redirection, before the umask.
const CREATE_MODE: u32 = 0o777;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Redirect {
    /// `<`
    Input,
    /// `>`
    Output,
    /// `2>`
    Error,
    /// `>>`
    AppendOutput,
    /// `2>>`
    AppendError,
    /// `&>`. Only standard error is rebound, in append mode; standard output
    /// is left alone.
    Combined,
}

impl fmt::Display for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

impl Redirect {
    pub(crate) fn from_token(token: &OsStr) -> Option<Self> {
        match token.as_bytes() {
            b"<" => Some(Redirect::Input),
            b">" => Some(Redirect::Output),
            b"2>" => Some(Redirect::Error),
            b">>" => Some(Redirect::AppendOutput),
            b"2>>" => Some(Redirect::AppendError),
            b"&>" => Some(Redirect::Combined),
            _ => None,
        }
    }

    pub(crate) fn token(&self) -> &'static str {
        match self {
            Redirect::Input => "<",
            Redirect::Output => ">",
            Redirect::Error => "2>",
            Redirect::AppendOutput => ">>",
            Redirect::AppendError => "2>>",
            Redirect::Combined => "&>",
        }
    }

    /// The standard stream this operator rebinds.
    pub(crate) fn stream(&self) -> RawFd {
        match self {
            Redirect::Input => libc::STDIN_FILENO,
            Redirect::Output | Redirect::AppendOutput => libc::STDOUT_FILENO,
            Redirect::Error | Redirect::AppendError | Redirect::Combined => libc::STDERR_FILENO,
        }
    }

    pub(crate) fn open(&self, path: &Path) -> io::Result<File> {
        let mut options = OpenOptions::new();
        match self {
            Redirect::Input => options.read(true),
            Redirect::Output | Redirect::Error => options
                .write(true)
                .create(true)
                .truncate(true)
                .mode(CREATE_MODE),
            Redirect::AppendOutput | Redirect::AppendError | Redirect::Combined => {
                options.append(true).create(true).mode(CREATE_MODE)
            }
        };
        options.open(path)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Redirection {
    pub op: Redirect,
    pub target: OsString,
}

impl Redirection {
    /// Opens the target and makes the operator's stream refer to it.
    ///
    /// Only ever called in a freshly created process: it rewires that
    /// process's standard streams.
    pub(crate) fn bind(&self) -> Result<(), DashError> {
        let into_dash_err = |msg: String| DashError::Redirect {
            target: self.target.to_string_lossy().into_owned(),
            msg,
        };

        let file = self
            .op
            .open(Path::new(&self.target))
            .map_err(|error| into_dash_err(error.to_string()))?;
        let fd = file.into_raw_fd();
        let stream = self.op.stream();

        // A closed standard stream can hand its own slot back from open()
        if fd == stream {
            return Ok(());
        }

        unistd::dup2(fd, stream).map_err(|errno| into_dash_err(format!("dup2: {}", errno)))?;
        unistd::close(fd).map_err(|errno| into_dash_err(format!("close: {}", errno)))
    }
}

/// A command split into the arguments the program sees and the
/// redirections to perform before it starts.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct Plan {
    pub args: Vec<OsString>,
    pub redirections: Vec<Redirection>,
}

/// Scans `args` left to right for redirection operators.
///
/// Every token is checked, targets included, and each operator found is
/// recorded along with the token after it. The visible arguments end at the
/// first operator: anything written after a redirection target is dropped.
pub(crate) fn plan(args: &[OsString]) -> Result<Plan, DashError> {
    let mut first_op = None;
    let mut redirections = Vec::new();

    for (i, token) in args.iter().enumerate() {
        let Some(op) = Redirect::from_token(token) else {
            continue;
        };

        let target = args
            .get(i + 1)
            .ok_or_else(|| DashError::MissingRedirectTarget { op: op.to_string() })?;

        first_op.get_or_insert(i);
        redirections.push(Redirection {
            op,
            target: target.clone(),
        });
    }

    let end = first_op.unwrap_or(args.len());
    Ok(Plan {
        args: args[..end].to_vec(),
        redirections,
    })
}

/// Binds every redirection in order; the first failure stops the rest.
pub(crate) fn apply(redirections: &[Redirection]) -> Result<(), DashError> {
    for redirection in redirections {
        redirection.bind()?;
    }
    Ok(())
}
