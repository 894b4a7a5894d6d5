use std::{
    convert::Infallible,
    ffi::{CString, OsString},
    io,
    os::unix::ffi::OsStrExt,
};

use nix::{
    errno::Errno,
    libc,
    sys::wait::waitpid,
    unistd::{self, ForkResult},
};

use crate::{
    command::redirect::{self, Plan, Redirection},
    util::DashError,
};

/// Runs `args` as an external program in a new process and waits for it.
///
/// Redirections are bound inside the new process only. Any failure there is
/// reported by that process, which then exits with status 1; the shell only
/// sees an error when the process could not be created or waited on.
pub(crate) fn handle_executable(args: &[OsString]) -> Result<(), DashError> {
    let Plan { args, redirections } = redirect::plan(args)?;
    let argv = args
        .iter()
        .map(|arg| {
            CString::new(arg.as_bytes())
                .map_err(|_| DashError::InvalidArgument(arg.to_string_lossy().into_owned()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    // SAFETY: the child never returns into the caller. It only rebinds
    // descriptors, then either execs or writes its diagnostic straight to
    // fd 2 and leaves through _exit, skipping std's locks and exit handlers.
    match unsafe { unistd::fork() }.map_err(DashError::Fork)? {
        ForkResult::Child => {
            let Err(error) = exec(&argv, &redirections);
            let message = format!("dash: {}\n", error);
            let _ = unistd::write(io::stderr(), message.as_bytes());
            unsafe { libc::_exit(1) }
        }
        ForkResult::Parent { child } => {
            // The child's exit status is not surfaced
            waitpid(child, None).map_err(DashError::Wait)?;
            Ok(())
        }
    }
}

fn exec(argv: &[CString], redirections: &[Redirection]) -> Result<Infallible, DashError> {
    redirect::apply(redirections)?;

    let program = argv.first().ok_or(DashError::MissingCommand)?;
    let name = || program.to_string_lossy().into_owned();
    unistd::execvp(program, argv).map_err(|source| match source {
        Errno::ENOENT => DashError::CommandNotFound(name()),
        source => DashError::Exec {
            name: name(),
            source,
        },
    })
}
