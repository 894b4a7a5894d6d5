use std::ffi::OsString;

use crate::command::Flow;

/// `exit` always ends the shell with status 0; any arguments are ignored.
pub(crate) fn handle_exit(_args: &[OsString]) -> Flow {
    Flow::Exit(0)
}
