use std::{
    ffi::OsString,
    io::{self, BufRead},
    os::unix::ffi::OsStringExt,
};

use anyhow::Error;
use bytes::{Bytes, BytesMut};
use nix::errno::Errno;
use thiserror::Error;

/// Longest line accepted per read, line terminator included.
pub(crate) const MAX_LINE: usize = 100;
/// Most tokens a single command may carry.
pub(crate) const MAX_TOKENS: usize = 50;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("error reading input: unexpected EOF")]
    UnexpectedEOF,
    #[error("error reading input: {0}")]
    ReadInput(io::Error),
    #[error("too many arguments (at most {max} allowed)")]
    TooManyArguments { max: usize },
    #[error("cd: {path}: {msg}")]
    ChangeDir { path: String, msg: String },
    #[error("{op}: missing file name")]
    MissingRedirectTarget { op: String },
    #[error("{target}: {msg}")]
    Redirect { target: String, msg: String },
    #[error("{0}: argument contains a NUL byte")]
    InvalidArgument(String),
    #[error("missing command before redirection")]
    MissingCommand,
    #[error("{0}: command not found")]
    CommandNotFound(String),
    #[error("{name}: {source}")]
    Exec { name: String, source: Errno },
    #[error("failed to create process: {0}")]
    Fork(Errno),
    #[error("failed to wait for process: {0}")]
    Wait(Errno),
    #[error("{0}")]
    InternalError(Error),
    #[error("no command")]
    Nop,
}

/// How far a failure reaches once it has been reported.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Severity {
    /// The shell reports it and prompts again.
    Recoverable,
    /// Raised inside a created process; that process exits with status 1.
    Child,
    /// The shell itself exits with status 1.
    Fatal,
}

impl DashError {
    pub fn severity(&self) -> Severity {
        match self {
            DashError::UnexpectedEOF
            | DashError::ReadInput(_)
            | DashError::ChangeDir { .. }
            | DashError::Fork(_)
            | DashError::InternalError(_) => Severity::Fatal,
            DashError::Redirect { .. }
            | DashError::MissingCommand
            | DashError::CommandNotFound(_)
            | DashError::Exec { .. } => Severity::Child,
            DashError::TooManyArguments { .. }
            | DashError::MissingRedirectTarget { .. }
            | DashError::InvalidArgument(_)
            | DashError::Wait(_)
            | DashError::Nop => Severity::Recoverable,
        }
    }
}

/// Reads one line of at most `MAX_LINE - 1` bytes, stopping after a newline.
///
/// Anything past the limit is left in `reader` and comes back as the next line.
pub(crate) fn read_line<R: BufRead>(reader: &mut R) -> Result<Bytes, DashError> {
    let limit = MAX_LINE - 1;
    let mut buf = BytesMut::with_capacity(MAX_LINE);

    while buf.len() < limit {
        let available = match reader.fill_buf() {
            Ok(available) => available,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(DashError::ReadInput(error)),
        };
        if available.is_empty() {
            break;
        }

        let room = limit - buf.len();
        let chunk = &available[..available.len().min(room)];
        match chunk.iter().position(|&byte| byte == b'\n') {
            Some(end) => {
                buf.extend_from_slice(&chunk[..=end]);
                reader.consume(end + 1);
                break;
            }
            None => {
                let taken = chunk.len();
                buf.extend_from_slice(chunk);
                reader.consume(taken);
            }
        }
    }

    if buf.is_empty() {
        return Err(DashError::UnexpectedEOF);
    }
    Ok(buf.freeze())
}

/// Splits a raw line on spaces into the command's argument vector.
///
/// Tokens keep the exact bytes that were typed.
pub(crate) fn tokenize(line: &[u8]) -> Result<Vec<OsString>, DashError> {
    let line = line.strip_suffix(b"\n").unwrap_or(line);

    // Runs of spaces never yield empty tokens
    let tokens: Vec<OsString> = line
        .split(|&byte| byte == b' ')
        .filter(|token| !token.is_empty())
        .map(|token| OsString::from_vec(token.to_vec()))
        .collect();

    if tokens.len() > MAX_TOKENS {
        return Err(DashError::TooManyArguments { max: MAX_TOKENS });
    }
    Ok(tokens)
}

pub(crate) fn read_command<R: BufRead>(reader: &mut R) -> Result<Vec<OsString>, DashError> {
    let line = read_line(reader)?;
    tokenize(&line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Read};
    use std::os::unix::ffi::OsStrExt;

    #[test]
    fn read_command_parses_tokens() {
        let mut input = io::Cursor::new("echo hello world\n");

        let tokens = read_command(&mut input);
        assert!(tokens.is_ok());
        assert_eq!(tokens.unwrap(), vec!["echo", "hello", "world"]);
    }

    #[test]
    fn read_command_single_token() {
        let mut input = io::Cursor::new("ls\n");
        let tokens = read_command(&mut input).unwrap();
        assert_eq!(tokens, vec![OsString::from("ls")]);
    }

    #[test]
    fn empty_line_has_no_tokens() {
        let mut input = io::Cursor::new("\n");
        let tokens = read_command(&mut input).unwrap();
        assert!(tokens.is_empty());
    }

    #[test]
    fn repeated_spaces_are_skipped() {
        let tokens = tokenize(b"  echo   two  spaces \n").unwrap();
        assert_eq!(tokens, vec!["echo", "two", "spaces"]);
    }

    #[test]
    fn tokens_never_contain_spaces() {
        let tokens = tokenize(b"a bb ccc dddd\n").unwrap();
        assert!(tokens.iter().all(|token| !token.as_bytes().contains(&b' ')));
        assert_eq!(tokens.len(), 4);
    }

    #[test]
    fn tabs_are_not_delimiters() {
        let tokens = tokenize(b"echo a\tb\n").unwrap();
        assert_eq!(tokens, vec!["echo", "a\tb"]);
    }

    #[test]
    fn non_utf8_bytes_are_kept_verbatim() {
        let tokens = tokenize(b"echo a\xffb \xfe\n").unwrap();
        assert_eq!(tokens[1].as_bytes(), b"a\xffb");
        assert_eq!(tokens[2].as_bytes(), b"\xfe");
    }

    #[test]
    fn quotes_are_ordinary_characters() {
        let tokens = tokenize(b"echo \"hello world\"\n").unwrap();
        assert_eq!(tokens, vec!["echo", "\"hello", "world\""]);
    }

    #[test]
    fn pipe_is_an_ordinary_token() {
        let tokens = tokenize(b"ls | wc\n").unwrap();
        assert_eq!(tokens, vec!["ls", "|", "wc"]);
    }

    #[test]
    fn unterminated_final_line_is_kept_whole() {
        let mut input = io::Cursor::new("exit");
        let tokens = read_command(&mut input).unwrap();
        assert_eq!(tokens, vec!["exit"]);
    }

    #[test]
    fn lines_are_read_one_at_a_time() {
        let mut input = io::Cursor::new("first line\nsecond\n");
        assert_eq!(read_command(&mut input).unwrap(), vec!["first", "line"]);
        assert_eq!(read_command(&mut input).unwrap(), vec!["second"]);
        assert!(matches!(
            read_command(&mut input).unwrap_err(),
            DashError::UnexpectedEOF
        ));
    }

    #[test]
    fn overlong_line_is_split_at_the_bound() {
        let long = "x".repeat(150);
        let mut input = io::Cursor::new(format!("{}\n", long));

        let first = read_line(&mut input).unwrap();
        assert_eq!(first.len(), MAX_LINE - 1);
        assert!(!first.ends_with(b"\n"));

        let rest = read_line(&mut input).unwrap();
        assert_eq!(rest.len(), 150 - (MAX_LINE - 1) + 1);
        assert!(rest.ends_with(b"\n"));
    }

    #[test]
    fn fifty_tokens_are_accepted() {
        let line = vec!["a"; MAX_TOKENS].join(" ");
        let tokens = tokenize(line.as_bytes()).unwrap();
        assert_eq!(tokens.len(), MAX_TOKENS);
    }

    #[test]
    fn too_many_tokens_is_rejected() {
        let line = vec!["a"; MAX_TOKENS + 1].join(" ");
        let err = tokenize(line.as_bytes()).unwrap_err();
        assert!(matches!(err, DashError::TooManyArguments { max: MAX_TOKENS }));
        assert_eq!(err.severity(), Severity::Recoverable);
    }

    #[test]
    fn eof_is_fatal() {
        let mut input = io::Cursor::new("");
        let err = read_command(&mut input).unwrap_err();
        assert!(matches!(err, DashError::UnexpectedEOF));
        assert_eq!(err.severity(), Severity::Fatal);
    }

    struct ErrReader;

    impl Read for ErrReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "read error"))
        }
    }

    impl BufRead for ErrReader {
        fn fill_buf(&mut self) -> io::Result<&[u8]> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "fill_buf error"))
        }
        fn consume(&mut self, _n: usize) {}
    }

    #[test]
    fn read_error_is_fatal() {
        let err = read_command(&mut ErrReader).unwrap_err();
        assert!(matches!(err, DashError::ReadInput(_)));
        assert_eq!(err.severity(), Severity::Fatal);
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            DashError::CommandNotFound("nope".into()).to_string(),
            "nope: command not found"
        );
        assert_eq!(
            DashError::MissingRedirectTarget { op: ">".into() }.to_string(),
            ">: missing file name"
        );
    }
}
