use std::{env, path::PathBuf};

/// Prompt used when `PS1` is not set.
pub(crate) const DEFAULT_PROMPT: &str = "-> ";

/// Settings read once from the environment when the shell starts.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Config {
    pub prompt: String,
    pub home: Option<PathBuf>,
}

impl Config {
    pub(crate) fn new(prompt: Option<String>, home: Option<PathBuf>) -> Self {
        Config {
            prompt: prompt.unwrap_or_else(|| DEFAULT_PROMPT.to_string()),
            home,
        }
    }

    pub(crate) fn from_env() -> Self {
        let prompt = env::var_os("PS1").map(|ps1| ps1.to_string_lossy().into_owned());
        let home = env::var_os("HOME").map(PathBuf::from);
        Config::new(prompt, home)
    }
}
