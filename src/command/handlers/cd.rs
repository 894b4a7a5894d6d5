use std::{env, ffi::OsString, path::Path};

use crate::{config::Config, util::DashError};

pub(crate) fn handle_cd(args: &[OsString], config: &Config) -> Result<(), DashError> {
    let target = match args.get(1) {
        Some(target_dir) => Path::new(target_dir),
        None => config
            .home
            .as_deref()
            .ok_or_else(|| DashError::ChangeDir {
                path: "HOME".into(),
                msg: "not set".into(),
            })?,
    };

    env::set_current_dir(target).map_err(|error| DashError::ChangeDir {
        path: target.display().to_string(),
        msg: error.to_string(),
    })
}
