// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Run `makems` to create an empty measurement set from a parset.

use std::{io::ErrorKind, path::Path, process::Command};

use log::{debug, info, warn};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MakemsError {
    #[error("Couldn't run '{0}'; is it installed and in PATH?")]
    NotFound(String),

    #[error("'{program}' failed (exit code {}): {stderr}", .code.map_or("none".to_string(), |c| c.to_string()))]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

/// What happened when `makems` was run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToolOutcome {
    Success,

    /// The program doesn't exist.
    NotFound { program: String },

    /// The program ran but didn't succeed. `code` is `None` if it was killed
    /// by a signal.
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

impl ToolOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Success)
    }

    /// Turn anything but [`ToolOutcome::Success`] into an error.
    pub fn into_result(self) -> Result<(), MakemsError> {
        match self {
            ToolOutcome::Success => Ok(()),
            ToolOutcome::NotFound { program } => Err(MakemsError::NotFound(program)),
            ToolOutcome::Failed {
                program,
                code,
                stderr,
            } => Err(MakemsError::Failed {
                program,
                code,
                stderr,
            }),
        }
    }
}

/// Run `program` (normally "makems") with the parset at `parset_path` as its
/// only argument, and wait for it to finish.
///
/// Errors are only returned if the program couldn't be started for a reason
/// other than it not existing.
pub fn run_makems<T: AsRef<Path>>(
    program: &str,
    parset_path: T,
) -> Result<ToolOutcome, MakemsError> {
    let parset_path = parset_path.as_ref();
    info!("Running {program} {}", parset_path.display());

    let output = match Command::new(program).arg(parset_path).output() {
        Ok(output) => output,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("{program} cannot be called");
            return Ok(ToolOutcome::NotFound {
                program: program.to_string(),
            });
        }
        Err(e) => return Err(MakemsError::IO(e)),
    };

    for line in String::from_utf8_lossy(&output.stdout).lines() {
        debug!("{program}: {line}");
    }
    if output.status.success() {
        Ok(ToolOutcome::Success)
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        warn!("{program} failed with {}: {stderr}", output.status);
        Ok(ToolOutcome::Failed {
            program: program.to_string(),
            code: output.status.code(),
            stderr,
        })
    }
}
