//! A tool for executing external commands.

use crate::error::{Error, Result};
use std::path::PathBuf;

/// Represents a command executor.
///
/// The process is awaited until it exits, there is no timeout.
///
/// # Example
///
/// ```rust,no_run
/// # use ytmux::utils;
/// # use std::path::PathBuf;
/// # use ytmux::executor::{Executor, ExitOutcome};
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let args = vec!["-version"];
///
/// let executor = Executor {
///     executable_path: PathBuf::from("ffmpeg"),
///     args: utils::to_owned(args),
/// };
///
/// match executor.execute().await? {
///     ExitOutcome::Success => println!("ffmpeg is available"),
///     other => println!("ffmpeg is unusable: {:?}", other),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Executor {
    /// The path to the command executable.
    pub executable_path: PathBuf,

    /// The arguments to pass to the command.
    pub args: Vec<String>,
}

/// How an external process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitOutcome {
    /// The process exited with code 0.
    Success,
    /// The executable could not be found.
    ToolMissing,
    /// The process exited with a non-zero code, or was killed by a signal (code -1).
    NonZeroExit {
        /// The exit code.
        code: i32,
        /// What the process wrote to stderr.
        stderr: String,
    },
}

impl ExitOutcome {
    /// Returns true if the process succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, ExitOutcome::Success)
    }
}

impl Executor {
    /// Executes the command and reports how it ended.
    ///
    /// # Errors
    ///
    /// This function will return an error if the command could not be spawned for another reason
    /// than a missing executable.
    pub async fn execute(&self) -> Result<ExitOutcome> {
        log::debug!("Executing command: {:?}", self);

        let mut command = tokio::process::Command::new(&self.executable_path);
        command.args(&self.args);
        command.stdin(std::process::Stdio::null());

        #[cfg(target_os = "windows")]
        {
            command.creation_flags(0x08000000);
        }

        let output = match command.output().await {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::error!(
                    "Executable not found: {}",
                    self.executable_path.display()
                );
                return Ok(ExitOutcome::ToolMissing);
            }
            Err(e) => {
                return Err(Error::Command(format!(
                    "{}: {}",
                    self.executable_path.display(),
                    e
                )));
            }
        };

        if output.status.success() {
            return Ok(ExitOutcome::Success);
        }

        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        log::debug!("Process failed with code {}: {}", code, stderr);

        Ok(ExitOutcome::NonZeroExit { code, stderr })
    }
}
