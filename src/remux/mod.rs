//! Merging separate video and audio files into one container.

use crate::error::{Error, Result};
use crate::executor::{Executor, ExitOutcome};
use crate::utils;
use std::path::{Path, PathBuf};

/// Combines a video-only file and an audio-only file without re-encoding.
#[allow(async_fn_in_trait)]
pub trait Remuxer {
    /// Merges `video` and `audio` into `output`, overwriting it.
    ///
    /// # Errors
    ///
    /// Returns an error only when the merge could not be attempted at all.
    /// A missing tool or a failed run are reported through [`ExitOutcome`].
    async fn merge(&self, video: &Path, audio: &Path, output: &Path) -> Result<ExitOutcome>;
}

/// The ffmpeg remuxer.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    /// The path to the ffmpeg executable, or just its name to look it up in `PATH`.
    pub executable: PathBuf,
}

impl Ffmpeg {
    /// Creates a remuxer running the given ffmpeg executable.
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// The arguments that copy both streams into `output`.
    fn merge_args(video: &Path, audio: &Path, output: &Path) -> Result<Vec<String>> {
        let video = video
            .to_str()
            .ok_or(Error::Path("Invalid video path".to_string()))?;
        let audio = audio
            .to_str()
            .ok_or(Error::Path("Invalid audio path".to_string()))?;
        let output = output
            .to_str()
            .ok_or(Error::Path("Invalid output path".to_string()))?;

        Ok(utils::to_owned(vec![
            "-y", "-loglevel", "error", "-i", video, "-i", audio, "-c", "copy", output,
        ]))
    }
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl Remuxer for Ffmpeg {
    async fn merge(&self, video: &Path, audio: &Path, output: &Path) -> Result<ExitOutcome> {
        log::debug!(
            "Merging {} and {} into {}",
            video.display(),
            audio.display(),
            output.display()
        );

        let executor = Executor {
            executable_path: self.executable.clone(),
            args: Self::merge_args(video, audio, output)?,
        };

        executor.execute().await
    }
}
