use {
    crate::catalog::YoutubeCatalog,
    crate::config::Config,
    crate::error::{Error, Result},
    crate::fetcher::HttpFetcher,
    crate::orchestrator::{Acquisition, Orchestrator, OrchestratorConfig},
    crate::playlist::{PlaylistReport, PlaylistWalker},
    crate::remux::Ffmpeg,
    indicatif::MultiProgress,
    regex::Regex,
};

pub mod catalog;
pub mod config;
pub mod error;
pub mod executor;
pub mod fetcher;
pub mod model;
pub mod orchestrator;
pub mod playlist;
pub mod remux;
pub mod utils;

/// Everything a run needs.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// A video or playlist URL, or a bare video ID.
    pub url: String,
    /// The settings of the run.
    pub config: Config,
}

/// What a run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finished {
    /// A single video was acquired.
    Video(Acquisition),
    /// A playlist was walked.
    Playlist(PlaylistReport),
}

/// Downloads the video or playlist named by `options.url`.
///
/// Progress bars are drawn on `progress`.
///
/// # Errors
///
/// This function will return an error if the URL is not recognized, the playlist can't be
/// enumerated, or the single video could not be acquired.
pub async fn download(options: DownloadOptions, progress: MultiProgress) -> Result<Finished> {
    let target = parse_target(&options.url)?;

    let orchestrator = Orchestrator::new(
        YoutubeCatalog::new(),
        HttpFetcher::new(progress)?,
        Ffmpeg::new(options.config.ffmpeg.clone()),
        OrchestratorConfig::from(&options.config),
    );

    match target {
        Target::Video(id) => Ok(Finished::Video(orchestrator.acquire(&id).await?)),
        Target::Playlist(id) => Ok(Finished::Playlist(
            PlaylistWalker::new(&orchestrator).walk(&id).await?,
        )),
    }
}

/// What a URL points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A single video, by ID.
    Video(String),
    /// A playlist, by ID.
    Playlist(String),
}

const YOUTUBE_HOST: &str = r"^(?:https?://)?(?:(?:www|m|music)\.)?(?:youtube\.com|youtu\.be)/";
const VIDEO_ID: &str = r"^[A-Za-z0-9_-]{11}$";
const VIDEO_PATTERNS: [&str; 3] = [
    r"[?&]v=([A-Za-z0-9_-]{11})",
    r"youtu\.be/([A-Za-z0-9_-]{11})",
    r"/(?:shorts|embed|live)/([A-Za-z0-9_-]{11})",
];
const PLAYLIST_PATTERN: &str = r"[?&]list=([A-Za-z0-9_-]+)";

/// Resolves a URL, or a bare video ID, to what it points to.
/// A watch URL carrying both a video and a playlist resolves to the video.
///
/// # Errors
///
/// Returns [`Error::InvalidUrl`] if the input is not a YouTube video or playlist.
pub fn parse_target(input: &str) -> Result<Target> {
    let input = input.trim();

    if Regex::new(VIDEO_ID)?.is_match(input) {
        return Ok(Target::Video(input.to_string()));
    }

    if !Regex::new(YOUTUBE_HOST)?.is_match(input) {
        return Err(Error::InvalidUrl(input.to_string()));
    }

    for pattern in VIDEO_PATTERNS.iter() {
        if let Some(captures) = Regex::new(pattern)?.captures(input) {
            return Ok(Target::Video(captures[1].to_string()));
        }
    }

    if let Some(captures) = Regex::new(PLAYLIST_PATTERN)?.captures(input) {
        return Ok(Target::Playlist(captures[1].to_string()));
    }

    Err(Error::InvalidUrl(input.to_string()))
}
