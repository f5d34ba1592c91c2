//! The errors that can occur.

use thiserror::Error;

/// A type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// The possible errors that can occur.
#[derive(Debug, Error)]
pub enum Error {
    /// An error occurred while interacting with the file system.
    #[error("An IO error occurred: {0}")]
    IO(#[from] std::io::Error),
    /// An error occurred while fetching a track.
    #[error("An error occurred while fetching: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// The stream catalog could not answer a query.
    #[error("An error occurred while querying YouTube: {0}")]
    Catalog(#[from] rustypipe::error::Error),
    /// The config file could not be parsed.
    #[error("Malformed config file: {0}")]
    Config(#[from] toml::de::Error),
    /// A pattern could not be compiled.
    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    /// The server answered with something other than the requested bytes.
    #[error("Unexpected response while fetching: {0}")]
    Http(String),
    /// An error occurred while running a command.
    #[error("Failed to execute command: {0}")]
    Command(String),
    /// An error occurred manipulating a path.
    #[error("An invalid path was provided: {0}")]
    Path(String),
    /// The input is neither a video nor a playlist URL.
    #[error("Not a YouTube video or playlist URL: {0}")]
    InvalidUrl(String),

    /// No track matches the requested kind and container.
    #[error("No {0} track available")]
    NoMatchingTrack(String),
    /// Every attempt to fetch a track failed.
    #[error("Fetching {track} failed after {attempts} attempts: {source}")]
    FetchExhausted {
        track: String,
        attempts: u32,
        #[source]
        source: Box<Error>,
    },
    /// The remuxer could not merge the given files.
    #[error("Merging failed: {0}")]
    Remux(String),
    /// Every strategy was tried without producing an artifact.
    #[error("Every strategy failed for {0}")]
    Exhausted(String),
}

impl Error {
    /// Short name of the error kind, used when logging top-level failures.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::IO(_) => "IO",
            Error::Reqwest(_) => "Reqwest",
            Error::Catalog(_) => "Catalog",
            Error::Config(_) => "Config",
            Error::Regex(_) => "Regex",
            Error::Http(_) => "Http",
            Error::Command(_) => "Command",
            Error::Path(_) => "Path",
            Error::InvalidUrl(_) => "InvalidUrl",
            Error::NoMatchingTrack(_) => "NoMatchingTrack",
            Error::FetchExhausted { .. } => "FetchExhausted",
            Error::Remux(_) => "Remux",
            Error::Exhausted(_) => "Exhausted",
        }
    }
}
