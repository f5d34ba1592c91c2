//! The models used to represent what the catalog knows about a video.
//!
//! The represented data is the video title, its downloadable tracks and the entries of a playlist.

use serde::Deserialize;
use std::fmt;

pub mod query;

pub use query::{QualityKey, TrackQuery};

/// The container a track is encoded in, which is also the extension of the files written for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    /// MPEG-4, including `m4a` audio tracks.
    #[default]
    Mp4,
    /// WebM.
    Webm,
}

impl Container {
    /// The file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Container::Mp4 => "mp4",
            Container::Webm => "webm",
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// What a track carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    /// An adaptive track with video only.
    VideoOnly,
    /// An adaptive track with audio only.
    AudioOnly,
    /// A progressive track, video and audio already joined.
    Combined,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::VideoOnly => write!(f, "video-only"),
            TrackKind::AudioOnly => write!(f, "audio-only"),
            TrackKind::Combined => write!(f, "combined"),
        }
    }
}

/// A downloadable track, as supplied by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackDescriptor {
    /// The YouTube format identifier.
    pub itag: u32,
    /// The container of the track.
    pub container: Container,
    /// What the track carries.
    pub kind: TrackKind,
    /// The frame height in pixels. None for audio tracks.
    pub height: Option<u32>,
    /// The bitrate in bits per second.
    pub bitrate: u32,
    /// The size in bytes, when the catalog knows it.
    pub size: Option<u64>,
    /// Where the bytes live.
    pub url: String,
}

impl TrackDescriptor {
    /// Human-readable quality, e.g. `1080p` for video or `128kbps` for audio.
    pub fn quality_label(&self) -> String {
        match (self.kind, self.height) {
            (TrackKind::AudioOnly, _) | (_, None) => format!("{}kbps", self.bitrate / 1000),
            (_, Some(height)) => format!("{}p", height),
        }
    }
}

impl fmt::Display for TrackDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} (itag {})",
            self.kind,
            self.container,
            self.quality_label(),
            self.itag
        )
    }
}

/// A video and everything that can be downloaded for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoInfo {
    /// The ID of the video.
    pub id: String,
    /// The display title of the video.
    pub title: String,
    /// Every track the catalog offers, in catalog order.
    pub tracks: Vec<TrackDescriptor>,
}

impl VideoInfo {
    /// Starts a query over the tracks of this video.
    pub fn query(&self) -> TrackQuery<'_> {
        TrackQuery::new(&self.tracks)
    }
}

/// One video of a playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    /// The ID of the video.
    pub id: String,
    /// The display title of the video.
    pub title: String,
}

/// A playlist and its videos, in playlist order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistInfo {
    /// The ID of the playlist.
    pub id: String,
    /// The display title of the playlist.
    pub title: String,
    /// The videos of the playlist.
    pub entries: Vec<PlaylistEntry>,
}
