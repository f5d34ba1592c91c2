//! The stream catalog: what can be downloaded for a video, and which videos a playlist holds.

use crate::error::Result;
use crate::model::{PlaylistInfo, VideoInfo};

pub mod youtube;

pub use youtube::YoutubeCatalog;

/// Answers metadata queries about videos and playlists.
#[allow(async_fn_in_trait)]
pub trait StreamCatalog {
    /// Returns the title and every downloadable track of a video.
    async fn video_info(&self, video_id: &str) -> Result<VideoInfo>;

    /// Returns every video of a playlist, in playlist order.
    async fn playlist(&self, playlist_id: &str) -> Result<PlaylistInfo>;
}
