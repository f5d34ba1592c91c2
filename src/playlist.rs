//! Walks a playlist, acquiring every video in order.

use crate::catalog::StreamCatalog;
use crate::error::Result;
use crate::fetcher::TrackFetcher;
use crate::orchestrator::{Orchestrator, Source};
use crate::remux::Remuxer;
use log::{error, info};
use std::fmt;

/// What happened to the entries of a walked playlist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistReport {
    /// Entries whose artifact was produced by this walk.
    pub downloaded: usize,
    /// Entries whose artifact already existed.
    pub skipped: usize,
    /// Entries that failed, with the video ID and the error message.
    pub failed: Vec<(String, String)>,
}

impl PlaylistReport {
    /// The number of entries seen.
    pub fn total(&self) -> usize {
        self.downloaded + self.skipped + self.failed.len()
    }
}

impl fmt::Display for PlaylistReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} downloaded, {} skipped, {} failed",
            self.downloaded,
            self.skipped,
            self.failed.len()
        )
    }
}

/// Acquires every video of a playlist with the best-pair strategy.
pub struct PlaylistWalker<'a, C, F, R> {
    orchestrator: &'a Orchestrator<C, F, R>,
}

impl<'a, C, F, R> PlaylistWalker<'a, C, F, R>
where
    C: StreamCatalog,
    F: TrackFetcher,
    R: Remuxer,
{
    pub fn new(orchestrator: &'a Orchestrator<C, F, R>) -> Self {
        Self { orchestrator }
    }

    /// Enumerates the playlist and acquires each entry in order.
    /// A failing entry is logged and the walk moves on.
    ///
    /// # Errors
    ///
    /// This function will only return an error if the playlist itself can't be enumerated.
    pub async fn walk(&self, playlist_id: &str) -> Result<PlaylistReport> {
        let playlist = self.orchestrator.catalog().playlist(playlist_id).await?;
        let total = playlist.entries.len();
        info!("Playlist: {}", playlist.title);
        info!("Total videos: {}", total);

        let mut report = PlaylistReport::default();
        for (i, entry) in playlist.entries.iter().enumerate() {
            info!("[{}/{}] {}", i + 1, total, entry.title);

            match self.orchestrator.acquire_best_pair(entry).await {
                Ok(acquisition) if acquisition.source == Source::Existing => report.skipped += 1,
                Ok(_) => report.downloaded += 1,
                Err(e) => {
                    error!("Failed: {} -> [{}] {}", entry.id, e.kind(), e);
                    report.failed.push((entry.id.clone(), e.to_string()));
                }
            }
        }

        info!("Playlist done: {}", report);
        Ok(report)
    }
}
