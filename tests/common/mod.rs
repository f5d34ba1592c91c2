//! Test doubles for the catalog, the fetcher and the remuxer.
//!
//! The fake fetcher writes a track's URL as the file content, so the fake remuxer can tell
//! which video track it was handed by reading the file.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use ytmux::catalog::StreamCatalog;
use ytmux::error::{Error, Result};
use ytmux::executor::ExitOutcome;
use ytmux::fetcher::TrackFetcher;
use ytmux::model::{Container, PlaylistEntry, PlaylistInfo, TrackDescriptor, TrackKind, VideoInfo};
use ytmux::orchestrator::{Orchestrator, OrchestratorConfig};
use ytmux::remux::Remuxer;

pub fn video_only(height: u32) -> TrackDescriptor {
    TrackDescriptor {
        itag: 100 + height,
        container: Container::Mp4,
        kind: TrackKind::VideoOnly,
        height: Some(height),
        bitrate: height * 2_000,
        size: None,
        url: format!("video-{}p", height),
    }
}

pub fn audio_only(kbps: u32) -> TrackDescriptor {
    TrackDescriptor {
        itag: 140 + kbps,
        container: Container::Mp4,
        kind: TrackKind::AudioOnly,
        height: None,
        bitrate: kbps * 1_000,
        size: None,
        url: format!("audio-{}kbps", kbps),
    }
}

pub fn combined(height: u32) -> TrackDescriptor {
    TrackDescriptor {
        itag: 10 + height,
        container: Container::Mp4,
        kind: TrackKind::Combined,
        height: Some(height),
        bitrate: height * 1_000,
        size: None,
        url: format!("combined-{}p", height),
    }
}

pub fn video(id: &str, title: &str, tracks: Vec<TrackDescriptor>) -> VideoInfo {
    VideoInfo {
        id: id.to_string(),
        title: title.to_string(),
        tracks,
    }
}

#[derive(Default)]
pub struct FakeCatalog {
    pub videos: HashMap<String, VideoInfo>,
    pub playlists: HashMap<String, PlaylistInfo>,
    pub queried: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub fn with_video(mut self, info: VideoInfo) -> Self {
        self.videos.insert(info.id.clone(), info);
        self
    }

    pub fn with_playlist(mut self, id: &str, videos: &[VideoInfo]) -> Self {
        let entries = videos
            .iter()
            .map(|v| PlaylistEntry {
                id: v.id.clone(),
                title: v.title.clone(),
            })
            .collect();
        self.playlists.insert(
            id.to_string(),
            PlaylistInfo {
                id: id.to_string(),
                title: String::from("Test playlist"),
                entries,
            },
        );
        for info in videos {
            self.videos.insert(info.id.clone(), info.clone());
        }
        self
    }

    pub fn queried(&self) -> Vec<String> {
        self.queried.lock().unwrap().clone()
    }
}

impl StreamCatalog for FakeCatalog {
    async fn video_info(&self, video_id: &str) -> Result<VideoInfo> {
        self.queried.lock().unwrap().push(video_id.to_string());
        self.videos
            .get(video_id)
            .cloned()
            .ok_or_else(|| Error::Http(format!("unknown video {}", video_id)))
    }

    async fn playlist(&self, playlist_id: &str) -> Result<PlaylistInfo> {
        self.playlists
            .get(playlist_id)
            .cloned()
            .ok_or_else(|| Error::Http(format!("unknown playlist {}", playlist_id)))
    }
}

/// Writes the track URL as content. URLs listed in `broken` always fail.
#[derive(Default)]
pub struct FakeFetcher {
    pub broken: HashSet<String>,
    pub fetched: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn broken(urls: &[&str]) -> Self {
        Self {
            broken: urls.iter().map(|u| u.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

impl TrackFetcher for FakeFetcher {
    async fn fetch(&self, track: &TrackDescriptor, destination: &Path) -> Result<u64> {
        self.fetched.lock().unwrap().push(track.url.clone());

        if self.broken.contains(&track.url) {
            std::fs::write(destination, b"partial")?;
            return Err(Error::Http(format!("connection reset on {}", track.url)));
        }

        std::fs::write(destination, track.url.as_bytes())?;
        Ok(track.url.len() as u64)
    }
}

/// Merges by writing both inputs' content to the output. Video contents listed in `failing`
/// leave a partial output behind and exit non-zero.
#[derive(Default)]
pub struct FakeRemuxer {
    pub failing: HashSet<String>,
    pub missing: bool,
    pub merged: Mutex<Vec<(String, String)>>,
}

impl FakeRemuxer {
    pub fn failing(videos: &[&str]) -> Self {
        Self {
            failing: videos.iter().map(|v| v.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn missing() -> Self {
        Self {
            missing: true,
            ..Self::default()
        }
    }

    pub fn merged(&self) -> Vec<(String, String)> {
        self.merged.lock().unwrap().clone()
    }
}

impl Remuxer for FakeRemuxer {
    async fn merge(&self, video: &Path, audio: &Path, output: &Path) -> Result<ExitOutcome> {
        let video = std::fs::read_to_string(video)?;
        let audio = std::fs::read_to_string(audio)?;
        self.merged.lock().unwrap().push((video.clone(), audio.clone()));

        if self.missing {
            return Ok(ExitOutcome::ToolMissing);
        }

        if self.failing.contains(&video) {
            std::fs::write(output, b"truncated")?;
            return Ok(ExitOutcome::NonZeroExit {
                code: 1,
                stderr: String::from("Invalid data found when processing input"),
            });
        }

        std::fs::write(output, format!("{}+{}", video, audio))?;
        Ok(ExitOutcome::Success)
    }
}

pub type FakeOrchestrator = Orchestrator<FakeCatalog, FakeFetcher, FakeRemuxer>;

pub fn orchestrator(
    output_dir: &Path,
    catalog: FakeCatalog,
    fetcher: FakeFetcher,
    remuxer: FakeRemuxer,
) -> FakeOrchestrator {
    let config = OrchestratorConfig {
        output_dir: output_dir.to_path_buf(),
        ..OrchestratorConfig::default()
    };

    Orchestrator::new(catalog, fetcher, remuxer, config)
}

/// Every file in `dir`, by name, sorted.
pub fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

pub fn artifact(dir: &Path, base: &str) -> PathBuf {
    dir.join(format!("{}.mp4", base))
}
