use crate::catalog::StreamCatalog;
use crate::error::Result;
use crate::model::{Container, PlaylistEntry, PlaylistInfo, TrackDescriptor, TrackKind, VideoInfo};
use rustypipe::client::RustyPipe;
use rustypipe::model::{AudioFormat, AudioStream, VideoFormat, VideoStream};

/// The YouTube catalog, backed by rustypipe.
pub struct YoutubeCatalog {
    client: RustyPipe,
}

impl YoutubeCatalog {
    pub fn new() -> Self {
        Self {
            client: RustyPipe::new(),
        }
    }
}

impl Default for YoutubeCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn video_container(format: &VideoFormat) -> Option<Container> {
    match format {
        VideoFormat::Mp4 => Some(Container::Mp4),
        VideoFormat::Webm => Some(Container::Webm),
        _ => None,
    }
}

fn audio_container(format: &AudioFormat) -> Option<Container> {
    match format {
        AudioFormat::M4a => Some(Container::Mp4),
        AudioFormat::Webm => Some(Container::Webm),
        #[allow(unreachable_patterns)]
        _ => None,
    }
}

fn video_track(stream: &VideoStream, kind: TrackKind) -> Option<TrackDescriptor> {
    Some(TrackDescriptor {
        itag: stream.itag,
        container: video_container(&stream.format)?,
        kind,
        height: Some(stream.height),
        bitrate: stream.bitrate,
        size: stream.size.into(),
        url: stream.url.clone(),
    })
}

fn audio_track(stream: &AudioStream) -> Option<TrackDescriptor> {
    Some(TrackDescriptor {
        itag: stream.itag,
        container: audio_container(&stream.format)?,
        kind: TrackKind::AudioOnly,
        height: None,
        bitrate: stream.bitrate,
        size: stream.size.into(),
        url: stream.url.clone(),
    })
}

impl StreamCatalog for YoutubeCatalog {
    async fn video_info(&self, video_id: &str) -> Result<VideoInfo> {
        log::debug!("Querying player for {}", video_id);
        let player = self.client.query().player(video_id).await?;

        let tracks: Vec<TrackDescriptor> = player
            .video_only_streams
            .iter()
            .filter_map(|s| video_track(s, TrackKind::VideoOnly))
            .chain(
                player
                    .video_streams
                    .iter()
                    .filter_map(|s| video_track(s, TrackKind::Combined)),
            )
            .chain(player.audio_streams.iter().filter_map(audio_track))
            .collect();

        log::debug!("{} tracks available for {}", tracks.len(), video_id);

        Ok(VideoInfo {
            id: player.details.id.clone(),
            title: player.details.name.clone().unwrap_or_default(),
            tracks,
        })
    }

    async fn playlist(&self, playlist_id: &str) -> Result<PlaylistInfo> {
        log::debug!("Querying playlist {}", playlist_id);
        let mut playlist = self.client.query().playlist(playlist_id).await?;
        playlist
            .videos
            .extend_pages(&self.client.query(), usize::MAX)
            .await?;

        let entries = playlist
            .videos
            .items
            .iter()
            .map(|video| PlaylistEntry {
                id: video.id.clone(),
                title: video.name.clone(),
            })
            .collect();

        Ok(PlaylistInfo {
            id: playlist.id.clone(),
            title: playlist.name.clone(),
            entries,
        })
    }
}
