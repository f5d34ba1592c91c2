//! Acquisition of one video: pick tracks, download them, merge, clean up.
//!
//! Two strategies exist side by side. [`Orchestrator::acquire`] walks a ladder of adaptive video
//! candidates capped at a maximum height and falls back to a progressive track. The playlist
//! walker uses [`Orchestrator::acquire_best_pair`], which takes the single best adaptive pair with
//! neither cap nor fallback.

use crate::catalog::StreamCatalog;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::executor::ExitOutcome;
use crate::fetcher::{TrackFetcher, download_with_retry};
use crate::model::{Container, PlaylistEntry, QualityKey, TrackDescriptor, TrackKind, VideoInfo};
use crate::remux::Remuxer;
use crate::utils::file_system;
use log::{error, info, warn};
use std::fmt;
use std::path::{Path, PathBuf};

/// The settings an [`Orchestrator`] runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Where final artifacts and temporaries are written.
    pub output_dir: PathBuf,
    /// The container of every track and artifact.
    pub container: Container,
    /// The highest adaptive video height tried by the capped ladder.
    pub max_height: u32,
    /// How many times a single track fetch is attempted.
    pub retry_attempts: u32,
    /// The maximum length, in characters, of a file base name.
    pub max_title_len: usize,
}

impl From<&Config> for OrchestratorConfig {
    fn from(config: &Config) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            container: config.format,
            max_height: config.max_height,
            retry_attempts: config.retry_attempts,
            max_title_len: config.max_title_len,
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// The named acquisition strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Adaptive candidates up to the height cap, best first, then a progressive fallback.
    CappedLadder,
    /// The single best adaptive pair, without cap or fallback.
    BestPair,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::CappedLadder => write!(f, "capped ladder"),
            Strategy::BestPair => write!(f, "best pair"),
        }
    }
}

/// Where a final artifact came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// It was already on disk, nothing was done.
    Existing,
    /// An adaptive video track of this height was merged with the best audio track.
    Adaptive { height: u32 },
    /// A progressive track of this height was downloaded as is.
    Progressive { height: u32 },
}

/// The result of a successful acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acquisition {
    /// The final artifact.
    pub path: PathBuf,
    /// How it was obtained.
    pub source: Source,
}

/// The files used while acquiring one video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// The sanitized base name.
    pub base: String,
    /// `<base>.<ext>`, the final artifact.
    pub artifact: PathBuf,
    /// `<base>_video.<ext>`, the temporary video track.
    pub video: PathBuf,
    /// `<base>_audio.<ext>`, the temporary audio track.
    pub audio: PathBuf,
}

impl ArtifactPaths {
    /// Derives every path for a video titled `title`.
    pub fn new(output_dir: &Path, title: &str, container: Container, max_len: usize) -> Self {
        let base = file_system::sanitize_filename(title, max_len);
        let ext = container.extension();

        Self {
            artifact: output_dir.join(format!("{}.{}", base, ext)),
            video: output_dir.join(format!("{}_video.{}", base, ext)),
            audio: output_dir.join(format!("{}_audio.{}", base, ext)),
            base,
        }
    }
}

/// How one rung of the ladder ended.
enum Rung {
    Merged,
    Failed,
    ToolMissing,
}

/// Drives the catalog, the fetcher and the remuxer to produce final artifacts.
///
/// # Example
///
/// ```rust,no_run
/// # use ytmux::catalog::YoutubeCatalog;
/// # use ytmux::fetcher::HttpFetcher;
/// # use ytmux::orchestrator::{Orchestrator, OrchestratorConfig};
/// # use ytmux::remux::Ffmpeg;
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = HttpFetcher::new(indicatif::MultiProgress::new())?;
/// let orchestrator = Orchestrator::new(
///     YoutubeCatalog::new(),
///     fetcher,
///     Ffmpeg::default(),
///     OrchestratorConfig::default(),
/// );
///
/// let acquisition = orchestrator.acquire("bZObGhl7RAo").await?;
/// println!("Saved {}", acquisition.path.display());
/// # Ok(())
/// # }
/// ```
pub struct Orchestrator<C, F, R> {
    catalog: C,
    fetcher: F,
    remuxer: R,
    config: OrchestratorConfig,
}

impl<C, F, R> Orchestrator<C, F, R>
where
    C: StreamCatalog,
    F: TrackFetcher,
    R: Remuxer,
{
    pub fn new(catalog: C, fetcher: F, remuxer: R, config: OrchestratorConfig) -> Self {
        Self {
            catalog,
            fetcher,
            remuxer,
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn remuxer(&self) -> &R {
        &self.remuxer
    }

    /// The paths used for a video titled `title`.
    pub fn paths_for(&self, title: &str) -> ArtifactPaths {
        ArtifactPaths::new(
            &self.config.output_dir,
            title,
            self.config.container,
            self.config.max_title_len,
        )
    }

    /// Acquires a video with the [`Strategy::CappedLadder`] strategy.
    ///
    /// Returns immediately if the final artifact already exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Exhausted`] when neither the adaptive ladder nor the progressive fallback
    /// produced the artifact, or the catalog error if the video can't be looked up.
    pub async fn acquire(&self, video_id: &str) -> Result<Acquisition> {
        file_system::create_dir(&self.config.output_dir)?;

        let video = self.catalog.video_info(video_id).await?;
        info!("Title: {}", video.title);

        let paths = self.paths_for(&video.title);
        if paths.artifact.exists() {
            info!("Already exists: {}", paths.artifact.display());
            return Ok(Acquisition {
                path: paths.artifact,
                source: Source::Existing,
            });
        }

        info!(
            "Trying adaptive up to {}p ({})",
            self.config.max_height,
            Strategy::CappedLadder
        );
        match self.capped_adaptive(&video, &paths).await {
            Ok(Some(acquisition)) => return Ok(acquisition),
            Ok(None) => {}
            Err(e) => {
                warn!("Adaptive method overall failed: [{}] {}", e.kind(), e);
            }
        }

        info!("Falling back to progressive");
        self.progressive(&video, &paths).await.map_err(|e| {
            error!("Complete failure for {}: [{}] {}", video.id, e.kind(), e);
            Error::Exhausted(format!("{} ({}): {}", video.title, video.id, e))
        })
    }

    /// The adaptive ladder. `Ok(None)` means no candidate merged, an error means the shared
    /// audio track could not be fetched. Either way no temporary is left behind.
    async fn capped_adaptive(
        &self,
        video: &VideoInfo,
        paths: &ArtifactPaths,
    ) -> Result<Option<Acquisition>> {
        let candidates = video
            .query()
            .kind(TrackKind::VideoOnly)
            .container(self.config.container)
            .max_height(self.config.max_height)
            .order_by(QualityKey::Height)
            .desc()
            .all();

        if candidates.is_empty() {
            warn!("No adaptive video <= {}p found", self.config.max_height);
            return Ok(None);
        }

        info!(
            "Adaptive candidate resolutions: {:?}",
            candidates
                .iter()
                .map(|t| t.quality_label())
                .collect::<Vec<_>>()
        );

        let Some(audio) = self.best_audio(video) else {
            warn!("No adaptive audio found");
            return Ok(None);
        };

        info!("Downloading best audio once ({})", audio.quality_label());
        if let Err(e) =
            download_with_retry(&self.fetcher, audio, &paths.audio, self.config.retry_attempts)
                .await
        {
            file_system::remove_temp_file(&paths.audio).await;
            return Err(e);
        }

        for candidate in candidates {
            let height = candidate.height.unwrap_or_default();
            info!("Trying video at {}p", height);

            match self.ladder_rung(candidate, paths).await {
                Rung::Merged => {
                    file_system::remove_temp_file(&paths.video).await;
                    file_system::remove_temp_file(&paths.audio).await;
                    info!("Done (adaptive {}p): {}", height, paths.artifact.display());

                    return Ok(Some(Acquisition {
                        path: paths.artifact.clone(),
                        source: Source::Adaptive { height },
                    }));
                }
                Rung::Failed => continue,
                Rung::ToolMissing => {
                    warn!("Remuxer unavailable, no adaptive candidate can be merged");
                    break;
                }
            }
        }

        warn!("All adaptive candidates (<= {}p) failed", self.config.max_height);
        file_system::remove_temp_file(&paths.audio).await;

        Ok(None)
    }

    /// Downloads one video candidate and merges it with the already downloaded audio.
    /// Leaves no video temporary and no partial artifact behind unless it merged.
    async fn ladder_rung(&self, candidate: &TrackDescriptor, paths: &ArtifactPaths) -> Rung {
        let label = candidate.quality_label();

        if let Err(e) = download_with_retry(
            &self.fetcher,
            candidate,
            &paths.video,
            self.config.retry_attempts,
        )
        .await
        {
            warn!("Failed at {}: {}", label, e);
            file_system::remove_temp_file(&paths.video).await;
            return Rung::Failed;
        }

        info!("Merging {}", label);
        let rung = match self
            .remuxer
            .merge(&paths.video, &paths.audio, &paths.artifact)
            .await
        {
            Ok(ExitOutcome::Success) => return Rung::Merged,
            Ok(ExitOutcome::ToolMissing) => Rung::ToolMissing,
            Ok(ExitOutcome::NonZeroExit { code, stderr }) => {
                warn!("Failed at {}: remuxer exited with {}: {}", label, code, stderr);
                Rung::Failed
            }
            Err(e) => {
                warn!("Failed at {}: {}", label, e);
                Rung::Failed
            }
        };

        file_system::remove_temp_file(&paths.video).await;
        file_system::remove_temp_file(&paths.artifact).await;
        rung
    }

    /// Downloads the best progressive track straight to the artifact path.
    async fn progressive(&self, video: &VideoInfo, paths: &ArtifactPaths) -> Result<Acquisition> {
        let track = video
            .query()
            .kind(TrackKind::Combined)
            .container(self.config.container)
            .order_by(QualityKey::Height)
            .desc()
            .first()
            .ok_or_else(|| {
                Error::NoMatchingTrack(format!("progressive {}", self.config.container))
            })?;

        info!("Fallback progressive stream: {}", track.quality_label());
        if let Err(e) = download_with_retry(
            &self.fetcher,
            track,
            &paths.artifact,
            self.config.retry_attempts,
        )
        .await
        {
            file_system::remove_temp_file(&paths.artifact).await;
            return Err(e);
        }

        info!("Done (progressive fallback): {}", paths.artifact.display());
        Ok(Acquisition {
            path: paths.artifact.clone(),
            source: Source::Progressive {
                height: track.height.unwrap_or_default(),
            },
        })
    }

    fn best_audio<'a>(&self, video: &'a VideoInfo) -> Option<&'a TrackDescriptor> {
        video
            .query()
            .kind(TrackKind::AudioOnly)
            .container(self.config.container)
            .order_by(QualityKey::Bitrate)
            .desc()
            .first()
    }

    /// Acquires a playlist entry with the [`Strategy::BestPair`] strategy.
    ///
    /// The artifact check uses the entry's title, so existing artifacts cost no catalog query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoMatchingTrack`] if there is no adaptive video or audio track, the fetch
    /// error if a download exhausted its attempts, or [`Error::Remux`] if the merge failed.
    pub async fn acquire_best_pair(&self, entry: &PlaylistEntry) -> Result<Acquisition> {
        file_system::create_dir(&self.config.output_dir)?;

        let paths = self.paths_for(&entry.title);
        if paths.artifact.exists() {
            info!("Already exists, skipping: {}", paths.artifact.display());
            return Ok(Acquisition {
                path: paths.artifact,
                source: Source::Existing,
            });
        }

        let video = self.catalog.video_info(&entry.id).await?;

        let video_track = video
            .query()
            .kind(TrackKind::VideoOnly)
            .container(self.config.container)
            .order_by(QualityKey::Height)
            .desc()
            .first()
            .ok_or_else(|| {
                Error::NoMatchingTrack(format!("adaptive {} video", self.config.container))
            })?;
        let audio_track = self.best_audio(&video).ok_or_else(|| {
            Error::NoMatchingTrack(format!("adaptive {} audio", self.config.container))
        })?;

        info!(
            "Video: {} | Audio: {} ({})",
            video_track.quality_label(),
            audio_track.quality_label(),
            Strategy::BestPair
        );

        let result = self.merge_pair(video_track, audio_track, &paths).await;
        file_system::remove_temp_file(&paths.video).await;
        file_system::remove_temp_file(&paths.audio).await;

        if result.is_err() {
            file_system::remove_temp_file(&paths.artifact).await;
        }
        result?;

        info!("Saved: {}", paths.artifact.display());
        Ok(Acquisition {
            path: paths.artifact,
            source: Source::Adaptive {
                height: video_track.height.unwrap_or_default(),
            },
        })
    }

    async fn merge_pair(
        &self,
        video_track: &TrackDescriptor,
        audio_track: &TrackDescriptor,
        paths: &ArtifactPaths,
    ) -> Result<()> {
        info!("Downloading video");
        download_with_retry(
            &self.fetcher,
            video_track,
            &paths.video,
            self.config.retry_attempts,
        )
        .await?;

        info!("Downloading audio");
        download_with_retry(
            &self.fetcher,
            audio_track,
            &paths.audio,
            self.config.retry_attempts,
        )
        .await?;

        info!("Merging");
        match self
            .remuxer
            .merge(&paths.video, &paths.audio, &paths.artifact)
            .await?
        {
            ExitOutcome::Success => Ok(()),
            ExitOutcome::ToolMissing => Err(Error::Remux(String::from("remuxer not found"))),
            ExitOutcome::NonZeroExit { code, stderr } => Err(Error::Remux(format!(
                "remuxer exited with {}: {}",
                code, stderr
            ))),
        }
    }
}
