//! Tools for fetching track bytes to disk.
//!
//! [`TrackFetcher`] is the seam the orchestrator downloads through, [`HttpFetcher`] its
//! production implementation, and [`DownloadJob`] the bounded-retry wrapper around a single fetch.

use crate::error::{Error, Result};
use crate::model::TrackDescriptor;
use crate::utils::file_system;
use futures_util::StreamExt;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use reqwest::header::RANGE;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// The default number of attempts of a [`DownloadJob`].
pub const DEFAULT_ATTEMPTS: u32 = 3;

/// YouTube throttles large unranged requests, so known-size tracks are fetched in chunks.
const DEFAULT_CHUNK_SIZE: u64 = 10 * 1024 * 1024;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Retrieves the bytes of a track to a local path.
#[allow(async_fn_in_trait)]
pub trait TrackFetcher {
    /// Fetches `track` into `destination`, replacing any previous content.
    /// Returns the number of bytes written.
    async fn fetch(&self, track: &TrackDescriptor, destination: &Path) -> Result<u64>;
}

/// Fetches tracks over HTTP, showing a progress bar per download.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    progress: MultiProgress,
    chunk_size: u64,
}

impl HttpFetcher {
    /// Creates a new fetcher drawing its progress bars on `progress`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the HTTP client could not be built.
    pub fn new(progress: MultiProgress) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            progress,
            chunk_size: DEFAULT_CHUNK_SIZE,
        })
    }

    /// Configures the size of each ranged request in bytes.
    pub fn with_chunk_size(mut self, size: u64) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    fn progress_bar(&self, track: &TrackDescriptor, destination: &Path) -> ProgressBar {
        let name = destination
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| track.quality_label());

        let bar = match track.size {
            Some(size) => {
                let style = ProgressStyle::with_template(
                    "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-");
                ProgressBar::new(size).with_style(style)
            }
            None => {
                let style =
                    ProgressStyle::with_template("{spinner} {msg} {bytes} ({bytes_per_sec})")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner());
                ProgressBar::new_spinner().with_style(style)
            }
        };

        let bar = self.progress.add(bar);
        bar.set_message(name);
        bar
    }

    /// Streams one response body into `file`, returning the number of bytes written.
    async fn stream_body(
        &self,
        response: reqwest::Response,
        file: &mut tokio::fs::File,
        bar: &ProgressBar,
    ) -> Result<u64> {
        let mut written = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
            bar.inc(chunk.len() as u64);
        }

        Ok(written)
    }

    async fn fetch_ranged(
        &self,
        url: &str,
        total: u64,
        file: &mut tokio::fs::File,
        bar: &ProgressBar,
    ) -> Result<u64> {
        let mut position = 0;

        while position < total {
            let end = (position + self.chunk_size).min(total) - 1;
            log::debug!("Requesting bytes {}-{} of {}", position, end, total);

            let response = self
                .client
                .get(url)
                .header(RANGE, format!("bytes={}-{}", position, end))
                .send()
                .await?
                .error_for_status()?;

            if response.status() != reqwest::StatusCode::PARTIAL_CONTENT && position > 0 {
                return Err(Error::Http(format!(
                    "Range request answered with {}",
                    response.status()
                )));
            }

            let written = self.stream_body(response, file, bar).await?;
            if written == 0 {
                return Err(Error::Http(format!(
                    "Empty response at byte {} of {}",
                    position, total
                )));
            }

            position += written;
        }

        Ok(position)
    }

    async fn fetch_whole(
        &self,
        url: &str,
        file: &mut tokio::fs::File,
        bar: &ProgressBar,
    ) -> Result<u64> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        self.stream_body(response, file, bar).await
    }
}

impl TrackFetcher for HttpFetcher {
    async fn fetch(&self, track: &TrackDescriptor, destination: &Path) -> Result<u64> {
        log::debug!("Fetching {} to {}", track, destination.display());

        file_system::create_parent_dir(destination)?;
        let mut file = tokio::fs::File::create(destination).await?;
        let bar = self.progress_bar(track, destination);

        let result = match track.size {
            Some(total) if total > 0 => self.fetch_ranged(&track.url, total, &mut file, &bar).await,
            _ => self.fetch_whole(&track.url, &mut file, &bar).await,
        };
        bar.finish_and_clear();

        let written = result?;
        file.flush().await?;
        Ok(written)
    }
}

/// How a [`DownloadJob`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The job has not run yet.
    Pending,
    /// The track was written, with this many bytes.
    Downloaded(u64),
    /// Every attempt failed, the last one with this message.
    Failed(String),
}

/// One track to be written to one destination, with bounded retry.
///
/// # Example
///
/// ```rust,no_run
/// # use ytmux::fetcher::{DownloadJob, HttpFetcher};
/// # use ytmux::model::TrackDescriptor;
/// # async fn run(track: &TrackDescriptor) -> ytmux::error::Result<()> {
/// let fetcher = HttpFetcher::new(indicatif::MultiProgress::new())?;
///
/// let mut job = DownloadJob::new(track, "output/title_audio.mp4");
/// job.run(&fetcher, 3).await?;
/// println!("Downloaded after {} attempts", job.attempts);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DownloadJob<'a> {
    /// The track to fetch.
    pub track: &'a TrackDescriptor,
    /// Where the track is written.
    pub destination: PathBuf,
    /// The number of attempts made so far.
    pub attempts: u32,
    /// How the job ended.
    pub outcome: JobOutcome,
}

impl fmt::Display for DownloadJob<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DownloadJob({} -> {})", self.track, self.destination.display())
    }
}

impl<'a> DownloadJob<'a> {
    /// Creates a pending job.
    pub fn new(track: &'a TrackDescriptor, destination: impl Into<PathBuf>) -> Self {
        Self {
            track,
            destination: destination.into(),
            attempts: 0,
            outcome: JobOutcome::Pending,
        }
    }

    /// Fetches the track, trying up to `max_attempts` times.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FetchExhausted`] wrapping the last failure once every attempt failed.
    pub async fn run(&mut self, fetcher: &impl TrackFetcher, max_attempts: u32) -> Result<PathBuf> {
        let max_attempts = max_attempts.max(1);
        let name = display_name(&self.destination);

        loop {
            self.attempts += 1;
            log::info!(
                "Starting download ({}/{}) -> {}",
                self.attempts,
                max_attempts,
                name
            );

            match fetcher.fetch(self.track, &self.destination).await {
                Ok(bytes) => {
                    self.outcome = JobOutcome::Downloaded(bytes);
                    return Ok(self.destination.clone());
                }
                Err(e) => {
                    log::warn!(
                        "Download error ({}/{}) for {}: {}",
                        self.attempts,
                        max_attempts,
                        name,
                        e
                    );

                    if self.attempts >= max_attempts {
                        self.outcome = JobOutcome::Failed(e.to_string());
                        return Err(Error::FetchExhausted {
                            track: self.track.to_string(),
                            attempts: self.attempts,
                            source: Box::new(e),
                        });
                    }
                }
            }
        }
    }
}

/// Downloads `track` to `destination` with up to `max_attempts` attempts.
pub async fn download_with_retry(
    fetcher: &impl TrackFetcher,
    track: &TrackDescriptor,
    destination: &Path,
    max_attempts: u32,
) -> Result<PathBuf> {
    DownloadJob::new(track, destination)
        .run(fetcher, max_attempts)
        .await
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Container, TrackKind};
    use indicatif::ProgressDrawTarget;
    use std::sync::{Arc, Mutex};
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    /// Fails a fixed number of times before writing the track URL as content.
    struct FlakyFetcher {
        failures_left: Mutex<u32>,
        calls: Mutex<u32>,
    }

    impl FlakyFetcher {
        fn new(failures: u32) -> Self {
            Self {
                failures_left: Mutex::new(failures),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    impl TrackFetcher for FlakyFetcher {
        async fn fetch(&self, track: &TrackDescriptor, destination: &Path) -> Result<u64> {
            *self.calls.lock().unwrap() += 1;
            {
                let mut left = self.failures_left.lock().unwrap();
                if *left > 0 {
                    *left -= 1;
                    return Err(Error::Http(String::from("connection reset")));
                }
            }

            std::fs::write(destination, track.url.as_bytes())?;
            Ok(track.url.len() as u64)
        }
    }

    fn track() -> TrackDescriptor {
        TrackDescriptor {
            itag: 140,
            container: Container::Mp4,
            kind: TrackKind::AudioOnly,
            height: None,
            bitrate: 129_000,
            size: None,
            url: String::from("audio-140"),
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("t_audio.mp4");
        let fetcher = FlakyFetcher::new(2);
        let track = track();

        let mut job = DownloadJob::new(&track, &destination);
        let path = job.run(&fetcher, DEFAULT_ATTEMPTS).await.unwrap();

        assert_eq!(path, destination);
        assert_eq!(job.attempts, 3);
        assert_eq!(job.outcome, JobOutcome::Downloaded(9));
        assert_eq!(std::fs::read_to_string(&destination).unwrap(), "audio-140");
    }

    #[tokio::test]
    async fn gives_up_after_the_last_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("t_audio.mp4");
        let fetcher = FlakyFetcher::new(10);
        let track = track();

        let mut job = DownloadJob::new(&track, &destination);
        let err = job.run(&fetcher, DEFAULT_ATTEMPTS).await.unwrap_err();

        assert!(matches!(err, Error::FetchExhausted { attempts: 3, .. }));
        assert_eq!(fetcher.calls(), 3);
        assert!(matches!(job.outcome, JobOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FlakyFetcher::new(0);
        let track = track();

        download_with_retry(&fetcher, &track, &dir.path().join("a.mp4"), 0)
            .await
            .unwrap();

        assert_eq!(fetcher.calls(), 1);
    }

    const BODY: &[u8] = b"0123456789";

    /// How the local server answers ranged requests after the first one.
    #[derive(Clone, Copy)]
    enum Serve {
        Ranges,
        FullAfterFirst,
        EmptyAfterFirst,
    }

    fn parse_range(value: &str) -> Option<(usize, usize)> {
        let (start, end) = value.strip_prefix("bytes=")?.split_once('-')?;
        Some((start.parse().ok()?, end.parse().ok()?))
    }

    /// Serves `BODY` on a local port, recording the `Range` header of every request.
    async fn serve(mode: Serve) -> (String, Arc<Mutex<Vec<Option<String>>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/track", listener.local_addr().unwrap());
        let ranges = Arc::new(Mutex::new(Vec::new()));
        let seen = ranges.clone();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = socket.read(&mut buf).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..n]);
                }

                let request = String::from_utf8_lossy(&request).to_string();
                let range = request.lines().find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("range").then(|| value.trim().to_string())
                });
                let count = {
                    let mut seen = seen.lock().unwrap();
                    seen.push(range.clone());
                    seen.len()
                };

                let (status, content) = match (mode, range.as_deref().and_then(parse_range)) {
                    (Serve::Ranges, Some((start, end))) => {
                        ("206 Partial Content", &BODY[start..=end])
                    }
                    (_, Some((start, end))) if count == 1 => {
                        ("206 Partial Content", &BODY[start..=end])
                    }
                    (Serve::EmptyAfterFirst, Some(_)) => ("206 Partial Content", &BODY[..0]),
                    _ => ("200 OK", BODY),
                };

                let head = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    status,
                    content.len()
                );
                socket.write_all(head.as_bytes()).await.unwrap();
                socket.write_all(content).await.unwrap();
                socket.shutdown().await.ok();
            }
        });

        (url, ranges)
    }

    fn remote_track(url: String, size: Option<u64>) -> TrackDescriptor {
        TrackDescriptor {
            url,
            size,
            ..track()
        }
    }

    fn http_fetcher() -> HttpFetcher {
        let progress = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        HttpFetcher::new(progress).unwrap().with_chunk_size(4)
    }

    #[tokio::test]
    async fn known_sizes_are_fetched_in_sequential_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("t_video.mp4");
        let (url, ranges) = serve(Serve::Ranges).await;

        let written = http_fetcher()
            .fetch(&remote_track(url, Some(10)), &destination)
            .await
            .unwrap();

        assert_eq!(written, 10);
        assert_eq!(std::fs::read(&destination).unwrap(), BODY);
        assert_eq!(
            *ranges.lock().unwrap(),
            vec![
                Some(String::from("bytes=0-3")),
                Some(String::from("bytes=4-7")),
                Some(String::from("bytes=8-9")),
            ]
        );
    }

    #[tokio::test]
    async fn unknown_sizes_are_fetched_in_one_request() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("t_video.mp4");
        let (url, ranges) = serve(Serve::Ranges).await;

        let written = http_fetcher()
            .fetch(&remote_track(url, None), &destination)
            .await
            .unwrap();

        assert_eq!(written, 10);
        assert_eq!(std::fs::read(&destination).unwrap(), BODY);
        assert_eq!(*ranges.lock().unwrap(), vec![None]);
    }

    #[tokio::test]
    async fn later_chunk_without_partial_content_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let (url, ranges) = serve(Serve::FullAfterFirst).await;

        let err = http_fetcher()
            .fetch(&remote_track(url, Some(10)), &dir.path().join("t_video.mp4"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Http(_)));
        assert_eq!(ranges.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn empty_chunk_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let (url, ranges) = serve(Serve::EmptyAfterFirst).await;

        let err = http_fetcher()
            .fetch(&remote_track(url, Some(10)), &dir.path().join("t_video.mp4"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Http(_)));
        assert_eq!(ranges.lock().unwrap().len(), 2);
    }
}
