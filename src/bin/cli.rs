use clap::Parser;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;
use log::{LevelFilter, error, info};
use std::path::PathBuf;
use ytmux::config::Config;
use ytmux::error::Error;
use ytmux::model::Container;
use ytmux::orchestrator::Source;
use ytmux::{DownloadOptions, Finished, download};

#[derive(Parser, Clone)]
#[command(version, about)]
pub struct Cli {
    /// A video or playlist URL, or a bare video ID.
    pub url: String,

    #[arg(long = "output-dir", short)]
    pub output_dir: Option<PathBuf>,

    #[arg(long = "ffmpeg")]
    pub ffmpeg: Option<PathBuf>,

    #[arg(long = "max-height")]
    pub max_height: Option<u32>,

    #[arg(long = "retries", short)]
    pub retries: Option<u32>,

    #[arg(
        long = "format",
        short,
        value_parser = clap::builder::PossibleValuesParser::new(["mp4", "webm"])
    )]
    pub format: Option<String>,

    /// Read settings from this file instead of the default config file.
    #[arg(long = "config", short)]
    pub config: Option<PathBuf>,

    #[arg(
        long = "verbosity",
        short,
        default_value = "info",
        value_parser = clap::builder::PossibleValuesParser::new([
            "info", "debug", "error", "none", "full"
        ])
    )]
    pub verbosity: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Cli::parse();
    let progress = init_logging(&args.verbosity);

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(),
    };
    apply_overrides(&mut config, &args);

    let options = DownloadOptions {
        url: args.url,
        config,
    };

    match download(options, progress).await {
        Ok(Finished::Video(acquisition)) => match acquisition.source {
            Source::Existing => info!("Already exists: {}", acquisition.path.display()),
            _ => info!("Saved: {}", acquisition.path.display()),
        },
        Ok(Finished::Playlist(report)) => {
            info!("Finished {} videos: {}", report.total(), report);
            for (id, reason) in &report.failed {
                error!("{}: {}", id, reason);
            }
        }
        Err(e @ Error::InvalidUrl(_)) => return Err(e.into()),
        Err(e) => error!("[{}] {}", e.kind(), e),
    }

    Ok(())
}

fn apply_overrides(config: &mut Config, args: &Cli) {
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(ffmpeg) = &args.ffmpeg {
        config.ffmpeg = ffmpeg.clone();
    }
    if let Some(height) = args.max_height {
        config.max_height = height;
    }
    if let Some(retries) = args.retries {
        config.retry_attempts = retries;
    }
    match args.format.as_deref() {
        Some("webm") => config.format = Container::Webm,
        Some("mp4") => config.format = Container::Mp4,
        _ => {}
    }
}

/// Sets up `env_logger` behind the progress bars. `RUST_LOG` overrides the verbosity flag.
fn init_logging(verbosity: &str) -> MultiProgress {
    let (global, own) = match verbosity {
        "none" => (LevelFilter::Off, LevelFilter::Off),
        "error" => (LevelFilter::Error, LevelFilter::Error),
        "debug" => (LevelFilter::Warn, LevelFilter::Debug),
        "full" => (LevelFilter::Trace, LevelFilter::Trace),
        _ => (LevelFilter::Warn, LevelFilter::Info),
    };

    let logger = env_logger::Builder::new()
        .filter_level(global)
        .filter_module("ytmux", own)
        .format_timestamp(None)
        .parse_default_env()
        .build();
    let level = logger.filter();

    let progress = MultiProgress::new();
    if LogWrapper::new(progress.clone(), logger).try_init().is_ok() {
        log::set_max_level(level);
    }

    progress
}
