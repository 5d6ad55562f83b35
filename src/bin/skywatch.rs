//! Command-line entry point: load configuration, set up logging, run one
//! poll cycle. Scheduling is left to cron or a systemd timer.

use anyhow::Context;
use chrono::Utc;
use skywatch::audio::SoundLibrary;
use skywatch::exec::ShellRunner;
use skywatch::feed::NwsFeed;
use skywatch::{Engine, SkywatchConfig};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let path = config_path();
    let config = SkywatchConfig::load(&path)
        .with_context(|| format!("loading configuration from {}", path.display()))?;

    let _guard = init_logging(&config);

    let source = NwsFeed::new();
    let clips = SoundLibrary::new(&config.alerting.sounds_path);
    let runner = ShellRunner;
    Engine::new(&config, &source, &clips, &runner)
        .run_cycle(Utc::now())
        .context("poll cycle failed")?;

    Ok(())
}

/// Configuration file path: first argument, then the user config
/// directory, then the system-wide default.
fn config_path() -> PathBuf {
    if let Some(arg) = std::env::args().nth(1) {
        return PathBuf::from(arg);
    }
    if let Some(dir) = dirs::config_dir() {
        let candidate = dir.join("skywatch/skywatch.toml");
        if candidate.exists() {
            return candidate;
        }
    }
    PathBuf::from("/etc/skywatch.toml")
}

/// Install the tracing subscriber. `RUST_LOG` overrides the configured
/// level; the returned guard (when logging to a file) must stay alive for
/// the process lifetime.
fn init_logging(config: &SkywatchConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let default = if config.logging.debug {
        "skywatch=debug"
    } else {
        "skywatch=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    match &config.logging.path {
        Some(path) => {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let file = path
                .file_name()
                .unwrap_or_else(|| OsStr::new("skywatch.log"));
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file));
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}
