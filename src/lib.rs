//! DualCast - concurrent multi-screen recording, bundled into one download.
//!
//! This crate orchestrates any number of independent screen-capture sessions
//! through a shared recording lifecycle, joins their asynchronously resolving
//! stop completions, and feeds the collected recordings through a sequential
//! transcode-and-archive pipeline. Device access, transcoding and archiving
//! sit behind traits; FFmpeg- and zip-backed implementations are provided.

pub mod capture;
pub mod export;
pub mod recorder;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging for binaries embedding the recorder.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dualcast=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
