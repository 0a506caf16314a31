// Cough Detector Core
// Cough classification and batch cough segmentation over recorded audio

// Module declarations
pub mod analysis;
pub mod audio;
pub mod batch;
pub mod config;
pub mod error;

// Re-exports for convenience
pub use analysis::{classify_cough, segment_cough, CoughClassifier, Segmentation};
pub use audio::Waveform;
pub use config::CoughConfig;

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber for the command-line tools
///
/// Verbosity comes from `RUST_LOG` (default `info`). `log` records from the
/// library are forwarded through the subscriber's log bridge. Calling this
/// twice is harmless.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
