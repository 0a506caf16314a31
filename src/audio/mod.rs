// Audio module - waveform container, file I/O and sample rate conversion

pub mod io;
pub mod resample;
mod waveform;

// Re-export commonly used types for convenience
pub use io::{load_resampled, read_audio, write_wav};
pub use resample::resample;
pub use waveform::Waveform;
