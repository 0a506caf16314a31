// Analysis module - DSP pipelines for cough classification and segmentation
//
// Two independent consumers of a Waveform:
// - Classification: preprocess -> FeatureExtractor -> StandardScaler -> BoostedTrees
// - Segmentation: hysteresis thresholds on the raw signal's instantaneous power
//
// Module organization:
// - filter: Butterworth / Chebyshev I design and zero-phase filtering
// - preprocess: normalization, low-pass, decimation
// - features: the fixed-order acoustic feature vector
// - model / scaler: loaded training artifacts
// - classifier: fail-closed classifier adapter
// - segmenter: cough segment detection

pub mod classifier;
pub mod features;
pub mod filter;
pub mod model;
pub mod preprocess;
pub mod scaler;
pub mod segmenter;

pub use classifier::{classify_cough, CoughClassifier};
pub use features::{FeatureExtractor, FeatureGroup, FeatureVector};
pub use model::BoostedTrees;
pub use preprocess::preprocess;
pub use scaler::StandardScaler;
pub use segmenter::{segment_cough, CoughSegment, Segmentation};
