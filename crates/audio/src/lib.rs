pub mod analysis;
pub mod class_map;
pub mod dsp;
pub mod io;
pub mod transcode;
pub mod yamnet;

pub use analysis::{ScoreMatrix, SoundClassifier, StaticClassifier};
pub use class_map::ClassMap;
pub use dsp::{downmix_to_mono, resample};
pub use io::{AudioDecoder, AudioReader};
pub use transcode::{FfmpegTranscoder, DEFAULT_TRANSCODE_TIMEOUT};
pub use yamnet::{YamnetClassifier, YAMNET_SAMPLE_RATE};
