//! Post-processing of finished captures: transcode, tag, embed art, clean up

pub mod artwork;
pub mod consumer;
pub mod job;
pub mod tagger;
pub mod transcoder;

pub use artwork::{ArtworkFetcher, CoverArt};
pub use consumer::{Consumer, ConversionPipeline, JobOutcome};
pub use job::ConversionJob;
pub use transcoder::{FfmpegTranscoder, Transcoder};
