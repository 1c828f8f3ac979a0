//! Transcoder module for pushing media to output sinks.
//!
//! Provides the `Transcoder` trait and an FFmpeg implementation that remuxes
//! (`-c copy`) either a remote playable URL or a cached file to a sink in
//! real time (`-re`). Each call blocks for the duration of the media.

mod config;
mod error;
mod ffmpeg;
mod traits;

pub use config::TranscoderConfig;
pub use error::TranscoderError;
pub use ffmpeg::FfmpegTranscoder;
pub use traits::Transcoder;
