//! Source extraction.
//!
//! An `Extractor` turns a page URL (e.g. a YouTube watch link) into a URL
//! that ffmpeg or an HTTP client can read directly.

mod format;
mod types;
mod ytdlp;

pub use format::{select_best_format, MediaFormat, PREFERRED_CONTAINER, PREFERRED_RESOLUTIONS};
pub use types::{Extractor, ExtractorConfig, ExtractorError, ResolvedStream};
pub use ytdlp::YtDlpExtractor;
