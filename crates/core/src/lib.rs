pub mod cache;
pub mod channel;
pub mod config;
pub mod curator;
pub mod downloader;
pub mod error;
pub mod extractor;
pub mod metrics;
pub mod orchestrator;
pub mod playback;
pub mod provider;
pub mod search;
pub mod supervisor;
pub mod testing;
pub mod transcoder;
pub mod transfer;

pub use cache::MediaCache;
pub use channel::{
    AutoSpec, Channel, ChannelId, ChannelSpec, ChannelSummary, Cue, MediaRef, Registry,
    StreamLink,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use curator::{AutoCurator, CuratorError};
pub use downloader::{DownloadOutcome, DownloadReport, Downloader};
pub use error::ExternalProcessError;
pub use extractor::{Extractor, ExtractorConfig, ExtractorError, ResolvedStream, YtDlpExtractor};
pub use orchestrator::{
    Collaborators, Orchestrator, OrchestratorConfig, OrchestratorError, OrchestratorStatus,
};
pub use playback::{PlaySource, PlaybackLoop};
pub use provider::{HttpSpecProvider, ProviderError, SpecProvider};
pub use search::{SearchError, SearchItem, SearchProvider, YoutubeSearchProvider};
pub use supervisor::{ShutdownSignal, Supervisor};
pub use transcoder::{FfmpegTranscoder, Transcoder, TranscoderConfig, TranscoderError};
pub use transfer::{ByteRateLimiter, HttpTransfer, Transfer, TransferError};
