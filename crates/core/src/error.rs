//! Errors raised by external helper processes and transfers.

use thiserror::Error;

use crate::extractor::ExtractorError;
use crate::transcoder::TranscoderError;
use crate::transfer::TransferError;

/// A failure of one of the external collaborators while handling one entry.
///
/// These never stop a playback loop or a downloader; the entry is skipped.
#[derive(Debug, Error)]
pub enum ExternalProcessError {
    #[error("transcoder: {0}")]
    Transcoder(#[from] TranscoderError),

    #[error("extractor: {0}")]
    Extractor(#[from] ExtractorError),

    #[error("transfer: {0}")]
    Transfer(#[from] TransferError),
}

impl From<std::io::Error> for ExternalProcessError {
    fn from(err: std::io::Error) -> Self {
        Self::Transfer(TransferError::Io(err))
    }
}
