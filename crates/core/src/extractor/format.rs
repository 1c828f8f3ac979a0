//! Encoding selection.
//!
//! Only progressive mp4 encodings with AAC audio at 480p or 360p are
//! eligible. Among those the highest resolution wins, ties broken by the
//! highest audio bitrate.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Deserialize;

/// Resolutions (vertical lines) an encoding may have to be selected.
pub const PREFERRED_RESOLUTIONS: [u32; 2] = [480, 360];

/// Container an encoding must use to be selected.
pub const PREFERRED_CONTAINER: &str = "mp4";

static RESOLUTION_NOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{3,4})p").expect("valid resolution pattern"));

/// One available encoding of a source, as listed by yt-dlp.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaFormat {
    #[serde(default)]
    pub format_id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub ext: String,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub format_note: Option<String>,
    #[serde(default)]
    pub acodec: Option<String>,
    #[serde(default)]
    pub abr: Option<f64>,
}

impl MediaFormat {
    /// Vertical resolution, from `height` or a note such as "480p".
    pub fn resolution(&self) -> Option<u32> {
        self.height.or_else(|| {
            let note = self.format_note.as_deref()?;
            RESOLUTION_NOTE
                .captures(note)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse().ok())
        })
    }

    /// AAC is reported either as "aac" or by its codec string "mp4a.*".
    pub fn has_aac_audio(&self) -> bool {
        matches!(
            self.acodec.as_deref(),
            Some(codec) if codec == "aac" || codec.starts_with("mp4a")
        )
    }

    pub fn audio_bitrate(&self) -> f64 {
        self.abr.unwrap_or(0.0)
    }

    fn is_eligible(&self) -> bool {
        !self.url.is_empty()
            && self.ext == PREFERRED_CONTAINER
            && self.has_aac_audio()
            && self
                .resolution()
                .is_some_and(|r| PREFERRED_RESOLUTIONS.contains(&r))
    }
}

/// Pick the best eligible encoding, if any.
pub fn select_best_format(formats: &[MediaFormat]) -> Option<&MediaFormat> {
    formats
        .iter()
        .filter(|f| f.is_eligible())
        .max_by(|a, b| {
            a.resolution()
                .cmp(&b.resolution())
                .then(a.audio_bitrate().total_cmp(&b.audio_bitrate()))
        })
}
