//! Video search backends.
//!
//! The auto-curator builds playlists from keyword and channel searches
//! through the `SearchProvider` trait.

mod types;
mod youtube;

pub use types::{SearchError, SearchItem, SearchProvider, VIDEO_KIND};
pub use youtube::YoutubeSearchProvider;
