use thiserror::Error;

use crate::aggregate::Source;
use crate::contract::{FeedLocator, PlaylistRef, VideoRef};

/// Failure reported by a [`crate::contract::FeedSource`] or
/// [`crate::contract::PlaylistWriter`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The service answered with a non-success status.
    #[error("request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
    /// The service refused to create something that already exists.
    #[error("conflict: {0}")]
    Conflict(String),
    /// The request never got a usable answer.
    #[error("transport error: {0}")]
    Transport(String),
    /// The answer could not be decoded.
    #[error("undecodable response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Whether the service said the addressed resource does not exist.
    ///
    /// The feed service answers 400 for syntactically invalid ids and 404 for
    /// unknown ones.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::Rejected { status: 400 | 404, .. })
    }
}

/// Errors of the aggregation engine.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("no resource identifier at the end of URI {uri:?}")]
    MalformedUri { uri: String },

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("failed to fetch {locator}: {source}")]
    FeedFetch {
        locator: FeedLocator,
        source: RemoteError,
    },

    #[error("playlist {name:?} already exists")]
    AlreadyExists { name: String },

    #[error("failed to create playlist {name:?}: {source}")]
    CreatePlaylist { name: String, source: RemoteError },

    #[error("failed to append video {video} to playlist {playlist}: {source}")]
    Append {
        video: VideoRef,
        playlist: PlaylistRef,
        source: RemoteError,
    },

    #[error("source {0} not found")]
    SourcePlaylistNotFound(Source),
}
