//! # contract: capability interface between the engine and a remote service
//!
//! The engine never performs I/O on its own. Everything it needs from the video
//! platform is expressed by two traits:
//!
//! - [`FeedSource`]: fetch one page of a feed (uploads, playlist contents,
//!   a user's playlist listing, or an opaque next-page link).
//! - [`PlaylistWriter`]: create a playlist and append a video to one.
//!
//! ## Mocking & Testing
//! - Both traits are annotated for `mockall`; with the `test-export-mocks`
//!   feature the generated `MockFeedSource` / `MockPlaylistWriter` are exported
//!   for integration tests of this crate and its consumers.
//!
//! ## Type Sources
//! - [`VideoRef`] and [`PlaylistRef`] are opaque identifiers, normally produced
//!   by [`crate::identifier`] from a resource URI.
//! - [`Page`] and [`Entry`] are raw, transient feed data.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

#[allow(unused_imports)]
use mockall::{automock, predicate::*};

pub use crate::error::RemoteError;

/// Opaque identifier of a video on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VideoRef(String);

impl VideoRef {
    pub fn new(id: impl Into<String>) -> Self {
        VideoRef(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier of a playlist on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PlaylistRef(String);

impl PlaylistRef {
    pub fn new(id: impl Into<String>) -> Self {
        PlaylistRef(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaylistRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One raw feed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Fully-qualified resource URI of the video or playlist.
    pub id: String,
    /// Display name. Only playlist listings are expected to carry one.
    pub title: Option<String>,
}

/// A single page of a feed as returned by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub entries: Vec<Entry>,
    /// Opaque link to the following page, if any.
    pub next: Option<String>,
}

/// Addresses one page of a remote feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedLocator {
    /// First page of the videos uploaded by a user.
    Uploads(String),
    /// First page of the videos contained in a playlist.
    PlaylistVideos(PlaylistRef),
    /// First page of the playlists owned by a user.
    PlaylistsOf(String),
    /// A next-page link handed out by the service in an earlier page.
    Next(String),
}

impl fmt::Display for FeedLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedLocator::Uploads(user) => write!(f, "uploads of {user}"),
            FeedLocator::PlaylistVideos(playlist) => write!(f, "videos of playlist {playlist}"),
            FeedLocator::PlaylistsOf(owner) => write!(f, "playlists of {owner}"),
            FeedLocator::Next(uri) => write!(f, "next page {uri}"),
        }
    }
}

/// Represents the data needed to create a playlist for the authenticated account.
pub struct NewPlaylist<'a> {
    /// Human-readable playlist title.
    pub name: &'a str,
    /// Optional playlist description.
    pub description: Option<&'a str>,
}

/// Trait for reading pages of remote feeds.
///
/// Implementors fetch exactly the page the locator addresses; following
/// next links is the job of [`crate::paginator`].
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch a single page.
    async fn fetch_page(&self, locator: &FeedLocator) -> Result<Page, RemoteError>;
}

/// Trait for mutating playlists owned by the authenticated account.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PlaylistWriter: Send + Sync {
    /// Create a playlist and return the resource URI of the new playlist.
    ///
    /// Implementors must report a duplicate-name rejection as
    /// [`RemoteError::Conflict`].
    async fn create_playlist<'a>(&self, req: NewPlaylist<'a>) -> Result<String, RemoteError>;

    /// Append one video to the end of a playlist.
    async fn append_video(
        &self,
        playlist: &PlaylistRef,
        video: &VideoRef,
    ) -> Result<(), RemoteError>;
}
