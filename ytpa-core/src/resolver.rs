//! Playlist lookup, creation and existence probing.

use futures::TryStreamExt;
use tracing::{debug, error, info, warn};

use crate::contract::{FeedLocator, FeedSource, NewPlaylist, PlaylistRef, PlaylistWriter};
use crate::error::{AggregateError, RemoteError};
use crate::identifier::playlist_ref;
use crate::paginator::paginate;

/// Outcome of [`exists`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistStatus {
    Exists,
    NotExists,
    /// The probe failed for a reason that says nothing about existence.
    Unknown(RemoteError),
}

/// Find the playlist of `owner` whose title is exactly `name`.
///
/// Walks the owner's playlist listing page by page and stops at the first
/// match, so later pages are never fetched once a match is found. `Ok(None)`
/// means every page was read and nothing matched.
pub async fn resolve<S>(
    source: &S,
    owner: &str,
    name: &str,
) -> Result<Option<PlaylistRef>, AggregateError>
where
    S: FeedSource,
{
    debug!(owner, name, "Resolving playlist by name");
    let mut playlists = paginate(source, FeedLocator::PlaylistsOf(owner.to_owned()));

    while let Some(entry) = playlists.try_next().await? {
        if entry.title.as_deref() == Some(name) {
            let playlist = playlist_ref(&entry.id)?;
            info!(owner, name, playlist = %playlist, "Resolved playlist");
            return Ok(Some(playlist));
        }
    }

    info!(owner, name, "No playlist with this name");
    Ok(None)
}

/// Create a playlist for the authenticated account.
///
/// Does not check for an existing playlist of the same name first; callers
/// that care must [`resolve`] before.
pub async fn create<W>(
    writer: &W,
    name: &str,
    description: Option<&str>,
) -> Result<PlaylistRef, AggregateError>
where
    W: PlaylistWriter,
{
    info!(name, "Creating playlist");
    match writer
        .create_playlist(NewPlaylist { name, description })
        .await
    {
        Ok(uri) => {
            let playlist = playlist_ref(&uri)?;
            info!(name, playlist = %playlist, "Created playlist");
            Ok(playlist)
        }
        Err(RemoteError::Conflict(message)) => {
            warn!(name, message = %message, "Playlist already exists");
            Err(AggregateError::AlreadyExists {
                name: name.to_owned(),
            })
        }
        Err(e) => {
            error!(name, error = %e, "Playlist creation failed");
            Err(AggregateError::CreatePlaylist {
                name: name.to_owned(),
                source: e,
            })
        }
    }
}

/// Probe whether `playlist` can still be read.
///
/// Only a not-found answer from the service counts as [`PlaylistStatus::NotExists`];
/// transport failures, auth problems and server errors are
/// [`PlaylistStatus::Unknown`].
pub async fn exists<S>(source: &S, playlist: &PlaylistRef) -> PlaylistStatus
where
    S: FeedSource,
{
    let status = match source
        .fetch_page(&FeedLocator::PlaylistVideos(playlist.clone()))
        .await
    {
        Ok(_) => PlaylistStatus::Exists,
        Err(e) if e.is_not_found() => PlaylistStatus::NotExists,
        Err(e) => PlaylistStatus::Unknown(e),
    };
    debug!(playlist = %playlist, ?status, "Probed playlist");
    status
}
