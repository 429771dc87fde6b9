//! Video source readers: the uploads of a user and the contents of a playlist.
//!
//! Both readers page through the whole feed and yield video identifiers in feed
//! order. An entry whose URI carries no identifier ends the stream with
//! [`AggregateError::MalformedUri`].

use futures::stream::{BoxStream, StreamExt};
use tracing::info;

use crate::contract::{Entry, FeedLocator, FeedSource, PlaylistRef, VideoRef};
use crate::error::AggregateError;
use crate::identifier::video_ref;
use crate::paginator::paginate;

/// All videos uploaded by `username`.
pub fn videos_of_user<'a, S>(
    source: &'a S,
    username: &str,
) -> BoxStream<'a, Result<VideoRef, AggregateError>>
where
    S: FeedSource,
{
    info!(user = username, "Reading uploads of user");
    to_videos(paginate(source, FeedLocator::Uploads(username.to_owned())))
}

/// All videos contained in `playlist`, across every page of its feed.
pub fn videos_of_playlist<'a, S>(
    source: &'a S,
    playlist: &PlaylistRef,
) -> BoxStream<'a, Result<VideoRef, AggregateError>>
where
    S: FeedSource,
{
    info!(playlist = %playlist, "Reading videos of playlist");
    to_videos(paginate(
        source,
        FeedLocator::PlaylistVideos(playlist.clone()),
    ))
}

fn to_videos<'a>(
    entries: BoxStream<'a, Result<Entry, AggregateError>>,
) -> BoxStream<'a, Result<VideoRef, AggregateError>> {
    entries
        .map(|entry| entry.and_then(|entry| video_ref(&entry.id)))
        .boxed()
}
