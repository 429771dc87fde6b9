//! Extraction of canonical identifiers from resource URIs.

use lazy_static::lazy_static;
use regex::Regex;

use crate::contract::{PlaylistRef, VideoRef};
use crate::error::AggregateError;

lazy_static! {
    static ref RESOURCE_ID: Regex =
        Regex::new(r"/([A-Za-z0-9_-]+)$").expect("resource id pattern is valid");
}

/// Return the trailing identifier segment of `uri`.
///
/// The segment must consist of `[A-Za-z0-9_-]` only and directly follow the
/// last `/`; anything else is [`AggregateError::MalformedUri`].
pub fn extract_id(uri: &str) -> Result<&str, AggregateError> {
    RESOURCE_ID
        .captures(uri)
        .and_then(|captures| captures.get(1))
        .map(|segment| segment.as_str())
        .ok_or_else(|| AggregateError::MalformedUri {
            uri: uri.to_owned(),
        })
}

pub fn video_ref(uri: &str) -> Result<VideoRef, AggregateError> {
    extract_id(uri).map(VideoRef::new)
}

pub fn playlist_ref(uri: &str) -> Result<PlaylistRef, AggregateError> {
    extract_id(uri).map(PlaylistRef::new)
}
