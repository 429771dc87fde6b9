//! Aggregation driver: resolve or create the destination, then append every
//! video of every source to it.
//!
//! # Responsibilities
//! - Resolve the destination playlist by name under the authenticated account,
//!   creating it when it does not exist. This happens exactly once per run and
//!   before any append.
//! - Process sources strictly in the order given, and within a source append
//!   videos in feed order, one remote call at a time.
//! - Fail fast: the first error ends the run. Nothing is rolled back; the
//!   [`AggregateFailure`] carries the phase the run died in and a report of
//!   every append that did go through.
//!
//! Appends are not deduplicated. A video present in two sources (or already in
//! the destination) is appended again.
//!
//! # Navigation
//! - Main entrypoint: [`aggregate`]
//! - Supporting types: [`AggregateRequest`], [`AggregateReport`], [`RunPhase`].

use std::fmt;

use futures::stream::{BoxStream, TryStreamExt};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::contract::{FeedLocator, FeedSource, PlaylistRef, PlaylistWriter, VideoRef};
use crate::error::AggregateError;
use crate::reader::{videos_of_playlist, videos_of_user};
use crate::resolver::{self, PlaylistStatus};

/// Where videos come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Source {
    /// Every video uploaded by a user.
    User { username: String },
    /// A playlist addressed by owner and exact title.
    Playlist { owner: String, name: String },
    /// A playlist addressed by its identifier.
    PlaylistId { playlist: PlaylistRef },
}

impl Source {
    pub fn user(username: impl Into<String>) -> Self {
        Source::User {
            username: username.into(),
        }
    }

    pub fn playlist(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Source::Playlist {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn playlist_id(playlist: impl Into<String>) -> Self {
        Source::PlaylistId {
            playlist: PlaylistRef::new(playlist),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::User { username } => write!(f, "user {username}"),
            Source::Playlist { owner, name } => write!(f, "playlist {owner}/{name}"),
            Source::PlaylistId { playlist } => write!(f, "playlist id {playlist}"),
        }
    }
}

/// Everything one run needs to know.
#[derive(Debug, Clone)]
pub struct AggregateRequest {
    /// The authenticated account; the destination is looked up among its playlists.
    pub account: String,
    /// Title of the destination playlist.
    pub destination: String,
    /// Description used if the destination has to be created.
    pub description: Option<String>,
    pub sources: Vec<Source>,
}

/// Where a run is, or where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunPhase {
    ResolvingDestination,
    CreatingDestination,
    /// Opening source `index` (resolving it if it is addressed by name) or
    /// reading its next video.
    ProcessingSource { index: usize },
    /// Appending the `video`-th video of source `source`.
    AppendingVideo { source: usize, video: usize },
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::ResolvingDestination => f.write_str("resolving destination"),
            RunPhase::CreatingDestination => f.write_str("creating destination"),
            RunPhase::ProcessingSource { index } => write!(f, "processing source #{index}"),
            RunPhase::AppendingVideo { source, video } => {
                write!(f, "appending video #{video} of source #{source}")
            }
            RunPhase::Done => f.write_str("done"),
        }
    }
}

/// What a run did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregateReport {
    /// `None` only if the run failed before the destination was known.
    pub destination: Option<PlaylistRef>,
    /// Whether the destination was created by this run.
    pub created: bool,
    pub sources: Vec<SourceReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub source: Source,
    /// Videos appended from this source, in append order.
    pub appended: Vec<VideoRef>,
}

impl AggregateReport {
    /// Total number of successful appends.
    pub fn appended(&self) -> usize {
        self.sources.iter().map(|s| s.appended.len()).sum()
    }
}

/// A failed run: the error, the phase it happened in, and what was already done.
#[derive(Debug, Error)]
#[error("aggregation failed while {phase}: {error}")]
pub struct AggregateFailure {
    pub phase: RunPhase,
    #[source]
    pub error: AggregateError,
    /// Appends that succeeded before the failure. They stay on the remote side.
    pub partial: AggregateReport,
}

struct Run {
    phase: RunPhase,
    report: AggregateReport,
}

impl Run {
    fn enter(&mut self, phase: RunPhase) {
        debug!(from = %self.phase, to = %phase, "Run phase transition");
        self.phase = phase;
    }
}

/// Run one aggregation.
pub async fn aggregate<S, W>(
    source: &S,
    writer: &W,
    request: &AggregateRequest,
) -> Result<AggregateReport, AggregateFailure>
where
    S: FeedSource,
    W: PlaylistWriter,
{
    info!(
        destination = %request.destination,
        sources = request.sources.len(),
        "Starting aggregation"
    );

    let mut run = Run {
        phase: RunPhase::ResolvingDestination,
        report: AggregateReport::default(),
    };

    match drive(source, writer, request, &mut run).await {
        Ok(()) => {
            run.enter(RunPhase::Done);
            info!(
                destination = ?run.report.destination,
                created = run.report.created,
                appended = run.report.appended(),
                "Aggregation complete"
            );
            match serde_json::to_string(&run.report) {
                Ok(json) => debug!(report = %json, "Aggregation report"),
                Err(e) => error!(error = ?e, "Failed to serialize aggregation report"),
            }
            Ok(run.report)
        }
        Err(error) => {
            error!(
                phase = %run.phase,
                error = %error,
                appended = run.report.appended(),
                "Aggregation failed"
            );
            Err(AggregateFailure {
                phase: run.phase,
                error,
                partial: run.report,
            })
        }
    }
}

async fn drive<S, W>(
    source: &S,
    writer: &W,
    request: &AggregateRequest,
    run: &mut Run,
) -> Result<(), AggregateError>
where
    S: FeedSource,
    W: PlaylistWriter,
{
    let destination = match resolver::resolve(source, &request.account, &request.destination)
        .await?
    {
        Some(existing) => existing,
        None => {
            run.enter(RunPhase::CreatingDestination);
            let created = resolver::create(
                writer,
                &request.destination,
                request.description.as_deref(),
            )
            .await?;
            run.report.created = true;
            created
        }
    };
    info!(destination = %destination, created = run.report.created, "Destination ready");
    run.report.destination = Some(destination.clone());

    for (index, origin) in request.sources.iter().enumerate() {
        run.enter(RunPhase::ProcessingSource { index });
        info!(source = %origin, "Adding videos of source");

        let mut videos = open(source, origin).await?;
        run.report.sources.push(SourceReport {
            source: origin.clone(),
            appended: Vec::new(),
        });

        let mut position = 0;
        while let Some(video) = videos.try_next().await? {
            run.enter(RunPhase::AppendingVideo {
                source: index,
                video: position,
            });
            if let Err(e) = writer.append_video(&destination, &video).await {
                return Err(AggregateError::Append {
                    video,
                    playlist: destination,
                    source: e,
                });
            }
            debug!(video = %video, playlist = %destination, "Appended video");
            run.report.sources[index].appended.push(video);
            position += 1;
            // Reading the next video may fetch another page.
            run.enter(RunPhase::ProcessingSource { index });
        }

        info!(source = %origin, appended = position, "Finished source");
    }

    Ok(())
}

async fn open<'a, S>(
    source: &'a S,
    origin: &Source,
) -> Result<BoxStream<'a, Result<VideoRef, AggregateError>>, AggregateError>
where
    S: FeedSource,
{
    match origin {
        Source::User { username } => Ok(videos_of_user(source, username)),
        Source::Playlist { owner, name } => match resolver::resolve(source, owner, name).await? {
            Some(playlist) => Ok(videos_of_playlist(source, &playlist)),
            None => Err(AggregateError::SourcePlaylistNotFound(origin.clone())),
        },
        Source::PlaylistId { playlist } => match resolver::exists(source, playlist).await {
            PlaylistStatus::Exists => Ok(videos_of_playlist(source, playlist)),
            PlaylistStatus::NotExists => Err(AggregateError::SourcePlaylistNotFound(origin.clone())),
            PlaylistStatus::Unknown(cause) => Err(AggregateError::FeedFetch {
                locator: FeedLocator::PlaylistVideos(playlist.clone()),
                source: cause,
            }),
        },
    }
}
