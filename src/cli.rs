///
/// This module implements the CLI surface of ytpa: argument parsing, validation,
/// and the async entrypoint that wires configuration, the GData client and the
/// aggregation driver together.
///
/// All aggregation logic (resolving, paginating, appending) lives in the
/// [`ytpa-core`] crate. This module only translates flags into an
/// [`AggregateRequest`] and reports the outcome.
///
/// ## How To Use
/// - From a shell: `ytpa -u alice -p bob/Faves MyMix`
/// - Programmatically: call [`run`] with a constructed [`Cli`].
///
/// [`ytpa-core`]: ../../ytpa-core/
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};

use crate::client::GDataClient;
use crate::load_config::load_config;
use ytpa_core::aggregate::{aggregate, AggregateRequest, Source};

/// Adds the videos of YouTube users and playlists to one of your playlists.
#[derive(Parser, Debug)]
#[clap(
    name = "ytpa",
    version,
    about = "Aggregate the videos of YouTube users and playlists into one playlist"
)]
#[clap(group(
    ArgGroup::new("sources")
        .required(true)
        .multiple(true)
        .args(["username", "playlist", "playlist_id"])
))]
pub struct Cli {
    /// Add all uploads of this user (repeatable)
    #[clap(short = 'u', long = "username", value_name = "USERNAME")]
    pub username: Vec<String>,

    /// Add all videos of a named playlist (repeatable)
    #[clap(
        short = 'p',
        long = "playlist",
        value_name = "OWNER/NAME",
        value_parser = parse_playlist_source
    )]
    pub playlist: Vec<(String, String)>,

    /// Add all videos of a playlist given by its id (repeatable)
    #[clap(long = "playlist-id", value_name = "ID")]
    pub playlist_id: Vec<String>,

    /// Path to the YAML config file
    #[clap(long, default_value = "ytpa.yaml")]
    pub config: PathBuf,

    /// Description used if the destination playlist has to be created
    #[clap(long)]
    pub description: Option<String>,

    /// Playlist of yours receiving the videos; falls back to `default_destination`
    pub destination_playlist: Option<String>,
}

impl Cli {
    /// Sources in processing order: users, then named playlists, then playlist ids.
    pub fn sources(&self) -> Vec<Source> {
        let users = self.username.iter().map(Source::user);
        let playlists = self
            .playlist
            .iter()
            .map(|(owner, name)| Source::playlist(owner, name));
        let ids = self.playlist_id.iter().map(Source::playlist_id);
        users.chain(playlists).chain(ids).collect()
    }
}

/// Parses an `OWNER/NAME` playlist argument. The name may itself contain slashes.
pub fn parse_playlist_source(value: &str) -> Result<(String, String), String> {
    match value.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() => {
            Ok((owner.to_string(), name.to_string()))
        }
        _ => Err(format!(
            "expected OWNER/NAME with both parts non-empty, got {value:?}"
        )),
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    let config = load_config(&cli.config)?;

    let destination = match cli
        .destination_playlist
        .clone()
        .or_else(|| config.default_destination.clone())
    {
        Some(destination) => destination,
        None => {
            tracing::error!("No destination playlist given");
            anyhow::bail!(
                "No destination playlist: pass one as argument or set default_destination in {:?}",
                cli.config
            );
        }
    };

    let request = AggregateRequest {
        account: config.client.username.clone(),
        destination,
        description: cli.description.clone(),
        sources: cli.sources(),
    };
    tracing::info!(
        account = %request.account,
        destination = %request.destination,
        sources = request.sources.len(),
        command = "aggregate",
        "Request assembled from arguments"
    );

    let client = GDataClient::authenticate(config.client, &config.password)
        .await
        .context("Could not log in to YouTube")?;

    match aggregate(&client, &client, &request).await {
        Ok(report) => {
            tracing::info!(command = "aggregate", ?report, "Printing run summary");
            if let Some(destination) = &report.destination {
                let verb = if report.created { "created" } else { "updated" };
                println!("Playlist {:?} ({destination}) {verb}.", request.destination);
            }
            for source in &report.sources {
                println!("  {}: {} videos", source.source, source.appended.len());
            }
            println!("{} videos added.", report.appended());
            Ok(())
        }
        Err(failure) => {
            tracing::error!(
                phase = %failure.phase,
                error = %failure.error,
                appended = failure.partial.appended(),
                command = "aggregate",
                "Run ended with an error"
            );
            eprintln!(
                "[ERROR] {failure} ({} videos were added before the failure)",
                failure.partial.appended()
            );
            Err(anyhow::Error::new(failure))
        }
    }
}
