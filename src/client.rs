//! # GData client
//!
//! [`GDataClient`] is the real implementation of
//! [`ytpa_core::contract::FeedSource`] and [`ytpa_core::contract::PlaylistWriter`].
//! It logs in once with the ClientLogin handshake and then sends every
//! request with the resulting token and the developer key.
//!
//! - Feeds are read as JSON (`alt=json`). Entry ids come back as resource URIs
//!   because no `GData-Version` header is sent.
//! - Playlist creation and video appends post small Atom entries.
//! - Non-success statuses become [`RemoteError::Rejected`]; a duplicate playlist
//!   name becomes [`RemoteError::Conflict`].
//!
//! The decoding and request-building helpers are public so they can be tested
//! without a network.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;

use ytpa_core::contract::{
    Entry, FeedLocator, FeedSource, NewPlaylist, Page, PlaylistRef, PlaylistWriter, RemoteError,
    VideoRef,
};
use ytpa_core::error::AggregateError;

pub const DEFAULT_API_BASE: &str = "https://gdata.youtube.com/feeds/api";
pub const DEFAULT_LOGIN_URL: &str = "https://www.google.com/accounts/ClientLogin";
pub const DEFAULT_CLIENT_SOURCE: &str = "playlist-aggregator";

const ATOM_CONTENT_TYPE: &str = "application/atom+xml";
const MAX_ERROR_BODY: usize = 200;

/// Connection settings for one account.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub developer_key: String,
    /// Google account used to log in.
    pub email: String,
    /// Channel name of the account; its playlists are searched for the destination.
    pub username: String,
    pub api_base: String,
    pub login_url: String,
    /// Application name reported to the login service.
    pub client_source: String,
}

pub struct GDataClient {
    http: Client,
    config: ClientConfig,
    auth_token: String,
}

impl GDataClient {
    /// Log in with the account in `config` and return a ready client.
    pub async fn authenticate(
        config: ClientConfig,
        password: &str,
    ) -> Result<Self, AggregateError> {
        let http = Client::new();
        tracing::info!(email = %config.email, login_url = %config.login_url, "Logging in");

        let form = [
            ("accountType", "GOOGLE"),
            ("Email", config.email.as_str()),
            ("Passwd", password),
            ("service", "youtube"),
            ("source", config.client_source.as_str()),
        ];
        let response = http
            .post(&config.login_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Login request failed");
                AggregateError::Authentication(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AggregateError::Authentication(e.to_string()))?;

        if !status.is_success() {
            let reason = login_error(&body).unwrap_or_else(|| truncate(&body));
            tracing::error!(status = %status, reason = %reason, "Login rejected");
            return Err(AggregateError::Authentication(format!("{status}: {reason}")));
        }

        let auth_token = parse_login_token(&body).ok_or_else(|| {
            tracing::error!("Login answer carried no Auth token");
            AggregateError::Authentication("no Auth token in login response".to_string())
        })?;

        tracing::info!(email = %config.email, "Logged in");
        Ok(GDataClient {
            http,
            config,
            auth_token,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(
                reqwest::header::AUTHORIZATION,
                format!("GoogleLogin auth={}", self.auth_token),
            )
            .header("X-GData-Key", format!("key={}", self.config.developer_key))
    }
}

#[async_trait]
impl FeedSource for GDataClient {
    async fn fetch_page(&self, locator: &FeedLocator) -> Result<Page, RemoteError> {
        let url = feed_url(&self.config.api_base, locator)?;
        tracing::debug!(%locator, url = %url, "GET feed page");

        let response = self
            .authorized(self.http.get(url))
            .send()
            .await
            .map_err(transport)?;
        let body = successful(response).await?.text().await.map_err(transport)?;

        decode_page(&body)
    }
}

#[async_trait]
impl PlaylistWriter for GDataClient {
    async fn create_playlist<'a>(&self, req: NewPlaylist<'a>) -> Result<String, RemoteError> {
        let mut url = resource_url(&self.config.api_base, &["users", "default", "playlists"])?;
        url.query_pairs_mut().append_pair("alt", "json");
        tracing::info!(name = req.name, "Creating playlist");

        let response = self
            .authorized(self.http.post(url))
            .header(reqwest::header::CONTENT_TYPE, ATOM_CONTENT_TYPE)
            .body(playlist_entry_xml(req.name, req.description))
            .send()
            .await
            .map_err(transport)?;

        let response = match successful(response).await {
            Ok(response) => response,
            Err(RemoteError::Rejected { status, message })
                if status == StatusCode::CONFLICT.as_u16()
                    || (status == StatusCode::BAD_REQUEST.as_u16()
                        && message.to_lowercase().contains("already exists")) =>
            {
                return Err(RemoteError::Conflict(message));
            }
            Err(e) => return Err(e),
        };

        let body = response.text().await.map_err(transport)?;
        let id = decode_entry_id(&body)?;
        tracing::info!(name = req.name, id = %id, "Playlist created");
        Ok(id)
    }

    async fn append_video(
        &self,
        playlist: &PlaylistRef,
        video: &VideoRef,
    ) -> Result<(), RemoteError> {
        let url = resource_url(&self.config.api_base, &["playlists", playlist.as_str()])?;
        tracing::debug!(playlist = %playlist, video = %video, "Appending video");

        let response = self
            .authorized(self.http.post(url))
            .header(reqwest::header::CONTENT_TYPE, ATOM_CONTENT_TYPE)
            .body(video_entry_xml(video))
            .send()
            .await
            .map_err(transport)?;
        successful(response).await?;
        Ok(())
    }
}

/// URL of the first page addressed by `locator`. Next-page links are used verbatim.
pub fn feed_url(api_base: &str, locator: &FeedLocator) -> Result<Url, RemoteError> {
    let mut url = match locator {
        FeedLocator::Next(link) => {
            return Url::parse(link)
                .map_err(|e| RemoteError::Decode(format!("next link {link:?}: {e}")));
        }
        FeedLocator::Uploads(user) => resource_url(api_base, &["users", user.as_str(), "uploads"])?,
        FeedLocator::PlaylistVideos(playlist) => {
            resource_url(api_base, &["playlists", playlist.as_str()])?
        }
        FeedLocator::PlaylistsOf(owner) => resource_url(api_base, &["users", owner.as_str(), "playlists"])?,
    };
    url.query_pairs_mut().append_pair("alt", "json");
    Ok(url)
}

fn resource_url(api_base: &str, segments: &[&str]) -> Result<Url, RemoteError> {
    let mut url = Url::parse(api_base)
        .map_err(|e| RemoteError::Transport(format!("invalid api_base {api_base:?}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| RemoteError::Transport(format!("api_base {api_base:?} cannot be a base")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[derive(Deserialize)]
struct FeedDocument {
    feed: FeedBody,
}

#[derive(Deserialize)]
struct FeedBody {
    #[serde(default)]
    entry: Vec<FeedEntry>,
    #[serde(default)]
    link: Vec<FeedLink>,
}

#[derive(Deserialize)]
struct EntryDocument {
    entry: FeedEntry,
}

#[derive(Deserialize)]
struct FeedEntry {
    id: Text,
    #[serde(default)]
    title: Option<Text>,
}

#[derive(Deserialize)]
struct FeedLink {
    rel: String,
    href: String,
}

#[derive(Deserialize)]
struct Text {
    #[serde(rename = "$t")]
    text: String,
}

/// Decode one JSON feed page.
pub fn decode_page(body: &str) -> Result<Page, RemoteError> {
    let document: FeedDocument =
        serde_json::from_str(body).map_err(|e| RemoteError::Decode(e.to_string()))?;

    let next = document
        .feed
        .link
        .into_iter()
        .find(|link| link.rel == "next")
        .map(|link| link.href);
    let entries = document
        .feed
        .entry
        .into_iter()
        .map(|entry| Entry {
            id: entry.id.text,
            title: entry.title.map(|title| title.text),
        })
        .collect();

    Ok(Page { entries, next })
}

/// Decode the resource URI out of a single-entry JSON answer.
pub fn decode_entry_id(body: &str) -> Result<String, RemoteError> {
    let document: EntryDocument =
        serde_json::from_str(body).map_err(|e| RemoteError::Decode(e.to_string()))?;
    Ok(document.entry.id.text)
}

/// Extract the `Auth=` token from a ClientLogin answer.
pub fn parse_login_token(body: &str) -> Option<String> {
    body.lines()
        .find_map(|line| line.trim().strip_prefix("Auth="))
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
}

fn login_error(body: &str) -> Option<String> {
    body.lines()
        .find_map(|line| line.trim().strip_prefix("Error="))
        .map(str::to_owned)
}

/// Atom entry creating a playlist.
pub fn playlist_entry_xml(name: &str, description: Option<&str>) -> String {
    let summary = description
        .map(|d| format!("<summary>{}</summary>", escape_xml(d)))
        .unwrap_or_default();
    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>",
            "<entry xmlns=\"http://www.w3.org/2005/Atom\" ",
            "xmlns:yt=\"http://gdata.youtube.com/schemas/2007\">",
            "<title type=\"text\">{}</title>{}</entry>"
        ),
        escape_xml(name),
        summary
    )
}

/// Atom entry appending a video to a playlist.
pub fn video_entry_xml(video: &VideoRef) -> String {
    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>",
            "<entry xmlns=\"http://www.w3.org/2005/Atom\" ",
            "xmlns:yt=\"http://gdata.youtube.com/schemas/2007\">",
            "<id>{}</id></entry>"
        ),
        escape_xml(video.as_str())
    )
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

async fn successful(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = truncate(body.trim());
    tracing::warn!(status = %status, message = %message, "Request rejected");
    Err(RemoteError::Rejected {
        status: status.as_u16(),
        message,
    })
}

fn transport(e: reqwest::Error) -> RemoteError {
    tracing::error!(error = %e, "HTTP transport error");
    RemoteError::Transport(e.to_string())
}

fn truncate(text: &str) -> String {
    text.chars().take(MAX_ERROR_BODY).collect()
}
