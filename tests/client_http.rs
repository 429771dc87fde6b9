use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use ytpa::client::{ClientConfig, GDataClient};
use ytpa_core::aggregate::{aggregate, AggregateRequest, Source};
use ytpa_core::contract::{
    FeedLocator, FeedSource, NewPlaylist, PlaylistRef, PlaylistWriter, RemoteError, VideoRef,
};
use ytpa_core::error::AggregateError;

const LOGIN_OK: &str = "SID=abc\nLSID=def\nAuth=TOKEN123\n";

/// Serves the canned `(status, body)` answers in order, one connection each,
/// and hands back the raw requests it received.
async fn fake_server(responses: Vec<(u16, String)>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let mut requests = Vec::new();
        for (status, body) in responses {
            let (mut stream, _) = listener.accept().await.unwrap();
            requests.push(read_request(&mut stream).await);
            let response = format!(
                "HTTP/1.1 {status} Canned\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
        }
        requests
    });
    (format!("http://{addr}"), handle)
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = stream.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
        if let Some(end) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&data[..end]).to_lowercase();
            let length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .map(|value| value.trim().parse::<usize>().unwrap())
                .unwrap_or(0);
            if data.len() >= end + 4 + length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&data).into_owned()
}

fn header<'a>(request: &'a str, name: &str) -> Option<&'a str> {
    request.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.eq_ignore_ascii_case(name).then(|| value.trim())
    })
}

fn request_line(request: &str) -> &str {
    request.lines().next().unwrap_or_default()
}

fn config(base: &str) -> ClientConfig {
    ClientConfig {
        developer_key: "DEVKEY".into(),
        email: "me@example.com".into(),
        username: "me".into(),
        api_base: format!("{base}/feeds/api"),
        login_url: format!("{base}/accounts/ClientLogin"),
        client_source: "ytpa-test".into(),
    }
}

fn feed(entries: &[(&str, &str)], next: Option<&str>) -> String {
    let entries: Vec<_> = entries
        .iter()
        .map(|(id, title)| serde_json::json!({ "id": { "$t": id }, "title": { "$t": title } }))
        .collect();
    let mut links = vec![serde_json::json!({ "rel": "self", "href": "ignored" })];
    if let Some(next) = next {
        links.push(serde_json::json!({ "rel": "next", "href": next }));
    }
    serde_json::json!({ "feed": { "entry": entries, "link": links } }).to_string()
}

#[tokio::test]
async fn test_login_then_fetch_sends_credentials_and_decodes_page() {
    let uploads = feed(
        &[("http://gdata.youtube.com/feeds/api/videos/v1", "First")],
        Some("http://example.invalid/next"),
    );
    let (base, server) = fake_server(vec![(200, LOGIN_OK.into()), (200, uploads)]).await;

    let client = GDataClient::authenticate(config(&base), "s3cret")
        .await
        .expect("login succeeds");
    let page = client
        .fetch_page(&FeedLocator::Uploads("alice".into()))
        .await
        .expect("page decodes");

    assert_eq!(page.entries.len(), 1);
    assert_eq!(page.entries[0].id, "http://gdata.youtube.com/feeds/api/videos/v1");
    assert_eq!(page.entries[0].title.as_deref(), Some("First"));
    assert_eq!(page.next.as_deref(), Some("http://example.invalid/next"));

    let requests = server.await.unwrap();
    let login = &requests[0];
    assert_eq!(request_line(login), "POST /accounts/ClientLogin HTTP/1.1");
    assert!(login.contains("accountType=GOOGLE"));
    assert!(login.contains("Email=me%40example.com"));
    assert!(login.contains("Passwd=s3cret"));
    assert!(login.contains("service=youtube"));
    assert!(login.contains("source=ytpa-test"));

    let fetch = &requests[1];
    assert_eq!(
        request_line(fetch),
        "GET /feeds/api/users/alice/uploads?alt=json HTTP/1.1"
    );
    assert_eq!(header(fetch, "authorization"), Some("GoogleLogin auth=TOKEN123"));
    assert_eq!(header(fetch, "x-gdata-key"), Some("key=DEVKEY"));
}

#[tokio::test]
async fn test_login_rejection_is_an_authentication_error() {
    let (base, _server) =
        fake_server(vec![(403, "Error=BadAuthentication\n".into())]).await;

    let err = GDataClient::authenticate(config(&base), "wrong")
        .await
        .err()
        .expect("login fails");

    match err {
        AggregateError::Authentication(reason) => {
            assert!(reason.contains("BadAuthentication"), "got: {reason}")
        }
        other => panic!("expected authentication error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_reports_status_of_rejected_request() {
    let (base, _server) = fake_server(vec![
        (200, LOGIN_OK.into()),
        (404, "Playlist not found".into()),
    ])
    .await;
    let client = GDataClient::authenticate(config(&base), "s3cret").await.unwrap();

    let err = client
        .fetch_page(&FeedLocator::PlaylistVideos(PlaylistRef::new("PLgone")))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(
        err,
        RemoteError::Rejected {
            status: 404,
            message: "Playlist not found".into()
        }
    );
}

#[tokio::test]
async fn test_create_playlist_posts_atom_entry_and_returns_uri() {
    let created = serde_json::json!({
        "entry": { "id": { "$t": "http://gdata.youtube.com/feeds/api/users/me/playlists/PLnew" } }
    })
    .to_string();
    let (base, server) = fake_server(vec![(200, LOGIN_OK.into()), (201, created)]).await;
    let client = GDataClient::authenticate(config(&base), "s3cret").await.unwrap();

    let uri = client
        .create_playlist(NewPlaylist {
            name: "Rock & Roll",
            description: Some("All of it"),
        })
        .await
        .unwrap();

    assert_eq!(uri, "http://gdata.youtube.com/feeds/api/users/me/playlists/PLnew");
    let requests = server.await.unwrap();
    let create = &requests[1];
    assert_eq!(
        request_line(create),
        "POST /feeds/api/users/default/playlists?alt=json HTTP/1.1"
    );
    assert_eq!(header(create, "content-type"), Some("application/atom+xml"));
    assert!(create.contains("<title type=\"text\">Rock &amp; Roll</title>"));
    assert!(create.contains("<summary>All of it</summary>"));
}

#[tokio::test]
async fn test_create_playlist_maps_duplicate_to_conflict() {
    let (base, _server) = fake_server(vec![
        (200, LOGIN_OK.into()),
        (400, "Playlist already exists".into()),
    ])
    .await;
    let client = GDataClient::authenticate(config(&base), "s3cret").await.unwrap();

    let err = client
        .create_playlist(NewPlaylist {
            name: "MyMix",
            description: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, RemoteError::Conflict(_)), "got {err:?}");
}

#[tokio::test]
async fn test_append_video_posts_video_id() {
    let (base, server) = fake_server(vec![(200, LOGIN_OK.into()), (201, String::new())]).await;
    let client = GDataClient::authenticate(config(&base), "s3cret").await.unwrap();

    client
        .append_video(&PlaylistRef::new("PLdest"), &VideoRef::new("v1"))
        .await
        .unwrap();

    let requests = server.await.unwrap();
    let append = &requests[1];
    assert_eq!(request_line(append), "POST /feeds/api/playlists/PLdest HTTP/1.1");
    assert!(append.contains("<id>v1</id>"));
}

#[tokio::test]
async fn test_aggregate_over_http_appends_uploads_to_existing_playlist() {
    let playlists = feed(
        &[("http://gdata.youtube.com/feeds/api/users/me/playlists/PLdest", "MyMix")],
        None,
    );
    let uploads = feed(
        &[
            ("http://gdata.youtube.com/feeds/api/videos/v1", "One"),
            ("http://gdata.youtube.com/feeds/api/videos/v2", "Two"),
        ],
        None,
    );
    let (base, server) = fake_server(vec![
        (200, LOGIN_OK.into()),
        (200, playlists),
        (200, uploads),
        (201, String::new()),
        (201, String::new()),
    ])
    .await;
    let client = GDataClient::authenticate(config(&base), "s3cret").await.unwrap();

    let request = AggregateRequest {
        account: "me".into(),
        destination: "MyMix".into(),
        description: None,
        sources: vec![Source::user("alice")],
    };
    let report = aggregate(&client, &client, &request).await.unwrap();

    assert_eq!(report.destination, Some(PlaylistRef::new("PLdest")));
    assert!(!report.created);
    assert_eq!(report.appended(), 2);

    let requests = server.await.unwrap();
    let lines: Vec<_> = requests.iter().map(|r| request_line(r)).collect();
    assert_eq!(
        lines,
        vec![
            "POST /accounts/ClientLogin HTTP/1.1",
            "GET /feeds/api/users/me/playlists?alt=json HTTP/1.1",
            "GET /feeds/api/users/alice/uploads?alt=json HTTP/1.1",
            "POST /feeds/api/playlists/PLdest HTTP/1.1",
            "POST /feeds/api/playlists/PLdest HTTP/1.1",
        ]
    );
    assert!(requests[3].contains("<id>v1</id>"));
    assert!(requests[4].contains("<id>v2</id>"));
}
