//! Outbound fetches: playlist (with retries and content validation),
//! resource streaming, and best-effort cookie acquisition.

use crate::config::ProxyProfile;
use crate::error::ProxyError;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

/// IANA mime type for HLS playlists.
pub const HLS_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";

/// Magic bytes every M3U8 document starts with.
const M3U8_SIGNATURE: &str = "#EXTM3U";

/// Sleep between consecutive playlist fetch attempts.
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// A fetched and validated playlist document.
#[derive(Debug)]
pub struct FetchedPlaylist {
    pub body: String,
    pub content_type: String,
}

/// Build the browser-like outbound header set from the profile.
///
/// Header values come from operator-controlled configuration; anything that
/// fails `HeaderValue` parsing is skipped with a warning rather than
/// aborting the request.
pub fn request_headers(profile: &ProxyProfile, cookie: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let pairs: [(header::HeaderName, &str); 5] = [
        (header::USER_AGENT, &profile.user_agent),
        (header::REFERER, &profile.referer),
        (header::ORIGIN, &profile.origin),
        (header::ACCEPT, "*/*"),
        (header::ACCEPT_ENCODING, "identity"),
    ];

    for (name, value) in pairs {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                headers.insert(name, value);
            }
            Err(_) => warn!("Skipping unparseable header value for {}", name),
        }
    }

    if let Some(cookie) = cookie {
        match HeaderValue::from_str(cookie) {
            Ok(value) => {
                headers.insert(header::COOKIE, value);
            }
            Err(_) => warn!("Skipping unparseable Cookie header"),
        }
    }

    headers
}

/// Fetch a playlist with up to `profile.max_attempts` attempts.
///
/// An attempt counts as successful only when the status is 2xx and the
/// response either carries the HLS content type or starts with `#EXTM3U`.
/// Anything else is retried; the error of the final attempt is returned.
pub async fn fetch_playlist(
    client: &Client,
    url: &str,
    profile: &ProxyProfile,
    cookie: Option<&str>,
) -> Result<FetchedPlaylist, ProxyError> {
    let max_attempts = profile.max_attempts.max(1);
    let mut last_failure = String::new();

    for attempt in 1..=max_attempts {
        info!("Fetching playlist (attempt {}/{}): {}", attempt, max_attempts, url);

        match attempt_playlist_fetch(client, url, profile, cookie).await {
            Ok(playlist) => {
                info!(
                    "Playlist fetch succeeded: {} ({} bytes, {})",
                    url,
                    playlist.body.len(),
                    playlist.content_type
                );
                return Ok(playlist);
            }
            Err(reason) => {
                warn!(
                    "Playlist fetch failed for {} (attempt {}/{}): {}",
                    url, attempt, max_attempts, reason
                );
                last_failure = reason;
            }
        }

        if attempt < max_attempts {
            tokio::time::sleep(RETRY_BACKOFF).await;
        }
    }

    Err(ProxyError::PlaylistUnavailable(last_failure))
}

/// One playlist fetch attempt, including content validation.
async fn attempt_playlist_fetch(
    client: &Client,
    url: &str,
    profile: &ProxyProfile,
    cookie: Option<&str>,
) -> Result<FetchedPlaylist, String> {
    let response = client
        .get(url)
        .headers(request_headers(profile, cookie))
        .timeout(profile.fetch_timeout)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let status = response.status();
    if !status.is_success() {
        return Err(format!("upstream returned {status}"));
    }

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    let body = response.text().await.map_err(|e| e.to_string())?;

    if !content_type.starts_with(HLS_CONTENT_TYPE) && !body.starts_with(M3U8_SIGNATURE) {
        return Err(format!("invalid M3U8 content (Content-Type: {content_type})"));
    }

    Ok(FetchedPlaylist { body, content_type })
}

/// Single-attempt GET for a mapped segment or key.
///
/// Returns the live response so the caller can relay the upstream status
/// and stream the body without buffering. No retries: segment requests are
/// latency-sensitive and the player re-requests on its own.
pub async fn fetch_resource(
    client: &Client,
    url: &str,
    profile: &ProxyProfile,
) -> Result<Response, ProxyError> {
    info!("Fetching resource: {}", url);

    let response = client
        .get(url)
        .headers(request_headers(profile, None))
        .timeout(profile.fetch_timeout)
        .send()
        .await?;

    Ok(response)
}

/// Best-effort cookie acquisition from the upstream session page.
///
/// Collects `Set-Cookie` name/value pairs from a single GET. Cookies are an
/// optional enrichment: every failure path yields an empty set.
pub async fn fetch_cookies(
    client: &Client,
    session_url: &str,
    profile: &ProxyProfile,
) -> HashMap<String, String> {
    info!("Fetching session cookies from {}", session_url);

    let response = match client
        .get(session_url)
        .headers(request_headers(profile, None))
        .timeout(profile.fetch_timeout)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            warn!("Cookie fetch failed for {}: {}", session_url, e);
            return HashMap::new();
        }
    };

    let mut cookies = HashMap::new();
    for value in response.headers().get_all(header::SET_COOKIE) {
        let Ok(raw) = value.to_str() else { continue };
        // Only the name=value pair matters; attributes after ';' are dropped.
        let pair = raw.split(';').next().unwrap_or(raw);
        if let Some((name, value)) = pair.split_once('=') {
            cookies.insert(name.trim().to_string(), value.trim().to_string());
        }
    }

    info!("Collected {} session cookies", cookies.len());
    cookies
}

/// Join a cookie set into a `Cookie` request header value.
pub fn cookie_header(cookies: &HashMap<String, String>) -> Option<String> {
    if cookies.is_empty() {
        return None;
    }
    let joined = cookies
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ");
    Some(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{header as header_match, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_profile(max_attempts: u32) -> ProxyProfile {
        ProxyProfile {
            user_agent: "test-agent".to_string(),
            origin: "https://embedstreams.top".to_string(),
            referer: "https://embedstreams.top/".to_string(),
            upstream_host_prefix: "https://p2-panel.streamed.su".to_string(),
            cors_relay_prefix: "https://corsproxy.io/?url=".to_string(),
            max_attempts,
            fetch_timeout: Duration::from_secs(5),
            session_page_base: "https://streamed.su/watch".to_string(),
        }
    }

    #[test]
    fn headers_include_browser_profile() {
        let headers = request_headers(&test_profile(1), None);
        assert_eq!(headers.get(header::USER_AGENT).unwrap(), "test-agent");
        assert_eq!(
            headers.get(header::ORIGIN).unwrap(),
            "https://embedstreams.top"
        );
        assert_eq!(headers.get(header::ACCEPT_ENCODING).unwrap(), "identity");
        assert!(headers.get(header::COOKIE).is_none());
    }

    #[test]
    fn cookie_is_attached_when_present() {
        let headers = request_headers(&test_profile(1), Some("sid=abc"));
        assert_eq!(headers.get(header::COOKIE).unwrap(), "sid=abc");
    }

    #[test]
    fn cookie_header_joins_pairs() {
        let mut cookies = HashMap::new();
        cookies.insert("sid".to_string(), "abc".to_string());
        let joined = cookie_header(&cookies).unwrap();
        assert_eq!(joined, "sid=abc");

        assert_eq!(cookie_header(&HashMap::new()), None);
    }

    #[tokio::test]
    async fn playlist_accepted_by_signature_without_hls_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("#EXTM3U\n#EXT-X-ENDLIST")
                    .insert_header("content-type", "text/plain"),
            )
            .mount(&server)
            .await;

        let client = Client::new();
        let result = fetch_playlist(&client, &server.uri(), &test_profile(1), None).await;
        assert!(result.is_ok());
        assert!(result.unwrap().body.starts_with("#EXTM3U"));
    }

    #[tokio::test]
    async fn playlist_rejected_when_neither_type_nor_signature_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html>not a playlist</html>")
                    .insert_header("content-type", "text/html"),
            )
            .mount(&server)
            .await;

        let client = Client::new();
        let result = fetch_playlist(&client, &server.uri(), &test_profile(1), None).await;
        assert!(matches!(result, Err(ProxyError::PlaylistUnavailable(_))));
    }

    #[tokio::test]
    async fn playlist_retries_then_succeeds() {
        let server = MockServer::start().await;

        // 200 fallback (lower priority — mounted first)
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("#EXTM3U")
                    .insert_header("content-type", HLS_CONTENT_TYPE),
            )
            .mount(&server)
            .await;

        // 503 on first hit (mounted last, deactivates after 1)
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        let client = Client::new();
        let result = fetch_playlist(&client, &server.uri(), &test_profile(3), None).await;
        assert!(result.is_ok(), "Expected success after retry");
    }

    #[tokio::test]
    async fn playlist_fails_after_exhausting_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let client = Client::new();
        let result = fetch_playlist(&client, &server.uri(), &test_profile(3), None).await;
        assert!(matches!(result, Err(ProxyError::PlaylistUnavailable(_))));
    }

    #[tokio::test]
    async fn resource_fetch_sends_browser_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/seg1.js"))
            .and(header_match("origin", "https://embedstreams.top"))
            .and(header_match("user-agent", "test-agent"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"segmentdata".to_vec()))
            .mount(&server)
            .await;

        let client = Client::new();
        let response = fetch_resource(
            &client,
            &format!("{}/seg1.js", server.uri()),
            &test_profile(1),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(response.bytes().await.unwrap().as_ref(), b"segmentdata");
    }

    #[tokio::test]
    async fn cookie_fetch_collects_set_cookie_pairs() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .append_header("set-cookie", "sid=abc123; Path=/; HttpOnly")
                    .append_header("set-cookie", "cf=xyz; Secure"),
            )
            .mount(&server)
            .await;

        let client = Client::new();
        let cookies = fetch_cookies(&client, &server.uri(), &test_profile(1)).await;

        assert_eq!(cookies.get("sid"), Some(&"abc123".to_string()));
        assert_eq!(cookies.get("cf"), Some(&"xyz".to_string()));
    }

    #[tokio::test]
    async fn cookie_fetch_failure_yields_empty_set() {
        let client = Client::new();
        // Unroutable address — connection refused
        let cookies =
            fetch_cookies(&client, "http://127.0.0.1:9/watch/a/b/1", &test_profile(1)).await;
        assert!(cookies.is_empty());
    }
}
