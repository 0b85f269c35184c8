use crate::{
    error::{ProxyError, Result},
    fetch::{self, HLS_CONTENT_TYPE},
    hls::rewrite::rewrite_playlist,
    server::state::AppState,
    session::session_url_from_referer,
};
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::info;

#[derive(Deserialize)]
pub struct PlaylistQuery {
    url: Option<String>,
}

/// Fetch the requested playlist, rewrite its key URIs and upstream segment
/// URLs to point back at this server, and merge the new mappings into the
/// shared table.
pub async fn serve_playlist(
    Query(params): Query<PlaylistQuery>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Response> {
    let url = params.url.as_ref().ok_or(ProxyError::MissingParam("url"))?;

    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ProxyError::InvalidUrl(url.clone()));
    }

    info!("Serving playlist for {}", url);

    // The rewritten URLs must carry the host the client reached us on.
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| format!("localhost:{}", state.config.port));
    let public_base = format!("{}://{}", state.config.public_scheme, host);

    // Best-effort cookie enrichment: a watch-page Referer identifies the
    // stream session; failure to derive or fetch cookies never blocks the
    // playlist fetch.
    let cookie = match headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(|r| session_url_from_referer(r, &state.config.profile.session_page_base))
    {
        Some(session_url) => {
            let cookies =
                fetch::fetch_cookies(&state.http_client, &session_url, &state.config.profile)
                    .await;
            fetch::cookie_header(&cookies)
        }
        None => None,
    };

    let playlist = fetch::fetch_playlist(
        &state.http_client,
        url,
        &state.config.profile,
        cookie.as_deref(),
    )
    .await?;

    let outcome = rewrite_playlist(&playlist.body, &public_base, &state.config.profile);

    info!(
        "Rewrote playlist from {}: {} new mappings",
        url,
        outcome.mappings.len()
    );
    state.mappings.merge(outcome.mappings);

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, HLS_CONTENT_TYPE)],
        outcome.playlist,
    )
        .into_response())
}
