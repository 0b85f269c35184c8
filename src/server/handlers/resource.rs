use crate::{
    error::{ProxyError, Result},
    fetch,
    server::state::AppState,
};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{info, warn};

/// Default Content-Type for relayed segments when the upstream omits one.
const DEFAULT_SEGMENT_TYPE: &str = "video/mp2t";

/// Resolve a previously mapped local path and stream the original resource
/// back to the client.
///
/// Single-attempt fetch: segment requests are latency-sensitive and the
/// player re-requests failed segments on its own. The body is relayed as a
/// stream; a client disconnect drops the stream and with it the outbound
/// connection.
pub async fn serve_resource(
    Path(path): Path<String>,
    State(state): State<AppState>,
) -> Result<Response> {
    let Some(original_url) = state.mappings.lookup(&path) else {
        warn!("No mapping for {}", path);
        return Err(ProxyError::UnknownPath);
    };

    info!("Serving {} from {}", path, original_url);

    let response =
        fetch::fetch_resource(&state.http_client, &original_url, &state.config.profile).await?;

    let status = response.status();
    if !status.is_success() {
        warn!("Upstream returned {} for {}", status, original_url);
        return Err(ProxyError::UpstreamStatus(status));
    }

    let content_type = match response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    {
        // Disguised segments come back as JavaScript; the player expects TS.
        None | Some("text/javascript") => DEFAULT_SEGMENT_TYPE.to_string(),
        Some(upstream_type) => upstream_type.to_string(),
    };

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type.as_str())],
        Body::from_stream(response.bytes_stream()),
    )
        .into_response())
}
