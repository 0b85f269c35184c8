pub mod playlist;
pub mod resource;

/// Liveness probe
pub async fn health() -> &'static str {
    "OK"
}

/// Plain-text usage banner served at the root path
pub async fn usage() -> &'static str {
    "Streamgate HLS relay proxy\n\
     \n\
     GET /playlist.m3u8?url=<m3u8-url>  fetch and rewrite a playlist\n\
     GET /<path>                        serve a previously mapped segment or key\n\
     GET /health                        liveness probe\n"
}
