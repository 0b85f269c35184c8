//! Playlist rewriting: map key URIs and upstream segment URLs to local paths.
//!
//! The rewrite is a pure function of the playlist text, the public base URL
//! and the proxy profile. It returns the rewritten text together with the
//! mapping delta; merging the delta into the shared table is the caller's
//! responsibility.

use crate::config::ProxyProfile;
use crate::hls::classify::{PlaylistLine, classify_line};
use std::collections::HashMap;
use tracing::debug;
use url::Url;

/// Result of rewriting one playlist.
#[derive(Debug)]
pub struct RewriteOutcome {
    /// Rewritten playlist text, line count and order preserved exactly
    pub playlist: String,
    /// New local-path → original-URL entries produced by this rewrite
    pub mappings: HashMap<String, String>,
}

/// Rewrite a playlist so key URIs and upstream segment URLs point at
/// `public_base` (e.g. `https://proxy.example`).
///
/// Every line maps 1:1 to an output line; lines that cannot be rewritten
/// safely are passed through unchanged.
pub fn rewrite_playlist(content: &str, public_base: &str, profile: &ProxyProfile) -> RewriteOutcome {
    let mut mappings = HashMap::new();

    let rewritten: Vec<String> = content
        .split('\n')
        .map(|line| {
            match classify_line(line, &profile.upstream_host_prefix) {
                PlaylistLine::KeyDirective(line) => {
                    rewrite_key_line(line, public_base, &mut mappings)
                        .unwrap_or_else(|| line.to_string())
                }
                PlaylistLine::UpstreamSegment(line) => {
                    rewrite_segment_line(line, public_base, profile, &mut mappings)
                }
                PlaylistLine::Passthrough(line) => line.to_string(),
            }
        })
        .collect();

    RewriteOutcome {
        playlist: rewritten.join("\n"),
        mappings,
    }
}

/// Locate the value span of a `URI="…"` attribute.
///
/// Returns the byte range of the quoted value (quotes excluded), or `None`
/// when the attribute is absent or the quote is unterminated. Deliberately
/// tolerant: a malformed directive degrades to passthrough instead of
/// producing garbage offsets.
fn uri_attribute_span(line: &str) -> Option<(usize, usize)> {
    let attr_start = line.find("URI=\"")? + "URI=\"".len();
    let value_len = line[attr_start..].find('"')?;
    Some((attr_start, attr_start + value_len))
}

/// Rewrite a `#EXT-X-KEY` line, substituting only the URI attribute value.
///
/// `None` means the line could not be rewritten (missing/malformed URI
/// attribute, relative or path-less URI) and must pass through unchanged.
fn rewrite_key_line(
    line: &str,
    public_base: &str,
    mappings: &mut HashMap<String, String>,
) -> Option<String> {
    let (start, end) = uri_attribute_span(line)?;
    let original_uri = &line[start..end];

    // Only absolute URIs can be fetched later; relative ones pass through.
    let parsed = Url::parse(original_uri).ok()?;
    let local_path = parsed.path().trim_start_matches('/');
    if local_path.is_empty() {
        return None;
    }

    debug!("Mapping key {} to {}", local_path, original_uri);
    mappings.insert(local_path.to_string(), original_uri.to_string());

    Some(format!(
        "{}{}/{}{}",
        &line[..start],
        public_base,
        local_path,
        &line[end..]
    ))
}

/// Rewrite a bare upstream segment URL line.
///
/// The stored original goes through the CORS relay because the upstream
/// host rejects direct server-to-server fetches.
fn rewrite_segment_line(
    line: &str,
    public_base: &str,
    profile: &ProxyProfile,
    mappings: &mut HashMap<String, String>,
) -> String {
    let name = line.rsplit('/').next().unwrap_or(line);
    if name.is_empty() {
        return line.to_string();
    }

    let local_path = match name.strip_suffix(".js") {
        Some(stem) => format!("{stem}.ts"),
        None => name.to_string(),
    };

    let relay_url = format!("{}{}", profile.cors_relay_prefix, urlencoding::encode(line));
    debug!("Mapping segment {} to {}", local_path, relay_url);
    mappings.insert(local_path.clone(), relay_url);

    format!("{public_base}/{local_path}")
}
