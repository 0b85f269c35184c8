//! Per-line playlist classification.
//!
//! Purely syntactic: each line is inspected on its own, in order, and
//! classification never fails — anything unrecognized is passthrough.

/// One playlist line, classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistLine<'a> {
    /// `#EXT-X-KEY` encryption-key directive
    KeyDirective(&'a str),
    /// Bare segment URL on the configured upstream host
    UpstreamSegment(&'a str),
    /// Any other line (tags, blank lines, foreign URLs)
    Passthrough(&'a str),
}

/// Classify a single playlist line (no trailing newline).
pub fn classify_line<'a>(line: &'a str, upstream_prefix: &str) -> PlaylistLine<'a> {
    if line.starts_with("#EXT-X-KEY") {
        PlaylistLine::KeyDirective(line)
    } else if line.starts_with(upstream_prefix) {
        PlaylistLine::UpstreamSegment(line)
    } else {
        PlaylistLine::Passthrough(line)
    }
}
