// YouTube URL handling
// Anything mentioning youtube.com or youtu.be is treated as a URL query;
// the video id is taken from the first pattern that matches.

use regex::Regex;
use std::sync::LazyLock;

static URL_HINT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:youtube\.com|youtu\.be)").expect("url hint pattern is valid"));

// Order matters: first match wins
static VIDEO_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?:youtube\.com/watch\?.*v=)([a-zA-Z0-9_-]{11})",
        r"(?:youtu\.be/)([a-zA-Z0-9_-]{11})",
        r"(?:youtube\.com/embed/)([a-zA-Z0-9_-]{11})",
        r"(?:youtube\.com/v/)([a-zA-Z0-9_-]{11})",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("video id pattern is valid"))
    .collect()
});

pub fn is_youtube_url(text: &str) -> bool {
    URL_HINT_RE.is_match(text)
}

pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
