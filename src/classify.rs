// ==========================================
// CLASSIFICATION MODULE
// ==========================================
// Pure helpers shared by search and the mixer:
// - normalize_title / is_duplicate_of: "same song, different upload" detection
// - is_short_form: YouTube Shorts and sub-minute clips
// - infer_genre: a search phrase for the genre-based half of the mix
//
// Key Concept: LazyLock<Regex>
// - Compiling a regex is slow compared to running one
// - LazyLock compiles each pattern once, the first time it's used
// - After that every call shares the same compiled pattern

use regex::Regex;
use std::sync::LazyLock;

use crate::youtube::models::Candidate;

// Shorter normalized titles than this only count as duplicates on exact match
const MIN_SUBSTRING_MATCH_LEN: usize = 8;

// Clips strictly shorter than this (and known, i.e. > 0) are short-form
const SHORT_FORM_MAX_SECONDS: u64 = 61;

// ==========================================
// PATTERNS
// ==========================================
static BRACKETED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)|\[[^\]]*\]").expect("bracket pattern is valid"));

// Everything but ASCII alphanumerics, Hangul jamo/syllables and whitespace
static DISALLOWED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^a-z0-9\x{3131}-\x{318E}\x{AC00}-\x{D7A3}\s]").expect("charset pattern is valid")
});

// Runs after punctuation is gone, so "m/v" and "feat." arrive as "m v" and "feat"
static NOISE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:official|mv|m v|music video|lyrics?|audio|live|performance|cover|reaction|remix|teaser|trailer|feat|ft|featuring)\b",
    )
    .expect("noise pattern is valid")
});

static SHORTS_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)shorts(?:$|\s)").expect("shorts pattern is valid"));

// Checked in this order, first match wins. Reordering changes which phrase a
// title maps to, so treat it like an API change.
static GENRE_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"lofi|lo-fi", "lofi mix"),
        (r"jazz", "jazz mix"),
        (r"acoustic", "acoustic mix"),
        (r"rock", "rock mix"),
        (r"edm|house|techno", "edm mix"),
        (r"hip\s?hop|rap", "hip hop mix"),
        (r"r\s?&\s?b|rnb", "rnb mix"),
        (r"k-?pop|케이팝", "kpop mix"),
        (r"j-?pop", "jpop mix"),
    ]
    .into_iter()
    .map(|(pattern, phrase)| (Regex::new(pattern).expect("genre pattern is valid"), phrase))
    .collect()
});

pub const FALLBACK_GENRE: &str = "music mix";

// ==========================================
// TITLE NORMALIZATION
// ==========================================
// Turns an upload title into something comparable across uploads:
//   "IU - Good Day (Official MV)"  ->  "iu good day"
//
// Steps:
// 1. lowercase
// 2. drop anything in (...) or [...]
// 3. replace punctuation with spaces (Hangul is kept)
// 4. strip noise words like "official" or "lyrics" until nothing changes
//
// Running it twice gives the same result as running it once.
pub fn normalize_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    let unbracketed = BRACKETED_RE.replace_all(&lowered, " ");
    let mut text = collapse_whitespace(&DISALLOWED_RE.replace_all(&unbracketed, " "));

    // Removing "music video" from "music music video video" leaves another one behind
    loop {
        let next = collapse_whitespace(&NOISE_RE.replace_all(&text, " "));
        if next == text {
            break;
        }
        text = next;
    }

    text
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ==========================================
// DUPLICATE DETECTION
// ==========================================
// Two titles are the same song when their normalized forms are equal, or
// when one contains the other and the shorter one is long enough that the
// match isn't a coincidence ("a" is inside "apple", but that means nothing).
pub fn is_duplicate_of(a: &str, b: &str) -> bool {
    let a = normalize_title(a);
    let b = normalize_title(b);
    normalized_duplicates(&a, &b)
}

/// Same as `is_duplicate_of` for titles that are already normalized.
pub fn normalized_duplicates(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    if !(a.contains(b) || b.contains(a)) {
        return false;
    }
    a.chars().count().min(b.chars().count()) >= MIN_SUBSTRING_MATCH_LEN
}

// ==========================================
// SHORT-FORM DETECTION
// ==========================================
// A clip is short-form when:
// - the title carries "#shorts" or the standalone word "shorts", OR
// - its duration is known (not 0) and under 61 seconds
//
// Live streams report 0 seconds, so an unknown duration never counts.
pub fn is_short_form(candidate: &Candidate) -> bool {
    is_short_form_parts(&candidate.title, candidate.duration_seconds)
}

pub fn is_short_form_parts(title: &str, duration_seconds: u64) -> bool {
    let title = title.to_lowercase();
    if title.contains("#shorts") || SHORTS_WORD_RE.is_match(&title) {
        return true;
    }
    duration_seconds > 0 && duration_seconds < SHORT_FORM_MAX_SECONDS
}

// ==========================================
// GENRE INFERENCE
// ==========================================
// Picks the search phrase for the mixer's genre query from the title of
// what's playing. Rules are tried top to bottom; no match gives
// FALLBACK_GENRE.
pub fn infer_genre(title: &str) -> &'static str {
    let title = title.to_lowercase();
    GENRE_RULES
        .iter()
        .find(|(re, _)| re.is_match(&title))
        .map(|(_, phrase)| *phrase)
        .unwrap_or(FALLBACK_GENRE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_brackets_noise_and_punctuation() {
        assert_eq!(normalize_title("Song (Official MV)"), "song");
        assert_eq!(normalize_title("ARTIST - Song [Lyrics] ft. Someone"), "artist song someone");
        assert_eq!(normalize_title("Song M/V"), "song");
        assert_eq!(normalize_title("  Hello,   World!!  "), "hello world");
        assert_eq!(normalize_title("아이유 - 좋은 날 (Live)"), "아이유 좋은 날");
    }

    #[test]
    fn normalize_is_idempotent() {
        let titles = [
            "Song (Official MV)",
            "music music video video",
            "mv_x feat.y",
            "Song m - v",
            "Live-Action Trailer!! [HD]",
            "((nested) brackets) remain?",
            "İstanbul Ölü Ünlü",
            "BTS (방탄소년단) 'Dynamite' Official MV",
            "",
        ];
        for title in titles {
            let once = normalize_title(title);
            assert_eq!(normalize_title(&once), once, "not idempotent for {:?}", title);
        }
    }

    #[test]
    fn duplicate_detection() {
        assert!(is_duplicate_of("Song (Official MV)", "song"));
        assert!(!is_duplicate_of("A", "Apple"));
        assert!(is_duplicate_of(
            "Never Gonna Give You Up",
            "Rick Astley - Never Gonna Give You Up (Official Video)"
        ));
        assert!(!is_duplicate_of("Lemon", "Lemonade Stand Blues"));
    }

    #[test]
    fn short_form_by_tag_word_or_duration() {
        let clip = Candidate::new("x", "Cool Clip #Shorts", "c").with_duration(45);
        assert!(is_short_form(&clip));
        let long = Candidate::new("x", "Cool Clip #Shorts", "c").with_duration(300);
        assert!(is_short_form(&long));

        assert!(is_short_form_parts("funny shorts compilation", 600));
        assert!(!is_short_form_parts("boardshorts review", 600));
        assert!(is_short_form_parts("Song", 60));
        assert!(!is_short_form_parts("Song", 61));
        assert!(!is_short_form_parts("Song", 0));
    }

    #[test]
    fn genre_rules_in_priority_order() {
        assert_eq!(infer_genre("Chill LoFi beats to study"), "lofi mix");
        // jazz is checked before rock
        assert_eq!(infer_genre("Jazz Rock Fusion"), "jazz mix");
        assert_eq!(infer_genre("Deep House Set"), "edm mix");
        assert_eq!(infer_genre("Hip Hop Classics"), "hip hop mix");
        assert_eq!(infer_genre("90s R&B slow jams"), "rnb mix");
        assert_eq!(infer_genre("K-POP Playlist"), "kpop mix");
        assert_eq!(infer_genre("케이팝 노래"), "kpop mix");
        assert_eq!(infer_genre("J-Pop anime openings"), "jpop mix");
        assert_eq!(infer_genre("Never Gonna Give You Up"), FALLBACK_GENRE);
    }
}
