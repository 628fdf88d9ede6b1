//! Song name normalization and similarity comparison.
//!
//! Normalization strips the qualifier noise YouTube titles accumulate
//! ("(Official Video)", "Lyric", separators) so that two differently worded
//! titles for the same song compare equal. The Devanagari range is preserved
//! for Hindi titles.

use super::MatchingConfig;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PAREN_QUALIFIERS: Regex =
        Regex::new(r"(?i)\((official|lyric|audio|video|full)[^)]*\)").unwrap();
    static ref BARE_QUALIFIERS: Regex = Regex::new(r"(?i)official|lyric|video|audio").unwrap();
    static ref SEPARATORS: Regex = Regex::new(r"[|•\-–—:]").unwrap();
    static ref NON_WORD: Regex = Regex::new(r"[^\w\s\u{0900}-\u{097F}]").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Canonicalize a free-text song name into a comparable token string.
///
/// Idempotent: normalizing an already normalized name is a no-op.
pub fn normalize_song_name(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }

    // Qualifier stripping runs to a fixed point: removing one qualifier can
    // expose another (e.g. "auaudiodio" leaves "audio" after one pass).
    let mut stripped = name.to_lowercase();
    loop {
        let next = PAREN_QUALIFIERS.replace_all(&stripped, "");
        let next = BARE_QUALIFIERS.replace_all(&next, "").into_owned();
        if next == stripped {
            break;
        }
        stripped = next;
    }
    let spaced = SEPARATORS.replace_all(&stripped, " ");
    let cleaned = NON_WORD.replace_all(&spaced, "");
    let collapsed = WHITESPACE.replace_all(&cleaned, " ");
    collapsed.trim().to_string()
}

/// Decide whether two names denote the same song.
///
/// Rules, any true wins:
/// 1. identical non-empty normalized forms
/// 2. substring containment (both normalized forms longer than 3 chars)
/// 3. significant-word overlap ratio at or above the configured threshold
pub fn song_names_similar(name_a: &str, name_b: &str, config: &MatchingConfig) -> bool {
    let a = normalize_song_name(name_a);
    let b = normalize_song_name(name_b);

    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b {
        return true;
    }

    if a.len() > 3 && b.len() > 3 && (a.contains(&b) || b.contains(&a)) {
        return true;
    }

    word_overlap_ratio(&a, &b) >= config.word_overlap_threshold
}

/// Ratio of significant words (length > 2) common to both names over the
/// smaller word count. Empty word lists compare as no match, not as NaN.
fn word_overlap_ratio(a: &str, b: &str) -> f64 {
    let words_a: Vec<&str> = a.split(' ').filter(|w| w.len() > 2).collect();
    let words_b: Vec<&str> = b.split(' ').filter(|w| w.len() > 2).collect();

    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }

    let common = words_a.iter().filter(|w| words_b.contains(w)).count();
    common as f64 / words_a.len().min(words_b.len()) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> MatchingConfig {
        MatchingConfig::default()
    }

    #[test]
    fn strips_parenthetical_qualifiers() {
        assert_eq!(
            normalize_song_name("Tum Hi Ho (Official Video)"),
            "tum hi ho"
        );
        assert_eq!(
            normalize_song_name("Tum Hi Ho (Lyric Video HD)"),
            "tum hi ho"
        );
    }

    #[test]
    fn strips_bare_qualifiers_and_separators() {
        assert_eq!(
            normalize_song_name("Raabta | Official Audio - T-Series"),
            "raabta t series"
        );
    }

    #[test]
    fn preserves_devanagari() {
        assert_eq!(normalize_song_name("तुम ही हो (Official)"), "तुम ही हो");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(normalize_song_name(""), "");
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in [
            "Tum Hi Ho (Official Video)",
            "Channa Mereya | Lyric",
            "Song — Artist: feat. Someone!!",
            "plain name",
            "auaudiodio",
        ] {
            let once = normalize_song_name(raw);
            assert_eq!(normalize_song_name(&once), once);
        }
    }

    #[test]
    fn nested_qualifiers_are_stripped_completely() {
        assert_eq!(normalize_song_name("auaudiodio"), "");
        assert_eq!(normalize_song_name("Kabira auaudiodio"), "kabira");
    }

    #[test]
    fn similarity_is_reflexive_and_symmetric() {
        let c = cfg();
        assert!(song_names_similar("Tum Hi Ho", "Tum Hi Ho", &c));
        let ab = song_names_similar("raees picture new song", "raees movie song", &c);
        let ba = song_names_similar("raees movie song", "raees picture new song", &c);
        assert_eq!(ab, ba);
    }

    #[test]
    fn matches_across_qualifier_noise() {
        assert!(song_names_similar(
            "tum hi ho",
            "Tum Hi Ho (Official Video)",
            &cfg()
        ));
    }

    #[test]
    fn containment_requires_some_length() {
        // "abc" is 3 chars, containment rule must not fire
        assert!(!song_names_similar("abc", "abcdef ghijkl", &cfg()));
    }

    #[test]
    fn word_overlap_above_threshold_matches() {
        // common significant words {raees, song}, min list len 3 => 0.67
        assert!(song_names_similar(
            "raees picture new song",
            "raees movie song",
            &cfg()
        ));
    }

    #[test]
    fn word_overlap_below_threshold_does_not_match() {
        assert!(!song_names_similar(
            "kabira encore version",
            "completely different title",
            &cfg()
        ));
    }

    #[test]
    fn empty_word_lists_are_no_match() {
        assert!(!song_names_similar("a b", "c d", &cfg()));
    }
}
