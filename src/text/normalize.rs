//! Message-to-speech text normalization.
//!
//! Chat markup is noise to the synthesis engine: custom-emoji tokens read as
//! their raw `<:name:id>` form, URLs are unpronounceable, and pictographs
//! have no reading at all. Everything here is pure string-to-string.

use std::sync::LazyLock;

use regex::Regex;

/// Spoken stand-in for a line break.
const NEWLINE_SEPARATOR: &str = "、";
/// Appended when the message exceeds the configured length cap.
const TRUNCATION_MARKER: &str = "、以下略";

static CUSTOM_EMOJI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<a?:[A-Za-z0-9_]+:[0-9]+>").unwrap());

// Pictographs plus the joiners that stitch emoji sequences together:
// variation selectors, ZWJ, and the enclosing-keycap combiner. `\p{Emoji}`
// alone would also match ASCII digits, so it is deliberately not used.
static UNICODE_EMOJI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{Emoji_Presentation}\p{Extended_Pictographic}\u{FE0E}\u{FE0F}\u{200D}\u{20E3}]")
        .unwrap()
});

static URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:https?|ftp)://\S+").unwrap());

/// Reduces raw chat text to something worth sending to the engine.
///
/// Total and never fails; the result may be empty or whitespace-only, which
/// callers must treat as "nothing to speak".
pub fn normalize(raw: &str, max_len: usize) -> String {
    let text = CUSTOM_EMOJI.replace_all(raw, "");
    let text = UNICODE_EMOJI.replace_all(&text, "");
    let text = URL.replace_all(&text, "");
    let text = text.replace('\n', NEWLINE_SEPARATOR).replace('\r', "");

    if text.chars().count() > max_len {
        let mut truncated: String = text.chars().take(max_len).collect();
        truncated.push_str(TRUNCATION_MARKER);
        truncated
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_chat_artifacts() {
        let raw = "見て<:kusa:123456789> 🌿 これ https://example.com/page?x=1\nすごい\nでしょ";
        let normalized = normalize(raw, 150);
        assert_eq!(normalized, "見て  これ 、すごい、でしょ");
    }

    #[test]
    fn strips_animated_custom_emoji() {
        assert_eq!(normalize("<a:party_blob:987654321>やった", 150), "やった");
    }

    #[test]
    fn strips_emoji_sequences() {
        // Flag (regional indicators) and a ZWJ family sequence.
        assert_eq!(normalize("🇯🇵a👨‍👩‍👧b", 150), "ab");
    }

    #[test]
    fn keycap_removal_keeps_the_base_digit() {
        // Removal is per code point: the combining marks go, "1" stays.
        assert_eq!(normalize("1️⃣", 150), "1");
    }

    #[test]
    fn keeps_digits_and_ascii_symbols() {
        assert_eq!(normalize("3 + #4 = *7", 150), "3 + #4 = *7");
    }

    #[test]
    fn strips_ftp_and_bare_http_urls() {
        assert_eq!(normalize("a http://x.test/b c ftp://y.test/z d", 150), "a  c  d");
    }

    #[test]
    fn replaces_newlines_and_drops_carriage_returns() {
        assert_eq!(normalize("一行目\r\n二行目", 150), "一行目、二行目");
    }

    #[test]
    fn truncates_to_exact_length_with_marker() {
        let raw = "あ".repeat(20);
        let normalized = normalize(&raw, 10);
        assert_eq!(normalized, format!("{}、以下略", "あ".repeat(10)));
        assert_eq!(normalized.chars().count(), 10 + "、以下略".chars().count());
    }

    #[test]
    fn short_input_is_not_truncated() {
        let raw = "あ".repeat(10);
        assert_eq!(normalize(&raw, 10), raw);
    }

    #[test]
    fn may_reduce_to_nothing() {
        let normalized = normalize("😀 <:hi:1> https://only.example/", 150);
        assert!(normalized.trim().is_empty());
    }
}
