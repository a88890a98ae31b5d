//! Script detection for deciding when input needs translating.

use regex::Regex;
use std::sync::LazyLock;

/// CJK Unified Ideographs, U+4E00 through U+9FA5.
static CJK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x{4E00}-\x{9FA5}]").expect("Invalid CJK regex"));

/// Whether `text` contains at least one CJK ideograph.
///
/// A single ideograph is enough to route the input through translation.
pub fn contains_cjk(text: &str) -> bool {
    CJK_RE.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_english() {
        assert!(!contains_cjk("How are you today?"));
        assert!(!contains_cjk(""));
    }

    #[test]
    fn test_chinese_sentence() {
        assert!(contains_cjk("我今天很开心"));
    }

    #[test]
    fn test_single_ideograph_in_english() {
        assert!(contains_cjk("What does 猫 mean?"));
    }

    #[test]
    fn test_range_boundaries() {
        assert!(contains_cjk("\u{4E00}"));
        assert!(contains_cjk("\u{9FA5}"));
        assert!(!contains_cjk("\u{4DFF}"));
        assert!(!contains_cjk("\u{9FA6}"));
    }

    #[test]
    fn test_other_scripts_do_not_trigger() {
        // Hiragana, Hangul, Cyrillic, accented Latin, CJK punctuation.
        assert!(!contains_cjk("こんにちは"));
        assert!(!contains_cjk("안녕하세요"));
        assert!(!contains_cjk("Привет"));
        assert!(!contains_cjk("élève"));
        assert!(!contains_cjk("，。！"));
    }

    #[test]
    fn test_continue_token_is_not_cjk() {
        assert!(!contains_cjk(crate::orchestrator::CONTINUE_TOKEN));
    }
}
