//! Hanyu Pinyin (tone diacritics) for the Chinese glosses shown next to words.
//!
//! Example:
//!   输入: "苹果"
//!   输出: "píng guǒ"
use pinyin::ToPinyin;

/// Pinyin for every Han character in `translation`, space-separated.
/// Anything else (punctuation, Latin letters, spaces) is skipped.
///
/// Per-character conversion, so polyphonic characters use their default reading.
pub fn gloss_pinyin(translation: &str) -> String {
  translation
    .chars()
    .filter_map(|ch| ch.to_pinyin())
    .map(|py| py.with_tone())
    .collect::<Vec<_>>()
    .join(" ")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn converts_han_characters_with_tones() {
    assert_eq!(gloss_pinyin("狗"), "gǒu");
    assert_eq!(gloss_pinyin("苹果"), "píng guǒ");
  }

  #[test]
  fn skips_non_han_characters() {
    assert_eq!(gloss_pinyin("苹果 (apple)"), "píng guǒ");
    assert_eq!(gloss_pinyin("abc"), "");
  }
}
