//! Domain models: vocabulary entries, lessons, question kinds and questions.

use serde::{Deserialize, Serialize};

/// One vocabulary item. Identity is `surface_form`, unique within a lesson.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordEntry {
  /// Target-language (English) spelling.
  pub surface_form: String,
  /// Part-of-speech tag, e.g. "noun".
  pub grammatical_category: String,
  /// Native-language (Chinese) gloss.
  pub translation: String,
  /// Emoji or image reference; `None` means no visual aid.
  #[serde(default)]
  pub illustration: Option<String>,
}

impl WordEntry {
  pub fn new(surface_form: &str, grammatical_category: &str, translation: &str, illustration: Option<&str>) -> Self {
    Self {
      surface_form: surface_form.to_string(),
      grammatical_category: grammatical_category.to_string(),
      translation: translation.to_string(),
      illustration: illustration.map(str::to_string),
    }
  }

  /// An empty illustration string counts as no illustration.
  pub fn has_illustration(&self) -> bool {
    self.illustration.as_deref().is_some_and(|s| !s.trim().is_empty())
  }

  pub fn same_word(&self, other: &WordEntry) -> bool {
    self.surface_form == other.surface_form
  }
}

/// A themed set of words. Immutable for the duration of a session.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
  pub id: String,
  pub title: String,
  #[serde(default = "default_icon")]
  pub icon_glyph: String,
  #[serde(default = "default_color")]
  pub theme_color: String,
  #[serde(default)]
  pub words: Vec<WordEntry>,
}

fn default_icon() -> String { "📘".into() }
fn default_color() -> String { "bg-sky-500".into() }

impl Lesson {
  pub fn illustrated_count(&self) -> usize {
    self.words.iter().filter(|w| w.has_illustration()).count()
  }
}

/// How a question is presented to the learner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
  /// Show the Chinese gloss, pick the English word.
  TranslateFromNative,
  /// Show the English word, pick the Chinese gloss.
  TranslateToNative,
  /// Show the illustration, pick the English word. Illustrated words only.
  IdentifyFromImage,
  /// Play the English word, pick what was heard.
  IdentifyFromAudio,
}

impl QuestionKind {
  /// Kinds every word is eligible for.
  pub const BASE: [QuestionKind; 3] = [
    QuestionKind::TranslateFromNative,
    QuestionKind::TranslateToNative,
    QuestionKind::IdentifyFromAudio,
  ];

  pub fn instruction(self) -> &'static str {
    match self {
      QuestionKind::TranslateFromNative | QuestionKind::TranslateToNative => "Translate this word:",
      QuestionKind::IdentifyFromImage => "What is this?",
      QuestionKind::IdentifyFromAudio => "What do you hear?",
    }
  }
}

/// A generated multiple-choice item. `options` holds `prompt_word` exactly once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
  pub prompt_word: WordEntry,
  pub options: Vec<WordEntry>,
  pub kind: QuestionKind,
}

impl Question {
  pub fn option(&self, surface_form: &str) -> Option<&WordEntry> {
    self.options.iter().find(|w| w.surface_form == surface_form)
  }

  pub fn is_correct(&self, word: &WordEntry) -> bool {
    self.prompt_word.same_word(word)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_illustration_is_not_an_illustration() {
    let blank = WordEntry::new("ghost", "noun", "鬼", Some("  "));
    let none = WordEntry::new("idea", "noun", "主意", None);
    let cat = WordEntry::new("cat", "noun", "猫", Some("🐱"));
    assert!(!blank.has_illustration());
    assert!(!none.has_illustration());
    assert!(cat.has_illustration());
  }

  #[test]
  fn lesson_defaults_fill_icon_and_color() {
    let lesson: Lesson = toml::from_str(
      r#"
        id = "weather"
        title = "Weather"
        [[words]]
        surfaceForm = "rain"
        grammaticalCategory = "noun"
        translation = "雨"
      "#,
    )
    .unwrap();
    assert_eq!(lesson.icon_glyph, "📘");
    assert_eq!(lesson.theme_color, "bg-sky-500");
    assert_eq!(lesson.words.len(), 1);
    assert!(lesson.words[0].illustration.is_none());
  }
}
