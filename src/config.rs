//! Loading quiz configuration (prompts, quiz defaults, speech, extra lessons) from TOML.
//!
//! See `QuizConfig` for the expected schema. Every section is optional.

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::Lesson;
use crate::quiz::{QuizShape, DEFAULT_OPTION_COUNT, DEFAULT_QUESTION_COUNT};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct QuizConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub quiz: QuizDefaults,
  #[serde(default)]
  pub speech: SpeechSettings,
  #[serde(default)]
  pub sessions: SessionLimits,
  /// Added to the built-in catalog; built-in ids win on conflict.
  #[serde(default)]
  pub lessons: Vec<Lesson>,
}

/// Quiz size used when a start request leaves it out.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct QuizDefaults {
  #[serde(default = "default_question_count")]
  pub question_count: usize,
  #[serde(default = "default_option_count")]
  pub option_count: usize,
}

fn default_question_count() -> usize { DEFAULT_QUESTION_COUNT }
fn default_option_count() -> usize { DEFAULT_OPTION_COUNT }

impl Default for QuizDefaults {
  fn default() -> Self {
    Self { question_count: DEFAULT_QUESTION_COUNT, option_count: DEFAULT_OPTION_COUNT }
  }
}

impl QuizDefaults {
  pub fn shape(&self) -> QuizShape {
    QuizShape::new(self.question_count, self.option_count)
  }
}

/// How long HTTP-hosted sessions stay in the registry without being touched.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct SessionLimits {
  #[serde(default = "default_idle_ttl_secs")]
  pub idle_ttl_secs: u64,
  /// Shorter limit once a quiz is completed.
  #[serde(default = "default_completed_ttl_secs")]
  pub completed_ttl_secs: u64,
  #[serde(default = "default_sweep_every_secs")]
  pub sweep_every_secs: u64,
}

fn default_idle_ttl_secs() -> u64 { 30 * 60 }
fn default_completed_ttl_secs() -> u64 { 5 * 60 }
fn default_sweep_every_secs() -> u64 { 60 }

impl Default for SessionLimits {
  fn default() -> Self {
    Self {
      idle_ttl_secs: default_idle_ttl_secs(),
      completed_ttl_secs: default_completed_ttl_secs(),
      sweep_every_secs: default_sweep_every_secs(),
    }
  }
}

impl SessionLimits {
  pub fn idle_ttl(&self) -> Duration { Duration::from_secs(self.idle_ttl_secs) }
  pub fn completed_ttl(&self) -> Duration { Duration::from_secs(self.completed_ttl_secs) }
  pub fn sweep_every(&self) -> Duration { Duration::from_secs(self.sweep_every_secs.max(1)) }
}

/// Voice parameters attached to every utterance.
#[derive(Clone, Debug, Deserialize)]
pub struct SpeechSettings {
  #[serde(default = "default_locale")]
  pub locale: String,
  #[serde(default = "default_rate")]
  pub rate: f32,
}

fn default_locale() -> String { "en-US".into() }
fn default_rate() -> f32 { 0.9 }

impl Default for SpeechSettings {
  fn default() -> Self {
    Self { locale: default_locale(), rate: default_rate() }
  }
}

/// Prompts used for example-sentence generation. Placeholders: `{word}`, `{pos}`, `{translation}`.
#[derive(Clone, Debug, Deserialize)]
pub struct Prompts {
  pub sentence_system: String,
  pub sentence_user_template: String,
  #[serde(default = "default_sentence_temperature")]
  pub sentence_temperature: f32,
}

fn default_sentence_temperature() -> f32 { 0.8 }

impl Default for Prompts {
  fn default() -> Self {
    Self {
      sentence_system: "You write example sentences for young English learners whose first language is Chinese. Respond ONLY with strict JSON.".into(),
      sentence_user_template: "Generate one very simple, kid-friendly example sentence for the English word: '{word}'.\nThe sentence should be easy for a 5-8 year old to understand.\nThe word's part of speech is '{pos}' and its Chinese meaning is '{translation}'.\nReturn JSON {\"sentence\": string}.".into(),
      sentence_temperature: default_sentence_temperature(),
    }
  }
}

/// Attempt to load `QuizConfig` from QUIZ_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_quiz_config_from_env() -> Option<QuizConfig> {
  let path = std::env::var("QUIZ_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_quiz_config(&s) {
      Ok(cfg) => {
        info!(target: "vocab_quiz", %path, lessons = cfg.lessons.len(), "Loaded quiz config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "vocab_quiz", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "vocab_quiz", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

pub fn parse_quiz_config(s: &str) -> Result<QuizConfig, toml::de::Error> {
  toml::from_str::<QuizConfig>(s)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_file_gives_defaults() {
    let cfg = parse_quiz_config("").unwrap();
    assert_eq!(cfg.quiz.shape(), QuizShape::default());
    assert_eq!(cfg.speech.locale, "en-US");
    assert!((cfg.speech.rate - 0.9).abs() < f32::EPSILON);
    assert!(cfg.prompts.sentence_user_template.contains("{word}"));
    assert!(cfg.lessons.is_empty());
  }

  #[test]
  fn partial_sections_keep_other_defaults() {
    let cfg = parse_quiz_config(
      r#"
        [quiz]
        option_count = 4

        [speech]
        rate = 0.75

        [sessions]
        completed_ttl_secs = 30

        [[lessons]]
        id = "colors"
        title = "Colors"
        words = [
          { surfaceForm = "red", grammaticalCategory = "adjective", translation = "红色", illustration = "🟥" },
          { surfaceForm = "blue", grammaticalCategory = "adjective", translation = "蓝色" },
        ]
      "#,
    )
    .unwrap();
    assert_eq!(cfg.quiz.shape(), QuizShape::new(DEFAULT_QUESTION_COUNT, 4));
    assert_eq!(cfg.speech.locale, "en-US");
    assert!((cfg.speech.rate - 0.75).abs() < f32::EPSILON);
    assert_eq!(cfg.sessions.completed_ttl(), Duration::from_secs(30));
    assert_eq!(cfg.sessions.idle_ttl(), Duration::from_secs(30 * 60));
    assert_eq!(cfg.lessons[0].words.len(), 2);
    assert_eq!(cfg.lessons[0].illustrated_count(), 1);
  }

  #[test]
  fn malformed_config_is_an_error() {
    assert!(parse_quiz_config("[quiz]\noption_count = \"five\"").is_err());
  }
}
