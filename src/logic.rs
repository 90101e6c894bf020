//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Lesson cards and lesson word lists
//!   - Word search and the alphabetical word index
//!   - Validating requested quiz sizes against the configured defaults

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use crate::config::QuizDefaults;
use crate::error::ApiError;
use crate::protocol::{to_lesson_detail, to_word_out, LessonCardOut, LessonDetailOut, WordHitOut, WordsOut};
use crate::quiz::QuizShape;
use crate::state::AppState;
use crate::util::{fold, index_letter};

pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 10;
pub const MAX_QUESTIONS: usize = 50;

pub fn lesson_cards(state: &AppState) -> Vec<LessonCardOut> {
  let shape = state.defaults.shape();
  state
    .lessons
    .iter()
    .map(|l| LessonCardOut {
      id: l.id.clone(),
      title: l.title.clone(),
      icon_glyph: l.icon_glyph.clone(),
      theme_color: l.theme_color.clone(),
      word_count: l.words.len(),
      illustrated_count: l.illustrated_count(),
      quiz_ready: shape.feasible_for(l),
    })
    .collect()
}

pub fn lesson_detail(state: &AppState, lesson_id: &str) -> Result<LessonDetailOut, ApiError> {
  state
    .lesson(lesson_id)
    .map(to_lesson_detail)
    .ok_or_else(|| ApiError::UnknownLesson(lesson_id.to_string()))
}

/// With a query: words whose surface form or translation contains it (case-insensitive).
/// Without one: every word grouped by its initial letter, plus the letters present.
#[instrument(level = "info", skip(state))]
pub fn list_words(state: &AppState, query: Option<&str>) -> WordsOut {
  let hits = state.lessons.iter().flat_map(|l| {
    l.words.iter().map(move |w| (l.id.as_str(), w))
  });

  match query.map(fold).filter(|q| !q.is_empty()) {
    Some(q) => {
      let results: Vec<WordHitOut> = hits
        .filter(|(_, w)| fold(&w.surface_form).contains(&q) || w.translation.contains(q.as_str()))
        .map(|(lesson_id, w)| WordHitOut { lesson_id: lesson_id.to_string(), word: to_word_out(w) })
        .collect();
      debug!(target: "vocab_quiz", query = %q, hits = results.len(), "Word search");
      WordsOut { query: Some(q), results, groups: BTreeMap::new(), alphabet: Vec::new() }
    }
    None => {
      let mut groups: BTreeMap<String, Vec<WordHitOut>> = BTreeMap::new();
      for (lesson_id, w) in hits {
        let Some(letter) = index_letter(&w.surface_form) else { continue };
        groups
          .entry(letter.to_string())
          .or_default()
          .push(WordHitOut { lesson_id: lesson_id.to_string(), word: to_word_out(w) });
      }
      for words in groups.values_mut() {
        words.sort_by(|a, b| fold(&a.word.surface_form).cmp(&fold(&b.word.surface_form)));
      }
      let alphabet = groups.keys().cloned().collect();
      WordsOut { query: None, results: Vec::new(), groups, alphabet }
    }
  }
}

/// Fill missing sizes from the defaults and reject values outside the supported range.
pub fn resolve_shape(
  defaults: &QuizDefaults,
  question_count: Option<usize>,
  option_count: Option<usize>,
) -> Result<QuizShape, ApiError> {
  let question_count = question_count.unwrap_or(defaults.question_count);
  let option_count = option_count.unwrap_or(defaults.option_count);
  if !(1..=MAX_QUESTIONS).contains(&question_count) {
    return Err(ApiError::BadRequest(format!("questionCount must be between 1 and {MAX_QUESTIONS}")));
  }
  if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&option_count) {
    return Err(ApiError::BadRequest(format!("optionCount must be between {MIN_OPTIONS} and {MAX_OPTIONS}")));
  }
  Ok(QuizShape::new(question_count, option_count))
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use super::*;
  use crate::config::QuizConfig;
  use crate::enrichment::NoSentences;

  fn state() -> AppState {
    AppState::from_parts(QuizConfig::default(), Arc::new(NoSentences), false)
  }

  #[test]
  fn cards_flag_lessons_too_small_for_a_quiz() {
    let cards = lesson_cards(&state());
    let greetings = cards.iter().find(|c| c.id == "greetings").unwrap();
    assert!(!greetings.quiz_ready);
    let animals = cards.iter().find(|c| c.id == "animals").unwrap();
    assert!(animals.quiz_ready);
    assert_eq!(animals.illustrated_count, animals.word_count);
  }

  #[test]
  fn search_matches_surface_form_and_translation() {
    let st = state();
    let by_english = list_words(&st, Some("  APP "));
    assert_eq!(by_english.query.as_deref(), Some("app"));
    assert!(by_english.results.iter().any(|h| h.word.surface_form == "apple" && h.lesson_id == "fruits"));

    let by_chinese = list_words(&st, Some("猴"));
    assert_eq!(by_chinese.results.len(), 1);
    assert_eq!(by_chinese.results[0].word.surface_form, "monkey");

    assert!(list_words(&st, Some("zzz")).results.is_empty());
  }

  #[test]
  fn index_groups_words_by_initial() {
    let out = list_words(&state(), None);
    assert!(out.results.is_empty());
    assert_eq!(out.alphabet.first().map(String::as_str), Some("A"));
    let c_words: Vec<&str> = out.groups["C"].iter().map(|h| h.word.surface_form.as_str()).collect();
    assert_eq!(c_words, vec!["cat", "cow"]);
    assert!(out.alphabet.windows(2).all(|w| w[0] < w[1]));
  }

  #[test]
  fn blank_query_falls_back_to_index() {
    let out = list_words(&state(), Some("   "));
    assert!(out.query.is_none());
    assert!(!out.groups.is_empty());
  }

  #[test]
  fn shape_defaults_and_bounds() {
    let d = QuizDefaults::default();
    assert_eq!(resolve_shape(&d, None, None).unwrap(), QuizShape::default());
    assert_eq!(resolve_shape(&d, Some(3), Some(4)).unwrap(), QuizShape::new(3, 4));
    assert!(matches!(resolve_shape(&d, Some(0), None), Err(ApiError::BadRequest(_))));
    assert!(matches!(resolve_shape(&d, None, Some(1)), Err(ApiError::BadRequest(_))));
    assert!(matches!(resolve_shape(&d, None, Some(MAX_OPTIONS + 1)), Err(ApiError::BadRequest(_))));
  }
}
