//! Quiz session state machine.
//!
//! One `QuizSession` drives a learner through a fixed question sequence:
//! answer once, advance, repeat, then complete with `(score, total)`.
//! This type is synchronous; async enrichment lives in `controller`, which hands
//! results back through `resolve_enrichment` tagged with the question index.

use serde::Serialize;

use crate::domain::{Question, WordEntry};
use crate::error::SessionError;

/// Example-sentence state for the current question.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "sentence", rename_all = "snake_case")]
pub enum Enrichment {
  #[default]
  Idle,
  Pending,
  Ready(String),
  Unavailable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
  /// Generation produced nothing; the host shows an empty/loading state.
  Empty,
  Active,
  Completed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Position {
  At(usize),
  Completed,
}

/// Final result reported when the last question is advanced past.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSummary {
  pub score: usize,
  pub total: usize,
  pub percentage: u32,
  pub message: &'static str,
}

impl QuizSummary {
  pub fn new(score: usize, total: usize) -> Self {
    let percentage = if total > 0 {
      ((score as f64 / total as f64) * 100.0).round() as u32
    } else {
      0
    };
    let message = if percentage < 50 {
      "Keep Practicing!"
    } else if percentage < 80 {
      "Good Effort!"
    } else {
      "Great Job!"
    };
    Self { score, total, percentage, message }
  }
}

/// Issued by an accepted answer; names the question the enrichment belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnrichmentTicket {
  pub question_index: usize,
  pub word: WordEntry,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Submission {
  Accepted { correct: bool, ticket: EnrichmentTicket },
  /// The question was already answered; nothing changed.
  Ignored,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Advance {
  Next { index: usize },
  Completed(QuizSummary),
}

/// Read-only view of a session, published after every change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
  pub lesson_id: String,
  pub status: SessionStatus,
  pub current_index: Option<usize>,
  pub total: usize,
  pub score: usize,
  pub answered: bool,
  pub selected_answer: Option<WordEntry>,
  pub correct: Option<bool>,
  pub enrichment: Enrichment,
  pub question: Option<Question>,
  pub summary: Option<QuizSummary>,
}

#[derive(Debug)]
pub struct QuizSession {
  lesson_id: String,
  questions: Vec<Question>,
  position: Position,
  score: usize,
  selected: Option<WordEntry>,
  answered: bool,
  enrichment: Enrichment,
}

impl QuizSession {
  pub fn new(lesson_id: impl Into<String>, questions: Vec<Question>) -> Self {
    Self {
      lesson_id: lesson_id.into(),
      questions,
      position: Position::At(0),
      score: 0,
      selected: None,
      answered: false,
      enrichment: Enrichment::Idle,
    }
  }

  pub fn total(&self) -> usize { self.questions.len() }
  pub fn score(&self) -> usize { self.score }
  pub fn enrichment(&self) -> &Enrichment { &self.enrichment }

  pub fn status(&self) -> SessionStatus {
    if self.questions.is_empty() {
      SessionStatus::Empty
    } else if self.position == Position::Completed {
      SessionStatus::Completed
    } else {
      SessionStatus::Active
    }
  }

  pub fn current_index(&self) -> Option<usize> {
    match (self.status(), self.position) {
      (SessionStatus::Active, Position::At(i)) => Some(i),
      _ => None,
    }
  }

  pub fn current_question(&self) -> Option<&Question> {
    self.current_index().and_then(|i| self.questions.get(i))
  }

  fn ensure_active(&self) -> Result<(), SessionError> {
    match self.status() {
      SessionStatus::Empty => Err(SessionError::NoQuestions),
      SessionStatus::Completed => Err(SessionError::Completed),
      SessionStatus::Active => Ok(()),
    }
  }

  /// Lock in an answer for the current question.
  ///
  /// A second submission for the same question is `Ignored`. Enrichment moves to
  /// `Pending` before this returns; the caller fetches the sentence for the ticket.
  pub fn submit_answer(&mut self, word: &WordEntry) -> Result<Submission, SessionError> {
    self.ensure_active()?;
    if self.answered {
      return Ok(Submission::Ignored);
    }
    let (index, question) = match (self.current_index(), self.current_question()) {
      (Some(i), Some(q)) => (i, q),
      _ => return Err(SessionError::NoQuestions),
    };

    let correct = question.is_correct(word);
    let ticket = EnrichmentTicket { question_index: index, word: question.prompt_word.clone() };

    self.answered = true;
    self.selected = Some(word.clone());
    if correct {
      self.score += 1;
    }
    self.enrichment = Enrichment::Pending;
    Ok(Submission::Accepted { correct, ticket })
  }

  /// Move to the next question, or complete after the last one.
  pub fn advance(&mut self) -> Result<Advance, SessionError> {
    self.ensure_active()?;
    if !self.answered {
      return Err(SessionError::NotAnswered);
    }
    let index = self.current_index().ok_or(SessionError::NoQuestions)?;

    if index + 1 < self.questions.len() {
      self.position = Position::At(index + 1);
      self.selected = None;
      self.answered = false;
      self.enrichment = Enrichment::Idle;
      Ok(Advance::Next { index: index + 1 })
    } else {
      self.position = Position::Completed;
      Ok(Advance::Completed(QuizSummary::new(self.score, self.questions.len())))
    }
  }

  /// Apply an enrichment result issued for `question_index`.
  ///
  /// Results for a question the session has moved past (or that is no longer
  /// waiting) are dropped and `false` is returned. A missing or blank sentence
  /// becomes `Unavailable`.
  pub fn resolve_enrichment(&mut self, question_index: usize, sentence: Option<String>) -> bool {
    let waiting = self.current_index() == Some(question_index)
      && self.answered
      && self.enrichment == Enrichment::Pending;
    if !waiting {
      return false;
    }
    self.enrichment = match sentence.map(|s| s.trim().to_string()) {
      Some(s) if !s.is_empty() => Enrichment::Ready(s),
      _ => Enrichment::Unavailable,
    };
    true
  }

  pub fn summary(&self) -> Option<QuizSummary> {
    (self.status() == SessionStatus::Completed).then(|| QuizSummary::new(self.score, self.questions.len()))
  }

  pub fn snapshot(&self) -> SessionSnapshot {
    let question = self.current_question().cloned();
    let correct = match (&question, &self.selected) {
      (Some(q), Some(sel)) if self.answered => Some(q.is_correct(sel)),
      _ => None,
    };
    SessionSnapshot {
      lesson_id: self.lesson_id.clone(),
      status: self.status(),
      current_index: self.current_index(),
      total: self.total(),
      score: self.score,
      answered: self.answered,
      selected_answer: self.selected.clone(),
      correct,
      enrichment: self.enrichment.clone(),
      question,
      summary: self.summary(),
    }
  }
}
