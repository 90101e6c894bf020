//! Async session controller: serializes transitions on one `QuizSession`,
//! runs the per-answer enrichment in the background, and publishes a snapshot
//! after every change.
//!
//! Enrichment is never cancelled. Each request carries the question index it was
//! issued for; the session drops the result if it arrives after an advance.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, info, instrument, warn};

use crate::config::SpeechSettings;
use crate::domain::{QuestionKind, WordEntry};
use crate::enrichment::{SentenceSource, Speaker, Utterance};
use crate::error::SessionError;
use crate::session::{Advance, Enrichment, EnrichmentTicket, QuizSession, SessionSnapshot, SessionStatus, Submission};

pub struct SessionController {
  session: Mutex<QuizSession>,
  sentences: Arc<dyn SentenceSource>,
  speaker: Arc<dyn Speaker>,
  voice: SpeechSettings,
  updates: watch::Sender<SessionSnapshot>,
}

impl SessionController {
  /// Take ownership of a freshly generated session. If the first question is a
  /// listening question its word is spoken right away.
  pub fn start(
    session: QuizSession,
    sentences: Arc<dyn SentenceSource>,
    speaker: Arc<dyn Speaker>,
    voice: SpeechSettings,
  ) -> Arc<Self> {
    let snapshot = session.snapshot();
    info!(target: "quiz", lesson = %snapshot.lesson_id, total = snapshot.total, status = ?snapshot.status, "Quiz session started");
    let (updates, _) = watch::channel(snapshot.clone());
    let ctl = Arc::new(Self { session: Mutex::new(session), sentences, speaker, voice, updates });
    ctl.announce(&snapshot);
    ctl
  }

  /// Receives every published snapshot, including enrichment resolutions and completion.
  pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
    self.updates.subscribe()
  }

  pub async fn snapshot(&self) -> SessionSnapshot {
    self.session.lock().await.snapshot()
  }

  /// Status of the last published snapshot. Does not wait for the session lock.
  pub fn status(&self) -> SessionStatus {
    self.updates.borrow().status
  }

  /// Submit the option whose surface form matches, looked up among the current options.
  /// Lookup and submission happen under one lock, so the word is always checked
  /// against the question it is recorded on.
  pub async fn submit_option(self: &Arc<Self>, surface_form: &str) -> Result<SessionSnapshot, SessionError> {
    let (snapshot, ticket) = {
      let mut s = self.session.lock().await;
      let word = match s.current_question() {
        Some(q) => q.option(surface_form).cloned(),
        None if s.total() == 0 => return Err(SessionError::NoQuestions),
        None => return Err(SessionError::Completed),
      };
      let word = word.ok_or_else(|| SessionError::NotAnOption(surface_form.to_string()))?;
      self.record_answer(&mut s, &word)?
    };
    self.spawn_enrichment(ticket);
    Ok(snapshot)
  }

  /// Lock in an answer. Duplicate submissions return the unchanged snapshot.
  #[instrument(level = "debug", skip(self, word), fields(word = %word.surface_form))]
  pub async fn submit_answer(self: &Arc<Self>, word: &WordEntry) -> Result<SessionSnapshot, SessionError> {
    let (snapshot, ticket) = {
      let mut s = self.session.lock().await;
      self.record_answer(&mut s, word)?
    };
    self.spawn_enrichment(ticket);
    Ok(snapshot)
  }

  /// Apply the submission on the locked session and publish it if accepted.
  fn record_answer(
    &self,
    s: &mut QuizSession,
    word: &WordEntry,
  ) -> Result<(SessionSnapshot, Option<EnrichmentTicket>), SessionError> {
    match s.submit_answer(word)? {
      Submission::Ignored => {
        debug!(target: "quiz", word = %word.surface_form, "Question already answered; submission ignored");
        Ok((s.snapshot(), None))
      }
      Submission::Accepted { correct, ticket } => {
        info!(target: "quiz", index = ticket.question_index, %correct, score = s.score(), "Answer recorded");
        let snapshot = s.snapshot();
        self.updates.send_replace(snapshot.clone());
        Ok((snapshot, Some(ticket)))
      }
    }
  }

  fn spawn_enrichment(self: &Arc<Self>, ticket: Option<EnrichmentTicket>) {
    if let Some(ticket) = ticket {
      let this = Arc::clone(self);
      tokio::spawn(async move { this.enrich(ticket).await });
    }
  }

  async fn enrich(&self, ticket: EnrichmentTicket) {
    let sentence = match self.sentences.example_sentence(&ticket.word).await {
      Ok(s) => s,
      Err(e) => {
        warn!(target: "enrichment", word = %ticket.word.surface_form, error = %e, "Example sentence unavailable");
        None
      }
    };

    let ready = {
      let mut s = self.session.lock().await;
      if !s.resolve_enrichment(ticket.question_index, sentence) {
        debug!(target: "enrichment", index = ticket.question_index, "Stale enrichment result discarded");
        return;
      }
      self.updates.send_replace(s.snapshot());
      match s.enrichment() {
        Enrichment::Ready(sentence) => Some(sentence.clone()),
        _ => None,
      }
    };

    if let Some(sentence) = ready {
      self.speaker.speak(Utterance::new(sentence, &self.voice));
    }
  }

  /// Move on. The final advance completes the session and returns the summary.
  #[instrument(level = "debug", skip(self))]
  pub async fn advance(&self) -> Result<Advance, SessionError> {
    let (outcome, snapshot) = {
      let mut s = self.session.lock().await;
      let outcome = s.advance()?;
      (outcome, s.snapshot())
    };
    match &outcome {
      Advance::Next { index } => debug!(target: "quiz", index, "Advanced to next question"),
      Advance::Completed(summary) => {
        info!(target: "quiz", score = summary.score, total = summary.total, "Quiz completed")
      }
    }
    self.updates.send_replace(snapshot.clone());
    self.announce(&snapshot);
    Ok(outcome)
  }

  fn announce(&self, snapshot: &SessionSnapshot) {
    if let Some(q) = &snapshot.question {
      if q.kind == QuestionKind::IdentifyFromAudio {
        self.speaker.speak(Utterance::new(q.prompt_word.surface_form.clone(), &self.voice));
      }
    }
  }
}
