//! Collaborators the session calls after an answer: the example-sentence source
//! and the utterance speaker.
//!
//! Sentence sources are async and may fail; the controller maps any failure to an
//! unavailable enrichment. Speakers are fire-and-forget: `speak` never blocks and
//! reports nothing back. Voice selection and cancel-then-speak belong to whoever
//! finally plays the audio.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

use crate::config::{Prompts, SpeechSettings};
use crate::domain::WordEntry;
use crate::error::EnrichmentError;
use crate::openai::OpenAI;

#[async_trait]
pub trait SentenceSource: Send + Sync {
  /// A short example sentence for `word`, or `None` when there is nothing to offer.
  async fn example_sentence(&self, word: &WordEntry) -> Result<Option<String>, EnrichmentError>;
}

/// Used when no model is configured: every enrichment ends up unavailable.
pub struct NoSentences;

#[async_trait]
impl SentenceSource for NoSentences {
  async fn example_sentence(&self, _word: &WordEntry) -> Result<Option<String>, EnrichmentError> {
    Ok(None)
  }
}

/// Example sentences generated by the chat model.
pub struct ModelSentences {
  openai: OpenAI,
  prompts: Arc<Prompts>,
}

impl ModelSentences {
  pub fn new(openai: OpenAI, prompts: Arc<Prompts>) -> Self {
    Self { openai, prompts }
  }
}

#[async_trait]
impl SentenceSource for ModelSentences {
  #[instrument(level = "info", skip(self, word), fields(word = %word.surface_form))]
  async fn example_sentence(&self, word: &WordEntry) -> Result<Option<String>, EnrichmentError> {
    self.openai.example_sentence(&self.prompts, word).await
  }
}

/// Text to be spoken, with the voice parameters to use.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Utterance {
  pub text: String,
  pub locale: String,
  pub rate: f32,
}

impl Utterance {
  pub fn new(text: impl Into<String>, voice: &SpeechSettings) -> Self {
    Self { text: text.into(), locale: voice.locale.clone(), rate: voice.rate }
  }
}

pub trait Speaker: Send + Sync {
  fn speak(&self, utterance: Utterance);
}

/// Records utterances in the log only. Used for HTTP-hosted sessions, whose
/// clients speak words themselves.
pub struct LogSpeaker;

impl Speaker for LogSpeaker {
  fn speak(&self, utterance: Utterance) {
    info!(target: "enrichment", locale = %utterance.locale, rate = utterance.rate, text_len = utterance.text.len(), "Utterance requested");
  }
}

/// Forwards utterances to one connected client (the WebSocket loop drains the receiver).
pub struct ChannelSpeaker {
  tx: mpsc::UnboundedSender<Utterance>,
}

impl ChannelSpeaker {
  pub fn new() -> (Self, mpsc::UnboundedReceiver<Utterance>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Self { tx }, rx)
  }
}

impl Speaker for ChannelSpeaker {
  fn speak(&self, utterance: Utterance) {
    if self.tx.send(utterance).is_err() {
      debug!(target: "enrichment", "Speaker channel closed; utterance dropped");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn channel_speaker_forwards_in_order() {
    let (speaker, mut rx) = ChannelSpeaker::new();
    let voice = SpeechSettings::default();
    speaker.speak(Utterance::new("cat", &voice));
    speaker.speak(Utterance::new("The cat sleeps.", &voice));
    assert_eq!(rx.recv().await.unwrap().text, "cat");
    let second = rx.recv().await.unwrap();
    assert_eq!(second.text, "The cat sleeps.");
    assert_eq!(second.locale, "en-US");
  }

  #[test]
  fn channel_speaker_tolerates_closed_receiver() {
    let (speaker, rx) = ChannelSpeaker::new();
    drop(rx);
    speaker.speak(Utterance::new("dog", &SpeechSettings::default()));
  }

  #[tokio::test]
  async fn no_sentences_yields_none() {
    let w = WordEntry::new("cat", "noun", "猫", Some("🐱"));
    assert_eq!(NoSentences.example_sentence(&w).await.unwrap(), None);
  }
}
