//! Application state: lesson catalog, hosted quiz sessions, and collaborators.
//!
//! This module owns:
//!   - the lesson catalog (built-in seeds + lessons from TOML)
//!   - the registry of HTTP-hosted sessions (by session id)
//!   - the sentence source (OpenAI when configured, otherwise none)
//!   - quiz defaults and speech settings
//!
//! WebSocket connections build their own sessions through `new_session` and keep
//! them outside the registry, one per connection.

use std::{collections::HashMap, collections::HashSet, sync::Arc, time::Instant};

use rand::{rngs::StdRng, SeedableRng};
use tokio::{sync::RwLock, task::JoinHandle};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::{load_quiz_config_from_env, QuizConfig, QuizDefaults, SessionLimits, SpeechSettings};
use crate::controller::SessionController;
use crate::domain::Lesson;
use crate::enrichment::{LogSpeaker, ModelSentences, NoSentences, SentenceSource, Speaker};
use crate::error::ApiError;
use crate::openai::OpenAI;
use crate::quiz::{generate, QuizShape};
use crate::seeds::seed_lessons;
use crate::session::{QuizSession, SessionStatus};

/// A session kept in the registry, with what is needed to restart it.
#[derive(Clone)]
pub struct HostedSession {
    pub lesson_id: String,
    pub shape: QuizShape,
    pub controller: Arc<SessionController>,
    pub last_seen: Instant,
}

#[derive(Clone)]
pub struct AppState {
    pub lessons: Arc<Vec<Lesson>>,
    pub sessions: Arc<RwLock<HashMap<String, HostedSession>>>,
    pub sentences: Arc<dyn SentenceSource>,
    /// Speaker for registry sessions; their clients play audio themselves.
    pub speaker: Arc<dyn Speaker>,
    pub defaults: QuizDefaults,
    pub speech: SpeechSettings,
    pub limits: SessionLimits,
    pub sentences_enabled: bool,
}

impl AppState {
    /// Build state from env: load config, merge lessons, init OpenAI.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_quiz_config_from_env().unwrap_or_default();

        match OpenAI::from_env() {
            Some(oa) => {
                info!(target: "vocab_quiz", base_url = %oa.base_url, fast_model = %oa.fast_model, "OpenAI enabled for example sentences.");
                let prompts = Arc::new(cfg.prompts.clone());
                Self::from_parts(cfg, Arc::new(ModelSentences::new(oa, prompts)), true)
            }
            None => {
                info!(target: "vocab_quiz", "OpenAI disabled (no OPENAI_API_KEY). Example sentences unavailable.");
                Self::from_parts(cfg, Arc::new(NoSentences), false)
            }
        }
    }

    pub fn from_parts(cfg: QuizConfig, sentences: Arc<dyn SentenceSource>, sentences_enabled: bool) -> Self {
        let lessons = merge_lessons(seed_lessons(), cfg.lessons);
        for l in &lessons {
            info!(target: "vocab_quiz", lesson = %l.id, words = l.words.len(), illustrated = l.illustrated_count(), "Lesson available");
        }
        Self {
            lessons: Arc::new(lessons),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            sentences,
            speaker: Arc::new(LogSpeaker),
            defaults: cfg.quiz,
            speech: cfg.speech,
            limits: cfg.sessions,
            sentences_enabled,
        }
    }

    pub fn lesson(&self, id: &str) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id == id)
    }

    /// Generate questions for `lesson_id` and start a controller on them.
    /// A `seed` makes the quiz reproducible.
    #[instrument(level = "info", skip(self, speaker))]
    pub fn new_session(
        &self,
        lesson_id: &str,
        shape: QuizShape,
        seed: Option<u64>,
        speaker: Arc<dyn Speaker>,
    ) -> Result<Arc<SessionController>, ApiError> {
        let lesson = self
            .lesson(lesson_id)
            .ok_or_else(|| ApiError::UnknownLesson(lesson_id.to_string()))?;
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let questions = generate(lesson, shape, &mut rng);
        Ok(SessionController::start(
            QuizSession::new(lesson.id.clone(), questions),
            self.sentences.clone(),
            speaker,
            self.speech.clone(),
        ))
    }

    /// Start a session and keep it in the registry under a fresh id.
    pub async fn host_session(
        &self,
        lesson_id: &str,
        shape: QuizShape,
        seed: Option<u64>,
    ) -> Result<(String, Arc<SessionController>), ApiError> {
        let controller = self.new_session(lesson_id, shape, seed, self.speaker.clone())?;
        let id = Uuid::new_v4().to_string();
        let hosted = HostedSession {
            lesson_id: lesson_id.to_string(),
            shape,
            controller: controller.clone(),
            last_seen: Instant::now(),
        };
        self.sessions.write().await.insert(id.clone(), hosted);
        info!(target: "quiz", session_id = %id, %lesson_id, "Session hosted");
        Ok((id, controller))
    }

    /// Look up a hosted session and mark it as used.
    pub async fn session(&self, id: &str) -> Result<Arc<SessionController>, ApiError> {
        let mut sessions = self.sessions.write().await;
        let hosted = sessions
            .get_mut(id)
            .ok_or_else(|| ApiError::UnknownSession(id.to_string()))?;
        hosted.last_seen = Instant::now();
        Ok(hosted.controller.clone())
    }

    /// Replace a hosted session with a new one on the same lesson and shape.
    pub async fn restart_session(&self, id: &str) -> Result<(String, Arc<SessionController>), ApiError> {
        let old = self
            .sessions
            .write()
            .await
            .remove(id)
            .ok_or_else(|| ApiError::UnknownSession(id.to_string()))?;
        self.host_session(&old.lesson_id, old.shape, None).await
    }

    /// Drop a hosted session. Returns whether it existed.
    pub async fn discard_session(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            info!(target: "quiz", session_id = %id, "Session discarded");
        }
        removed
    }

    /// Drop hosted sessions unused for longer than their limit: `completed_ttl`
    /// once the quiz is over (or had no questions), `idle_ttl` otherwise.
    /// Returns how many were removed.
    pub async fn evict_stale_sessions(&self, now: Instant) -> usize {
        let limits = self.limits;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, hosted| {
            let ttl = match hosted.controller.status() {
                SessionStatus::Active => limits.idle_ttl(),
                SessionStatus::Completed | SessionStatus::Empty => limits.completed_ttl(),
            };
            let keep = now.saturating_duration_since(hosted.last_seen) < ttl;
            if !keep {
                debug!(target: "quiz", session_id = %id, lesson = %hosted.lesson_id, "Evicting stale session");
            }
            keep
        });
        before - sessions.len()
    }

    /// Periodically evict stale hosted sessions for the lifetime of the process.
    pub fn spawn_session_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let state = Arc::clone(self);
        let every = self.limits.sweep_every();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let evicted = state.evict_stale_sessions(Instant::now()).await;
                if evicted > 0 {
                    let remaining = state.sessions.read().await.len();
                    info!(target: "quiz", evicted, remaining, "Stale sessions evicted");
                }
            }
        })
    }
}

/// Built-in lessons first; config lessons are appended unless their id is taken.
/// Repeated surface forms inside a lesson are dropped (word identity must be unique).
fn merge_lessons(builtin: Vec<Lesson>, extra: Vec<Lesson>) -> Vec<Lesson> {
    let mut out = builtin;
    for mut lesson in extra {
        if out.iter().any(|l| l.id == lesson.id) {
            warn!(target: "vocab_quiz", lesson = %lesson.id, "Config lesson id already in use; skipped");
            continue;
        }
        let mut seen = HashSet::new();
        let before = lesson.words.len();
        lesson.words.retain(|w| seen.insert(w.surface_form.clone()));
        if lesson.words.len() != before {
            warn!(target: "vocab_quiz", lesson = %lesson.id, dropped = before - lesson.words.len(), "Duplicate words removed from config lesson");
        }
        out.push(lesson);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::config::parse_quiz_config;

    fn state() -> AppState {
        AppState::from_parts(QuizConfig::default(), Arc::new(NoSentences), false)
    }

    #[test]
    fn config_lessons_are_merged_without_overriding_builtins() {
        let cfg = parse_quiz_config(
            r#"
              [[lessons]]
              id = "animals"
              title = "Not the real animals"

              [[lessons]]
              id = "colors"
              title = "Colors"
              words = [
                { surfaceForm = "red", grammaticalCategory = "adjective", translation = "红色" },
                { surfaceForm = "red", grammaticalCategory = "adjective", translation = "红" },
                { surfaceForm = "blue", grammaticalCategory = "adjective", translation = "蓝色" },
              ]
            "#,
        )
        .unwrap();
        let st = AppState::from_parts(cfg, Arc::new(NoSentences), false);
        assert_eq!(st.lesson("animals").unwrap().title, "Animals");
        let colors = st.lesson("colors").unwrap();
        assert_eq!(colors.words.len(), 2);
        assert_eq!(colors.words[0].translation, "红色");
    }

    #[tokio::test]
    async fn seeded_sessions_are_reproducible() {
        let st = state();
        let a = st.new_session("animals", QuizShape::default(), Some(5), st.speaker.clone()).unwrap();
        let b = st.new_session("animals", QuizShape::default(), Some(5), st.speaker.clone()).unwrap();
        assert_eq!(a.snapshot().await.question, b.snapshot().await.question);
    }

    #[tokio::test]
    async fn small_lesson_starts_empty() {
        let st = state();
        let ctl = st.new_session("greetings", QuizShape::default(), None, st.speaker.clone()).unwrap();
        assert_eq!(ctl.snapshot().await.status, SessionStatus::Empty);
    }

    #[tokio::test]
    async fn registry_restart_and_discard() {
        let st = state();
        let (id, _) = st.host_session("fruits", QuizShape::new(3, 4), Some(1)).await.unwrap();
        assert!(st.session(&id).await.is_ok());

        let (new_id, ctl) = st.restart_session(&id).await.unwrap();
        assert_ne!(id, new_id);
        assert!(matches!(st.session(&id).await, Err(ApiError::UnknownSession(_))));
        let snap = ctl.snapshot().await;
        assert_eq!(snap.total, 3);
        assert_eq!(snap.question.unwrap().options.len(), 4);

        assert!(st.discard_session(&new_id).await);
        assert!(!st.discard_session(&new_id).await);
    }

    #[test]
    fn unknown_lesson_is_rejected() {
        let st = state();
        let err = st.new_session("dinosaurs", QuizShape::default(), None, st.speaker.clone()).err();
        assert!(matches!(err, Some(ApiError::UnknownLesson(_))));
    }

    #[tokio::test]
    async fn stale_and_completed_sessions_are_evicted() {
        let cfg = parse_quiz_config("[sessions]\nidle_ttl_secs = 600\ncompleted_ttl_secs = 60").unwrap();
        let st = AppState::from_parts(cfg, Arc::new(NoSentences), false);

        let (done_id, done) = st.host_session("fruits", QuizShape::new(1, 4), Some(2)).await.unwrap();
        let answer = done.snapshot().await.question.unwrap().prompt_word.surface_form;
        done.submit_option(&answer).await.unwrap();
        done.advance().await.unwrap();
        let (open_id, _) = st.host_session("animals", QuizShape::new(3, 4), Some(2)).await.unwrap();

        let start = Instant::now();
        assert_eq!(st.evict_stale_sessions(start).await, 0);

        assert_eq!(st.evict_stale_sessions(start + Duration::from_secs(120)).await, 1);
        assert!(matches!(st.session(&done_id).await, Err(ApiError::UnknownSession(_))));

        // Lookup refreshes the idle clock.
        st.session(&open_id).await.unwrap();
        let touched = Instant::now();
        assert_eq!(st.evict_stale_sessions(touched + Duration::from_secs(500)).await, 0);
        assert_eq!(st.evict_stale_sessions(touched + Duration::from_secs(700)).await, 1);
        assert!(st.sessions.read().await.is_empty());
    }
}
