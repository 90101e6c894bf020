//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Lesson, WordEntry};
use crate::enrichment::Utterance;
use crate::session::{QuizSummary, SessionSnapshot};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    StartQuiz(StartQuizIn),
    SubmitAnswer {
        #[serde(rename = "surfaceForm")]
        surface_form: String,
    },
    Advance,
    /// New quiz on the same lesson; the current one is discarded.
    Restart,
    /// Back to the menu; the current quiz is discarded.
    Quit,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Snapshot {
        session: SessionSnapshotOut,
    },
    Speak(Utterance),
    Completed {
        summary: QuizSummary,
    },
    Closed,
    Error {
        message: String,
    },
}

/// Session state as delivered to clients (HTTP and WS).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshotOut {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Instruction line for the current question kind.
    pub instruction: Option<&'static str>,
    #[serde(flatten)]
    pub snapshot: SessionSnapshot,
}

pub fn to_session_out(session_id: Option<String>, snapshot: SessionSnapshot) -> SessionSnapshotOut {
    SessionSnapshotOut {
        session_id,
        instruction: snapshot.question.as_ref().map(|q| q.kind.instruction()),
        snapshot,
    }
}

//
// Lessons and words
//

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonCardOut {
    pub id: String,
    pub title: String,
    pub icon_glyph: String,
    pub theme_color: String,
    pub word_count: usize,
    pub illustrated_count: usize,
    /// Whether the default quiz settings can produce questions for this lesson.
    pub quiz_ready: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordOut {
    pub surface_form: String,
    pub grammatical_category: String,
    pub translation: String,
    pub pinyin: String,
    pub illustration: Option<String>,
}

pub fn to_word_out(w: &WordEntry) -> WordOut {
    WordOut {
        surface_form: w.surface_form.clone(),
        grammatical_category: w.grammatical_category.clone(),
        translation: w.translation.clone(),
        pinyin: crate::pinyin::gloss_pinyin(&w.translation),
        illustration: w.illustration.clone(),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonDetailOut {
    pub id: String,
    pub title: String,
    pub icon_glyph: String,
    pub theme_color: String,
    pub words: Vec<WordOut>,
}

pub fn to_lesson_detail(l: &Lesson) -> LessonDetailOut {
    LessonDetailOut {
        id: l.id.clone(),
        title: l.title.clone(),
        icon_glyph: l.icon_glyph.clone(),
        theme_color: l.theme_color.clone(),
        words: l.words.iter().map(to_word_out).collect(),
    }
}

#[derive(Debug, Deserialize)]
pub struct WordsQuery {
    pub q: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordHitOut {
    pub lesson_id: String,
    #[serde(flatten)]
    pub word: WordOut,
}

/// Either search results (`query` set) or the full word list grouped by initial.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordsOut {
    pub query: Option<String>,
    pub results: Vec<WordHitOut>,
    pub groups: BTreeMap<String, Vec<WordHitOut>>,
    pub alphabet: Vec<String>,
}

//
// Quiz
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartQuizIn {
    pub lesson_id: String,
    #[serde(default)]
    pub question_count: Option<usize>,
    #[serde(default)]
    pub option_count: Option<usize>,
    /// Fixed seed for a reproducible quiz.
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerIn {
    pub surface_form: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub sentences: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_quiz_ws_message_is_flat() {
        let msg: ClientWsMessage =
            serde_json::from_str(r#"{"type":"start_quiz","lessonId":"animals","optionCount":4}"#).unwrap();
        match msg {
            ClientWsMessage::StartQuiz(start) => {
                assert_eq!(start.lesson_id, "animals");
                assert_eq!(start.option_count, Some(4));
                assert_eq!(start.question_count, None);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn speak_message_carries_voice() {
        let msg = ServerWsMessage::Speak(Utterance { text: "cat".into(), locale: "en-US".into(), rate: 0.5 });
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v, serde_json::json!({ "type": "speak", "text": "cat", "locale": "en-US", "rate": 0.5 }));
    }

    #[test]
    fn word_out_includes_pinyin() {
        let w = WordEntry::new("apple", "noun", "苹果", Some("🍎"));
        assert_eq!(to_word_out(&w).pinyin, "píng guǒ");
    }
}
