//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{extract::{Path, Query, State}, http::StatusCode, response::IntoResponse, Json};
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::logic::*;
use crate::protocol::*;
use crate::session::Advance;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, sentences: state.sentences_enabled })
}

#[instrument(level = "info", skip(state))]
pub async fn http_list_lessons(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(lesson_cards(&state))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_lesson(
  State(state): State<Arc<AppState>>,
  Path(lesson_id): Path<String>,
) -> Result<Json<LessonDetailOut>, ApiError> {
  Ok(Json(lesson_detail(&state, &lesson_id)?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_list_words(
  State(state): State<Arc<AppState>>,
  Query(q): Query<WordsQuery>,
) -> impl IntoResponse {
  Json(list_words(&state, q.q.as_deref()))
}

#[instrument(level = "info", skip(state, body), fields(lesson_id = %body.lesson_id))]
pub async fn http_start_quiz(
  State(state): State<Arc<AppState>>,
  Json(body): Json<StartQuizIn>,
) -> Result<(StatusCode, Json<SessionSnapshotOut>), ApiError> {
  let shape = resolve_shape(&state.defaults, body.question_count, body.option_count)?;
  let (id, ctl) = state.host_session(&body.lesson_id, shape, body.seed).await?;
  let snapshot = ctl.snapshot().await;
  info!(target: "quiz", session_id = %id, total = snapshot.total, status = ?snapshot.status, "HTTP quiz started");
  Ok((StatusCode::CREATED, Json(to_session_out(Some(id), snapshot))))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_quiz(
  State(state): State<Arc<AppState>>,
  Path(session_id): Path<String>,
) -> Result<Json<SessionSnapshotOut>, ApiError> {
  let ctl = state.session(&session_id).await?;
  Ok(Json(to_session_out(Some(session_id), ctl.snapshot().await)))
}

#[instrument(level = "info", skip(state, body), fields(surface_form = %body.surface_form))]
pub async fn http_post_answer(
  State(state): State<Arc<AppState>>,
  Path(session_id): Path<String>,
  Json(body): Json<AnswerIn>,
) -> Result<Json<SessionSnapshotOut>, ApiError> {
  let ctl = state.session(&session_id).await?;
  let snapshot = ctl.submit_option(&body.surface_form).await?;
  info!(target: "quiz", %session_id, correct = ?snapshot.correct, score = snapshot.score, "HTTP answer submitted");
  Ok(Json(to_session_out(Some(session_id), snapshot)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_advance(
  State(state): State<Arc<AppState>>,
  Path(session_id): Path<String>,
) -> Result<Json<SessionSnapshotOut>, ApiError> {
  let ctl = state.session(&session_id).await?;
  if let Advance::Completed(summary) = ctl.advance().await? {
    info!(target: "quiz", %session_id, score = summary.score, total = summary.total, "HTTP quiz completed");
  }
  Ok(Json(to_session_out(Some(session_id), ctl.snapshot().await)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_restart(
  State(state): State<Arc<AppState>>,
  Path(session_id): Path<String>,
) -> Result<(StatusCode, Json<SessionSnapshotOut>), ApiError> {
  let (id, ctl) = state.restart_session(&session_id).await?;
  Ok((StatusCode::CREATED, Json(to_session_out(Some(id), ctl.snapshot().await))))
}

#[instrument(level = "info", skip(state))]
pub async fn http_discard_quiz(
  State(state): State<Arc<AppState>>,
  Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
  if state.discard_session(&session_id).await {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::UnknownSession(session_id))
  }
}

#[cfg(test)]
mod tests {
  use axum::body::Body;
  use axum::http::{Method, Request};
  use axum::Router;
  use serde_json::{json, Value};
  use tower::ServiceExt;

  use super::*;
  use crate::config::QuizConfig;
  use crate::enrichment::NoSentences;
  use crate::routes::build_router;

  fn app() -> Router {
    let state = AppState::from_parts(QuizConfig::default(), Arc::new(NoSentences), false);
    build_router(Arc::new(state))
  }

  async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
      Some(v) => builder
        .header("content-type", "application/json")
        .body(Body::from(v.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
  }

  fn prompt_of(snapshot: &Value) -> String {
    snapshot["question"]["promptWord"]["surfaceForm"].as_str().unwrap().to_string()
  }

  fn wrong_of(snapshot: &Value) -> String {
    let prompt = prompt_of(snapshot);
    snapshot["question"]["options"]
      .as_array()
      .unwrap()
      .iter()
      .map(|o| o["surfaceForm"].as_str().unwrap().to_string())
      .find(|s| *s != prompt)
      .unwrap()
  }

  async fn start(app: &Router, body: Value) -> (String, Value) {
    let (status, snap) = call(app, Method::POST, "/api/v1/quiz", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    (snap["sessionId"].as_str().unwrap().to_string(), snap)
  }

  #[tokio::test]
  async fn health_reports_sentence_support() {
    let (status, body) = call(&app(), Method::GET, "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true, "sentences": false }));
  }

  #[tokio::test]
  async fn lessons_and_lesson_detail() {
    let app = app();
    let (status, cards) = call(&app, Method::GET, "/api/v1/lessons", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(cards.as_array().unwrap().iter().any(|c| c["id"] == "fruits" && c["quizReady"] == true));

    let (status, detail) = call(&app, Method::GET, "/api/v1/lessons/fruits", None).await;
    assert_eq!(status, StatusCode::OK);
    let apple = detail["words"].as_array().unwrap().iter().find(|w| w["surfaceForm"] == "apple").unwrap();
    assert_eq!(apple["pinyin"], "píng guǒ");

    let (status, err) = call(&app, Method::GET, "/api/v1/lessons/space", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"], "unknown lesson: space");
  }

  #[tokio::test]
  async fn word_search_endpoint() {
    let (status, body) = call(&app(), Method::GET, "/api/v1/words?q=tiger", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"][0]["lessonId"], "animals");
    assert_eq!(body["results"][0]["translation"], "老虎");
  }

  #[tokio::test]
  async fn answer_then_advance() {
    let app = app();
    let (id, snap) = start(&app, json!({ "lessonId": "animals", "questionCount": 5, "optionCount": 5, "seed": 42 })).await;
    assert_eq!(snap["status"], "active");
    assert_eq!(snap["total"], 5);
    assert_eq!(snap["currentIndex"], 0);
    assert_eq!(snap["question"]["options"].as_array().unwrap().len(), 5);
    assert!(snap["instruction"].is_string());

    let uri = format!("/api/v1/quiz/{id}/advance");
    let (status, _) = call(&app, Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let answer_uri = format!("/api/v1/quiz/{id}/answer");
    let (status, answered) = call(&app, Method::POST, &answer_uri, Some(json!({ "surfaceForm": prompt_of(&snap) }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(answered["score"], 1);
    assert_eq!(answered["answered"], true);
    assert_eq!(answered["correct"], true);

    let (status, next) = call(&app, Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(next["currentIndex"], 1);
    assert_eq!(next["answered"], false);
    assert_eq!(next["enrichment"], json!({ "state": "idle" }));
  }

  #[tokio::test]
  async fn answer_must_be_an_option() {
    let app = app();
    let (id, _) = start(&app, json!({ "lessonId": "fruits", "seed": 1 })).await;
    let (status, err) = call(&app, Method::POST, &format!("/api/v1/quiz/{id}/answer"), Some(json!({ "surfaceForm": "rocket" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["error"].as_str().unwrap().contains("rocket"));
  }

  #[tokio::test]
  async fn full_quiz_reports_summary() {
    let app = app();
    let (id, mut snap) = start(&app, json!({ "lessonId": "feelings", "questionCount": 3, "optionCount": 4, "seed": 9 })).await;
    for i in 0..3 {
      let pick = if i == 0 { wrong_of(&snap) } else { prompt_of(&snap) };
      let (status, _) = call(&app, Method::POST, &format!("/api/v1/quiz/{id}/answer"), Some(json!({ "surfaceForm": pick }))).await;
      assert_eq!(status, StatusCode::OK);
      let (status, next) = call(&app, Method::POST, &format!("/api/v1/quiz/{id}/advance"), None).await;
      assert_eq!(status, StatusCode::OK);
      snap = next;
    }
    assert_eq!(snap["status"], "completed");
    assert_eq!(snap["summary"]["score"], 2);
    assert_eq!(snap["summary"]["total"], 3);
    assert_eq!(snap["summary"]["percentage"], 67);
    assert_eq!(snap["summary"]["message"], "Good Effort!");

    let (status, _) = call(&app, Method::POST, &format!("/api/v1/quiz/{id}/advance"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
  }

  #[tokio::test]
  async fn small_lesson_starts_in_empty_state() {
    let app = app();
    let (_, snap) = start(&app, json!({ "lessonId": "greetings" })).await;
    assert_eq!(snap["status"], "empty");
    assert_eq!(snap["total"], 0);
    assert!(snap["question"].is_null());
  }

  #[tokio::test]
  async fn invalid_shape_is_rejected() {
    let (status, _) = call(&app(), Method::POST, "/api/v1/quiz", Some(json!({ "lessonId": "animals", "optionCount": 1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn restart_and_discard() {
    let app = app();
    let (id, _) = start(&app, json!({ "lessonId": "animals", "questionCount": 4 })).await;

    let (status, restarted) = call(&app, Method::POST, &format!("/api/v1/quiz/{id}/restart"), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(restarted["total"], 4);
    let new_id = restarted["sessionId"].as_str().unwrap().to_string();
    assert_ne!(new_id, id);

    let (status, _) = call(&app, Method::GET, &format!("/api/v1/quiz/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, Method::DELETE, &format!("/api/v1/quiz/{new_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, Method::DELETE, &format!("/api/v1/quiz/{new_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }
}
