//! WebSocket upgrade + message loop. One connection drives at most one quiz.
//! Client messages are parsed as JSON and forwarded to the session controller;
//! snapshots and utterances are pushed as the controller publishes them.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, instrument};

use crate::controller::SessionController;
use crate::enrichment::{ChannelSpeaker, Utterance};
use crate::error::ApiError;
use crate::logic::resolve_shape;
use crate::protocol::{to_session_out, ClientWsMessage, ServerWsMessage};
use crate::quiz::QuizShape;
use crate::session::{Advance, SessionSnapshot};
use crate::state::AppState;

/// The quiz bound to a connection. Each quiz gets its own speech channel so a
/// discarded quiz can never speak into its successor.
struct ActiveQuiz {
  lesson_id: String,
  shape: QuizShape,
  controller: Arc<SessionController>,
  updates: watch::Receiver<SessionSnapshot>,
  speech: mpsc::UnboundedReceiver<Utterance>,
}

enum QuizEvent {
  Update,
  Speak(Utterance),
  Ended,
}

enum Event {
  Client(Option<Result<Message, axum::Error>>),
  Quiz(QuizEvent),
}

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "vocab_quiz", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "vocab_quiz", "WebSocket connected");
  let mut quiz: Option<ActiveQuiz> = None;

  loop {
    let event = tokio::select! {
      msg = socket.recv() => Event::Client(msg),
      ev = next_quiz_event(&mut quiz) => Event::Quiz(ev),
    };

    let replies = match event {
      Event::Client(Some(Ok(Message::Text(txt)))) => match serde_json::from_str::<ClientWsMessage>(&txt) {
        Ok(incoming) => {
          debug!(target: "vocab_quiz", "WS received: {:?}", &incoming);
          handle_client_ws(incoming, &state, &mut quiz).await
        }
        Err(e) => vec![ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }],
      },
      Event::Client(Some(Ok(Message::Ping(payload)))) => {
        let _ = socket.send(Message::Pong(payload)).await;
        continue;
      }
      Event::Client(Some(Ok(Message::Close(_)))) | Event::Client(None) => break,
      Event::Client(Some(Err(e))) => {
        debug!(target: "vocab_quiz", error = %e, "WS receive error");
        break;
      }
      Event::Client(Some(Ok(_))) => continue,
      Event::Quiz(QuizEvent::Update) => match quiz.as_mut() {
        Some(q) => {
          let snapshot = q.updates.borrow_and_update().clone();
          vec![ServerWsMessage::Snapshot { session: to_session_out(None, snapshot) }]
        }
        None => continue,
      },
      Event::Quiz(QuizEvent::Speak(utterance)) => vec![ServerWsMessage::Speak(utterance)],
      Event::Quiz(QuizEvent::Ended) => {
        quiz = None;
        continue;
      }
    };

    if !send_all(&mut socket, replies).await {
      break;
    }
  }
  info!(target: "vocab_quiz", "WebSocket disconnected");
}

async fn send_all(socket: &mut WebSocket, replies: Vec<ServerWsMessage>) -> bool {
  for reply in replies {
    let out = serde_json::to_string(&reply).unwrap_or_else(|e| {
      serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
    });
    if let Err(e) = socket.send(Message::Text(out)).await {
      error!(target: "vocab_quiz", error = %e, "WS send error");
      return false;
    }
  }
  true
}

/// Next push for the bound quiz. Pending forever while no quiz is bound.
async fn next_quiz_event(quiz: &mut Option<ActiveQuiz>) -> QuizEvent {
  let Some(q) = quiz else {
    return std::future::pending().await;
  };
  tokio::select! {
    Some(utterance) = q.speech.recv() => QuizEvent::Speak(utterance),
    changed = q.updates.changed() => match changed {
      Ok(()) => QuizEvent::Update,
      Err(_) => QuizEvent::Ended,
    },
  }
}

fn start_quiz(state: &AppState, lesson_id: &str, shape: QuizShape, seed: Option<u64>) -> Result<ActiveQuiz, ApiError> {
  let (speaker, speech) = ChannelSpeaker::new();
  let controller = state.new_session(lesson_id, shape, seed, Arc::new(speaker))?;
  let updates = controller.subscribe();
  Ok(ActiveQuiz { lesson_id: lesson_id.to_string(), shape, controller, updates, speech })
}

/// Bind `active` to the connection and reply with its first snapshot.
fn bind(quiz: &mut Option<ActiveQuiz>, mut active: ActiveQuiz) -> ServerWsMessage {
  let snapshot = active.updates.borrow_and_update().clone();
  *quiz = Some(active);
  ServerWsMessage::Snapshot { session: to_session_out(None, snapshot) }
}

fn no_quiz() -> Vec<ServerWsMessage> {
  vec![ServerWsMessage::Error { message: "No active quiz. Send start_quiz first.".into() }]
}

fn error_reply(e: impl std::fmt::Display) -> Vec<ServerWsMessage> {
  vec![ServerWsMessage::Error { message: e.to_string() }]
}

/// Apply one client message. Session changes reach the client through the
/// snapshot stream, so successful answers and advances reply with nothing
/// beyond the completion summary.
#[instrument(level = "info", skip(state, quiz))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState, quiz: &mut Option<ActiveQuiz>) -> Vec<ServerWsMessage> {
  match msg {
    ClientWsMessage::Ping => vec![ServerWsMessage::Pong],

    ClientWsMessage::StartQuiz(start) => {
      let active = resolve_shape(&state.defaults, start.question_count, start.option_count)
        .and_then(|shape| start_quiz(state, &start.lesson_id, shape, start.seed));
      match active {
        Ok(active) => {
          info!(target: "quiz", lesson = %start.lesson_id, "WS quiz started");
          vec![bind(quiz, active)]
        }
        Err(e) => error_reply(e),
      }
    }

    ClientWsMessage::SubmitAnswer { surface_form } => {
      let Some(q) = quiz.as_ref() else { return no_quiz() };
      match q.controller.submit_option(&surface_form).await {
        Ok(_) => Vec::new(),
        Err(e) => error_reply(e),
      }
    }

    ClientWsMessage::Advance => {
      let Some(q) = quiz.as_ref() else { return no_quiz() };
      match q.controller.advance().await {
        Ok(Advance::Completed(summary)) => vec![ServerWsMessage::Completed { summary }],
        Ok(Advance::Next { .. }) => Vec::new(),
        Err(e) => error_reply(e),
      }
    }

    ClientWsMessage::Restart => {
      let Some(old) = quiz.take() else { return no_quiz() };
      match start_quiz(state, &old.lesson_id, old.shape, None) {
        Ok(active) => {
          info!(target: "quiz", lesson = %old.lesson_id, "WS quiz restarted");
          vec![bind(quiz, active)]
        }
        Err(e) => error_reply(e),
      }
    }

    ClientWsMessage::Quit => {
      if quiz.take().is_some() {
        info!(target: "quiz", "WS quiz discarded");
      }
      vec![ServerWsMessage::Closed]
    }
  }
}
