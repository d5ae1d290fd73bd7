//! In-process fake of the player's HTTP control API
//!
//! `/current` serves a scripted sequence of status bodies. Each poll consumes
//! one entry; the last entry repeats forever. `/play` and `/pause` are counted
//! and recorded in the shared [`Journal`], and answer 500 while
//! [`FakePlayer::fail_controls`] is on. `/art` serves cover art bytes, or 404
//! when none are set.

use super::Journal;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// Status body for track `id`, as the player reports it
pub fn status(id: &str, title: &str, artists: &str, image: &str) -> Value {
    json!({
        "title": title,
        "artists": artists,
        "artist": artists,
        "album": "",
        "status": "playing",
        "url": format!("https://tidal.com/browse/track/{}?u", id),
        "currentInSeconds": 5,
        "durationInSeconds": 0,
        "image": image,
    })
}

#[derive(Default)]
struct PlayerState {
    statuses: Mutex<VecDeque<Value>>,
    art: Mutex<Option<Vec<u8>>>,
    polls: AtomicUsize,
    plays: AtomicUsize,
    pauses: AtomicUsize,
    fail_controls: AtomicBool,
    journal: Journal,
}

/// Running fake player bound to an ephemeral localhost port
pub struct FakePlayer {
    base_url: String,
    state: Arc<PlayerState>,
    server: JoinHandle<()>,
}

impl FakePlayer {
    pub async fn start(journal: Journal) -> Self {
        let state = Arc::new(PlayerState {
            journal,
            ..Default::default()
        });

        let router = Router::new()
            .route("/current", get(current))
            .route("/play", get(play))
            .route("/pause", get(pause))
            .route("/art", get(art))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake player");
        let addr = listener.local_addr().expect("fake player address");

        let server = tokio::spawn(async move {
            axum::serve(listener, router).await.expect("fake player server");
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
            server,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn art_url(&self) -> String {
        format!("{}/art", self.base_url)
    }

    /// Replace the remaining `/current` responses
    pub fn script(&self, statuses: impl IntoIterator<Item = Value>) {
        let mut queue = self.state.statuses.lock().unwrap();
        queue.clear();
        queue.extend(statuses);
    }

    /// Make `/play` and `/pause` answer 500
    pub fn fail_controls(&self, fail: bool) {
        self.state.fail_controls.store(fail, Ordering::SeqCst);
    }

    pub fn set_art(&self, art: Option<Vec<u8>>) {
        *self.state.art.lock().unwrap() = art;
    }

    pub fn polls(&self) -> usize {
        self.state.polls.load(Ordering::SeqCst)
    }

    pub fn plays(&self) -> usize {
        self.state.plays.load(Ordering::SeqCst)
    }

    pub fn pauses(&self) -> usize {
        self.state.pauses.load(Ordering::SeqCst)
    }
}

impl Drop for FakePlayer {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn current(State(state): State<Arc<PlayerState>>) -> Json<Value> {
    state.polls.fetch_add(1, Ordering::SeqCst);
    let body = {
        let mut statuses = state.statuses.lock().unwrap();
        if statuses.len() > 1 {
            statuses.pop_front().unwrap_or(Value::Null)
        } else {
            statuses.front().cloned().unwrap_or(Value::Null)
        }
    };
    Json(body)
}

async fn play(State(state): State<Arc<PlayerState>>) -> StatusCode {
    state.plays.fetch_add(1, Ordering::SeqCst);
    state.journal.record("play");
    control_status(&state)
}

async fn pause(State(state): State<Arc<PlayerState>>) -> StatusCode {
    state.pauses.fetch_add(1, Ordering::SeqCst);
    state.journal.record("pause");
    control_status(&state)
}

fn control_status(state: &PlayerState) -> StatusCode {
    if state.fail_controls.load(Ordering::SeqCst) {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    }
}

async fn art(State(state): State<Arc<PlayerState>>) -> Response {
    let art = state.art.lock().unwrap().clone();
    match art {
        Some(bytes) => ([(header::CONTENT_TYPE, "image/png")], bytes).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
