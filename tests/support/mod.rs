//! Shared test doubles: an in-memory voice gateway and a stub synthesis
//! engine speaking the VOICEVOX HTTP contract.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use tokio::sync::Notify;

use koelink::common::types::{ChannelId, GuildId};
use koelink::voice::gateway::{
    ChannelPermissions, GatewayError, PlaybackError, VoiceConnection, VoiceGateway,
};

/// Opt-in log output for debugging test runs: `RUST_LOG=debug cargo test`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

// ---------------------------------------------------------------------------
// Stub synthesis engine

#[derive(Default)]
pub struct StubEngineState {
    /// Texts seen by audio_query, in arrival order.
    pub texts: Mutex<Vec<String>>,
    /// Speakers seen by audio_query, in arrival order.
    pub speakers: Mutex<Vec<String>>,
}

pub const STUB_WAV: &[u8] = b"RIFFfakewav";

/// Serves `/audio_query` and `/synthesis` on an ephemeral port and returns
/// the base URL. Texts containing `FAILQUERY`/`FAILSYNTH` produce engine
/// errors; `SLOWSYNTH` delays the query step to simulate a slow render.
pub async fn spawn_stub_engine() -> (String, Arc<StubEngineState>) {
    let state = Arc::new(StubEngineState::default());
    let app = Router::new()
        .route("/audio_query", post(audio_query))
        .route("/synthesis", post(synthesis))
        .with_state(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/"), state)
}

async fn audio_query(
    State(state): State<Arc<StubEngineState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let text = params.get("text").cloned().unwrap_or_default();
    let speaker = params.get("speaker").cloned().unwrap_or_default();
    state.texts.lock().push(text.clone());
    state.speakers.lock().push(speaker.clone());

    if text.contains("FAILQUERY") {
        return (StatusCode::INTERNAL_SERVER_ERROR, "query boom").into_response();
    }
    if text.contains("SLOWSYNTH") {
        tokio::time::sleep(Duration::from_millis(300)).await;
    }
    Json(serde_json::json!({ "text": text, "speaker": speaker })).into_response()
}

async fn synthesis(Json(query): Json<serde_json::Value>) -> Response {
    let text = query["text"].as_str().unwrap_or_default();
    if text.contains("FAILSYNTH") {
        return (StatusCode::BAD_REQUEST, "synthesis boom").into_response();
    }
    (
        [(header::CONTENT_TYPE, "audio/wav")],
        STUB_WAV.to_vec(),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Fake voice gateway

/// Observations shared by every connection a gateway hands out.
#[derive(Default)]
pub struct PlayLog {
    /// Artifact paths in play-start order.
    pub plays: Mutex<Vec<PathBuf>>,
    busy: AtomicBool,
    overlap: AtomicBool,
}

impl PlayLog {
    pub fn play_count(&self) -> usize {
        self.plays.lock().len()
    }

    /// True if two plays ever ran at the same time.
    pub fn saw_overlap(&self) -> bool {
        self.overlap.load(Ordering::SeqCst)
    }

    /// True while some play is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }
}

pub struct FakeConnection {
    channel: Mutex<ChannelId>,
    connected: AtomicBool,
    play_duration: Duration,
    stop: Notify,
    log: Arc<PlayLog>,
}

impl FakeConnection {
    pub fn is_disconnected(&self) -> bool {
        !self.connected.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VoiceConnection for FakeConnection {
    fn channel_id(&self) -> ChannelId {
        self.channel.lock().clone()
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn play(&self, artifact: &Path) -> Result<(), PlaybackError> {
        if self.log.busy.swap(true, Ordering::SeqCst) {
            self.log.overlap.store(true, Ordering::SeqCst);
        }
        self.log.plays.lock().push(artifact.to_path_buf());
        tokio::select! {
            _ = tokio::time::sleep(self.play_duration) => {}
            _ = self.stop.notified() => {}
        }
        self.log.busy.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) {
        self.stop.notify_waiters();
    }

    async fn move_to(&self, channel: &ChannelId) -> Result<(), GatewayError> {
        *self.channel.lock() = channel.clone();
        Ok(())
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

pub struct FakeGateway {
    /// Non-bot occupants per channel.
    pub occupants: Mutex<HashMap<ChannelId, usize>>,
    /// Per-channel permission overrides; everything else is allowed.
    pub permission_overrides: Mutex<HashMap<ChannelId, ChannelPermissions>>,
    pub connections: Mutex<Vec<Arc<FakeConnection>>>,
    pub connect_count: AtomicUsize,
    pub play_duration: Duration,
    pub log: Arc<PlayLog>,
}

impl FakeGateway {
    pub fn new(play_duration: Duration) -> Arc<Self> {
        Arc::new(Self {
            occupants: Mutex::new(HashMap::new()),
            permission_overrides: Mutex::new(HashMap::new()),
            connections: Mutex::new(Vec::new()),
            connect_count: AtomicUsize::new(0),
            play_duration,
            log: Arc::new(PlayLog::default()),
        })
    }

    pub fn set_occupants(&self, channel: &ChannelId, count: usize) {
        self.occupants.lock().insert(channel.clone(), count);
    }

    pub fn deny(&self, channel: &ChannelId) {
        self.permission_overrides.lock().insert(
            channel.clone(),
            ChannelPermissions {
                connect: false,
                speak: false,
            },
        );
    }

    pub fn connection(&self, index: usize) -> Arc<FakeConnection> {
        self.connections.lock()[index].clone()
    }

    pub fn connects(&self) -> usize {
        self.connect_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VoiceGateway for FakeGateway {
    async fn connect(
        &self,
        _guild: &GuildId,
        channel: &ChannelId,
        _self_deaf: bool,
    ) -> Result<Arc<dyn VoiceConnection>, GatewayError> {
        self.connect_count.fetch_add(1, Ordering::SeqCst);
        let connection = Arc::new(FakeConnection {
            channel: Mutex::new(channel.clone()),
            connected: AtomicBool::new(true),
            play_duration: self.play_duration,
            stop: Notify::new(),
            log: self.log.clone(),
        });
        self.connections.lock().push(connection.clone());
        Ok(connection)
    }

    fn permissions(&self, channel: &ChannelId) -> ChannelPermissions {
        self.permission_overrides
            .lock()
            .get(channel)
            .copied()
            .unwrap_or(ChannelPermissions {
                connect: true,
                speak: true,
            })
    }

    fn non_bot_occupants(&self, channel: &ChannelId) -> usize {
        self.occupants.lock().get(channel).copied().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------

/// Polls `cond` until it holds or `deadline` passes.
pub async fn wait_until(deadline: Duration, mut cond: impl FnMut() -> bool) {
    let start = Instant::now();
    while !cond() {
        assert!(
            start.elapsed() < deadline,
            "condition not met within {deadline:?}"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
