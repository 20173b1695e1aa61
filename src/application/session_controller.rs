//! Session controller
//!
//! Drives one realtime voice session at a time: credential fetch, audio
//! mode, peer connection, local capture, data channel and the SDP
//! offer/answer exchange. State lives behind a single mutex; a generation
//! counter identifies the session that currently owns it, and every await
//! point in `start()` re-checks that generation so a superseded start can
//! release what it acquired instead of leaking it.

use crate::config::Config;
use crate::domain::media::{
    AudioMode, AudioSession, CaptureConstraints, LocalMediaStream, MediaCapture,
    RemoteMediaStream,
};
use crate::domain::session::{
    CredentialProvider, DataChannel, EventLog, PeerConnector, PeerHandle, PeerSession,
    SdpSignaling, SessionState, SessionStatus, StartPolicy, TransportEvent, TransportEvents,
};
use crate::domain::shared::error::SessionError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::SessionId;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Controller behaviour knobs
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub start_policy: StartPolicy,
    pub channel_label: String,
    pub voice_only: bool,
    pub audio_mode: AudioMode,
}

impl ControllerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            start_policy: config.session.start_policy,
            channel_label: config.session.channel_label.clone(),
            voice_only: config.session.voice_only,
            audio_mode: config.audio,
        }
    }
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// External collaborators the controller sequences
#[derive(Clone)]
pub struct SessionDependencies {
    pub credentials: Arc<dyn CredentialProvider>,
    pub audio: Arc<dyn AudioSession>,
    pub capture: Arc<dyn MediaCapture>,
    pub connector: Arc<dyn PeerConnector>,
    pub signaling: Arc<dyn SdpSignaling>,
}

/// Resources owned by the current session
#[derive(Default)]
struct SessionResources {
    peer: Option<Arc<dyn PeerSession>>,
    channel: Option<Arc<dyn DataChannel>>,
    local: Option<LocalMediaStream>,
    pump: Option<JoinHandle<()>>,
}

impl SessionResources {
    fn is_empty(&self) -> bool {
        self.peer.is_none() && self.channel.is_none() && self.local.is_none() && self.pump.is_none()
    }

    /// Close channel, close peer, stop local tracks. Each at most once,
    /// since `self` is consumed.
    async fn release(self) {
        if let Some(channel) = self.channel {
            if let Err(e) = channel.close().await {
                warn!("Failed to close data channel '{}': {}", channel.label(), e);
            }
        }

        if let Some(peer) = self.peer {
            if let Err(e) = peer.close().await {
                warn!("Failed to close peer connection: {}", e);
            }
        }

        if let Some(local) = self.local {
            local.stop_all();
            debug!("Stopped {} local track(s)", local.tracks().len());
        }

        if let Some(pump) = self.pump {
            pump.abort();
        }
    }
}

struct ControllerState {
    generation: u64,
    status: SessionStatus,
    resources: SessionResources,
    events: EventLog,
    remote: Arc<RemoteMediaStream>,
}

impl ControllerState {
    fn transition_to(&mut self, next: SessionState) -> bool {
        if !self.status.state.can_transition_to(&next) {
            return false;
        }
        self.status.state = next;
        true
    }
}

struct Shared {
    state: Mutex<ControllerState>,
    status_tx: watch::Sender<SessionStatus>,
}

impl Shared {
    fn publish(&self, state: &ControllerState) {
        self.status_tx.send_replace(state.status.clone());
    }
}

/// Realtime voice session controller
pub struct SessionController {
    options: ControllerOptions,
    deps: SessionDependencies,
    shared: Arc<Shared>,
}

impl SessionController {
    pub fn new(options: ControllerOptions, deps: SessionDependencies) -> Self {
        let (status_tx, _) = watch::channel(SessionStatus::idle());
        let state = ControllerState {
            generation: 0,
            status: SessionStatus::idle(),
            resources: SessionResources::default(),
            events: EventLog::new(),
            remote: Arc::new(RemoteMediaStream::new()),
        };

        Self {
            options,
            deps,
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                status_tx,
            }),
        }
    }

    /// Start a session.
    ///
    /// Returns once the offer/answer exchange completed; the session turns
    /// Active asynchronously when the data channel opens. On failure every
    /// resource acquired so far is released, the state returns to Idle and
    /// the failure is published in `SessionStatus`.
    pub async fn start(&self) -> Result<SessionId> {
        let (generation, session_id, displaced) = self.claim().await?;

        if let Some(displaced) = displaced {
            info!("Replacing existing session");
            displaced.release().await;
        }

        info!("Starting session {}", session_id);

        match self.provision(generation).await {
            Ok(()) => {
                info!(
                    "Session {} negotiated, waiting for data channel to open",
                    session_id
                );
                Ok(session_id)
            }
            Err(SessionError::Superseded) => {
                info!("Session {} superseded before it completed", session_id);
                Err(SessionError::Superseded)
            }
            Err(err) => {
                if self.abort(generation, err.clone()).await {
                    Err(err)
                } else {
                    info!(
                        "Session {} superseded before it completed ({})",
                        session_id, err
                    );
                    Err(SessionError::Superseded)
                }
            }
        }
    }

    /// Stop the current session, or cancel one that is still starting.
    ///
    /// Always leaves the controller Idle. Calling it again is a no-op.
    pub async fn stop(&self) {
        let (resources, previous) = {
            let mut state = self.shared.state.lock().await;
            let previous = state.status.state;

            state.generation += 1;
            let resources = std::mem::take(&mut state.resources);
            state.transition_to(SessionState::Idle);
            state.status.session_id = None;
            state.status.failure = None;
            state.status.started_at = None;
            self.shared.publish(&state);

            (resources, previous)
        };

        if previous.is_idle() && resources.is_empty() {
            debug!("stop() called with no session");
            return;
        }

        info!("Stopping session (was {:?})", previous);
        resources.release().await;
    }

    pub fn status(&self) -> SessionStatus {
        self.shared.status_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.shared.status_tx.subscribe()
    }

    /// Received server events, newest first
    pub async fn events(&self) -> Vec<Value> {
        self.shared.state.lock().await.events.snapshot()
    }

    /// Remote tracks of the current (or last) session
    pub async fn remote_stream(&self) -> Arc<RemoteMediaStream> {
        self.shared.state.lock().await.remote.clone()
    }

    /// Whether a peer connection, channel or capture stream is still held
    pub async fn holds_resources(&self) -> bool {
        !self.shared.state.lock().await.resources.is_empty()
    }

    /// Take ownership of the session slot according to the start policy
    async fn claim(&self) -> Result<(u64, SessionId, Option<SessionResources>)> {
        loop {
            let mut waiter = {
                let mut state = self.shared.state.lock().await;

                if state.status.state.is_idle() {
                    let (generation, session_id) = self.begin(&mut state);
                    return Ok((generation, session_id, None));
                }

                match self.options.start_policy {
                    StartPolicy::Reject => {
                        warn!(
                            "start() rejected, session already {:?}",
                            state.status.state
                        );
                        return Err(SessionError::Busy(state.status.state));
                    }
                    StartPolicy::Replace => {
                        let displaced = std::mem::take(&mut state.resources);
                        state.transition_to(SessionState::Idle);
                        let (generation, session_id) = self.begin(&mut state);
                        return Ok((generation, session_id, Some(displaced)));
                    }
                    StartPolicy::Queue => {
                        debug!("start() queued behind {:?} session", state.status.state);
                        self.shared.status_tx.subscribe()
                    }
                }
            };

            waiter
                .wait_for(|status| status.state.is_idle())
                .await
                .map(|_| ())
                .map_err(|_| SessionError::Transport("status channel closed".to_string()))?;
        }
    }

    fn begin(&self, state: &mut ControllerState) -> (u64, SessionId) {
        state.generation += 1;
        let session_id = SessionId::new();

        state.transition_to(SessionState::Connecting);
        state.status.session_id = Some(session_id);
        state.status.failure = None;
        state.remote = Arc::new(RemoteMediaStream::new());
        state.status.started_at = Some(Utc::now());
        self.shared.publish(state);

        (state.generation, session_id)
    }

    async fn ensure_current(&self, generation: u64) -> Result<()> {
        if self.shared.state.lock().await.generation == generation {
            Ok(())
        } else {
            Err(SessionError::Superseded)
        }
    }

    async fn provision(&self, generation: u64) -> Result<()> {
        let credential = self.deps.credentials.fetch().await?;
        debug!(
            "Ephemeral credential received ({} bytes)",
            credential.expose().len()
        );
        self.ensure_current(generation).await?;

        self.deps.audio.configure(self.options.audio_mode).await?;
        self.ensure_current(generation).await?;

        let PeerHandle {
            session: peer,
            events,
        } = self.deps.connector.connect().await?;
        {
            let mut state = self.shared.state.lock().await;
            if state.generation != generation {
                drop(state);
                if let Err(e) = peer.close().await {
                    warn!("Failed to close superseded peer connection: {}", e);
                }
                return Err(SessionError::Superseded);
            }
            state.resources.peer = Some(peer.clone());
            state.resources.pump = Some(spawn_event_pump(
                self.shared.clone(),
                generation,
                events,
            ));
        }

        let local = self
            .deps
            .capture
            .acquire(CaptureConstraints::audio_only())
            .await?;
        if self.options.voice_only {
            let disabled = local.disable_video();
            if disabled > 0 {
                debug!("Voice-only session, disabled {} video track(s)", disabled);
            }
        }
        let audio_track = local.first_audio_track();
        {
            let mut state = self.shared.state.lock().await;
            if state.generation != generation {
                drop(state);
                local.stop_all();
                return Err(SessionError::Superseded);
            }
            state.resources.local = Some(local);
        }

        let audio_track = audio_track
            .ok_or_else(|| SessionError::Media("capture yielded no audio track".to_string()))?;
        debug!("Attaching local audio track {}", audio_track.id());
        peer.add_track(audio_track).await?;
        self.ensure_current(generation).await?;

        let channel = peer.create_data_channel(&self.options.channel_label).await?;
        {
            let mut state = self.shared.state.lock().await;
            if state.generation != generation {
                drop(state);
                if let Err(e) = channel.close().await {
                    warn!("Failed to close superseded data channel: {}", e);
                }
                return Err(SessionError::Superseded);
            }
            state.resources.channel = Some(channel);
        }

        let offer = peer.create_offer().await?;
        let local_sdp = peer.set_local_description(&offer).await?;
        self.ensure_current(generation).await?;

        let answer = self.deps.signaling.exchange(&credential, &local_sdp).await?;
        self.ensure_current(generation).await?;

        peer.set_remote_description(&answer).await?;
        self.ensure_current(generation).await
    }

    /// Roll back a failed start if it still owns the session slot.
    ///
    /// Returns false when a stop() or a newer start() took the slot first;
    /// the failure is then a consequence of that teardown.
    async fn abort(&self, generation: u64, err: SessionError) -> bool {
        let resources = {
            let mut state = self.shared.state.lock().await;
            if state.generation != generation {
                return false;
            }

            let resources = std::mem::take(&mut state.resources);
            state.transition_to(SessionState::Idle);
            state.status.session_id = None;
            state.status.failure = Some(err.clone());
            state.status.started_at = None;
            self.shared.publish(&state);
            resources
        };

        warn!("Session start failed ({}): {}", err.kind(), err);
        resources.release().await;
        true
    }
}

fn spawn_event_pump(
    shared: Arc<Shared>,
    generation: u64,
    mut events: TransportEvents,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let mut state = shared.state.lock().await;
            if state.generation != generation {
                debug!("Dropping transport event from a stale session");
                break;
            }
            apply_event(&shared, &mut state, event).await;
        }
    })
}

async fn apply_event(shared: &Shared, state: &mut ControllerState, event: TransportEvent) {
    match event {
        TransportEvent::ConnectionStateChanged(connection_state) => {
            info!("Peer connection state changed: {}", connection_state);
        }
        TransportEvent::TrackArrived(track) => {
            debug!("Remote {:?} track {} arrived", track.kind, track.id);
            state.remote.add_track(track).await;
        }
        TransportEvent::ChannelOpen { label } => match state.status.state {
            SessionState::Connecting => {
                state.transition_to(SessionState::Active);
                state.events.clear();
                shared.publish(state);
                info!("Data channel '{}' open, session active", label);
            }
            SessionState::Active => {
                debug!("Ignoring repeated open on data channel '{}'", label);
            }
            SessionState::Idle => {}
        },
        TransportEvent::ChannelMessage { label, payload } => {
            match serde_json::from_str::<Value>(&payload) {
                Ok(event) => {
                    debug!(
                        "Server event on '{}': {}",
                        label,
                        event.get("type").and_then(serde_json::Value::as_str).unwrap_or("<untyped>")
                    );
                    state.events.prepend(event);
                }
                Err(e) => {
                    let err = SessionError::Parse(e.to_string());
                    warn!("Dropping malformed message on '{}': {}", label, err);
                }
            }
        }
        TransportEvent::ChannelClosed { label } => {
            info!("Data channel '{}' closed", label);
        }
    }
}
