//! Peer connection adapter over the `webrtc` crate

use super::channel::WebRtcDataChannel;
use crate::config::{IceServerConfig, RtcConfig};
use crate::domain::media::{LevelMeter, LocalTrack, RemoteTrack, TrackKind};
use crate::domain::session::{
    ConnectionState, DataChannel, PeerConnector, PeerHandle, PeerSession, TransportEvent,
    TransportEventSender,
};
use crate::domain::shared::error::SessionError;
use crate::domain::shared::result::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::APIBuilder;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

fn transport_err(context: &str, e: impl std::fmt::Display) -> SessionError {
    SessionError::Transport(format!("{}: {}", context, e))
}

pub(crate) fn connection_state(state: RTCPeerConnectionState) -> ConnectionState {
    match state {
        RTCPeerConnectionState::New => ConnectionState::New,
        RTCPeerConnectionState::Connecting => ConnectionState::Connecting,
        RTCPeerConnectionState::Connected => ConnectionState::Connected,
        RTCPeerConnectionState::Disconnected => ConnectionState::Disconnected,
        RTCPeerConnectionState::Failed => ConnectionState::Failed,
        RTCPeerConnectionState::Closed => ConnectionState::Closed,
        _ => ConnectionState::Unknown,
    }
}

pub(crate) fn ice_servers(servers: &[IceServerConfig]) -> Vec<RTCIceServer> {
    servers
        .iter()
        .filter(|s| !s.urls.is_empty())
        .map(|s| RTCIceServer {
            urls: s.urls.clone(),
            username: s.username.clone(),
            credential: s.credential.clone(),
            ..Default::default()
        })
        .collect()
}

/// Builds one `RTCPeerConnection` per session
pub struct WebRtcConnector {
    config: RtcConfig,
}

impl WebRtcConnector {
    pub fn new(config: RtcConfig) -> Self {
        Self { config }
    }

    fn rtc_configuration(&self) -> RTCConfiguration {
        RTCConfiguration {
            ice_servers: ice_servers(&self.config.ice_servers),
            ..Default::default()
        }
    }
}

#[async_trait]
impl PeerConnector for WebRtcConnector {
    async fn connect(&self) -> Result<PeerHandle> {
        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(|e| transport_err("failed to register codecs", e))?;

        let mut registry = Registry::new();
        registry = register_default_interceptors(registry, &mut media_engine)
            .map_err(|e| transport_err("failed to register interceptors", e))?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let pc = Arc::new(
            api.new_peer_connection(self.rtc_configuration())
                .await
                .map_err(|e| transport_err("failed to create peer connection", e))?,
        );

        let (tx, rx) = mpsc::unbounded_channel();

        pc.on_peer_connection_state_change(Box::new({
            let tx = tx.clone();
            move |state: RTCPeerConnectionState| {
                let _ = tx.send(TransportEvent::ConnectionStateChanged(connection_state(state)));
                Box::pin(async {})
            }
        }));

        pc.on_track(Box::new({
            let tx = tx.clone();
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let kind = match track.kind() {
                    RTPCodecType::Video => TrackKind::Video,
                    _ => TrackKind::Audio,
                };
                let remote = RemoteTrack::new(track.id(), kind, track.stream_id());
                tokio::spawn(read_remote_track(track, remote.meter.clone()));
                let _ = tx.send(TransportEvent::TrackArrived(remote));
                Box::pin(async {})
            }
        }));

        info!("Peer connection created");

        Ok(PeerHandle {
            session: Arc::new(WebRtcPeer {
                pc,
                tx,
                wait_for_ice_gathering: self.config.wait_for_ice_gathering,
            }),
            events: rx,
        })
    }
}

/// Drain RTP from a remote track into its level meter until the track ends
async fn read_remote_track(track: Arc<TrackRemote>, meter: Arc<LevelMeter>) {
    while let Ok((packet, _)) = track.read_rtp().await {
        meter.record(packet.payload.len());
    }
    debug!("Remote track {} ended", track.id());
}

pub struct WebRtcPeer {
    pc: Arc<RTCPeerConnection>,
    tx: TransportEventSender,
    wait_for_ice_gathering: bool,
}

#[async_trait]
impl PeerSession for WebRtcPeer {
    async fn add_track(&self, track: Arc<LocalTrack>) -> Result<()> {
        let rtc_track = track
            .sink()
            .and_then(|sink| sink.downcast::<TrackLocalStaticSample>().ok())
            .ok_or_else(|| {
                SessionError::Transport(format!("local track {} has no RTP source", track.id()))
            })?;

        let sender = self
            .pc
            .add_track(rtc_track)
            .await
            .map_err(|e| transport_err("failed to add track", e))?;

        // RTCP must be read for interceptors (NACK, reports) to run
        tokio::spawn(async move {
            let mut rtcp_buf = vec![0u8; 1500];
            while sender.read(&mut rtcp_buf).await.is_ok() {}
        });

        Ok(())
    }

    async fn create_data_channel(&self, label: &str) -> Result<Arc<dyn DataChannel>> {
        let dc = self
            .pc
            .create_data_channel(label, None)
            .await
            .map_err(|e| transport_err("failed to create data channel", e))?;

        Ok(Arc::new(WebRtcDataChannel::attach(dc, self.tx.clone())))
    }

    async fn create_offer(&self) -> Result<String> {
        let offer = self
            .pc
            .create_offer(None)
            .await
            .map_err(|e| transport_err("failed to create offer", e))?;
        Ok(offer.sdp)
    }

    async fn set_local_description(&self, offer_sdp: &str) -> Result<String> {
        let offer = RTCSessionDescription::offer(offer_sdp.to_string())
            .map_err(|e| transport_err("invalid local offer", e))?;

        let mut gather_complete = self.pc.gathering_complete_promise().await;

        self.pc
            .set_local_description(offer)
            .await
            .map_err(|e| transport_err("failed to set local description", e))?;

        if self.wait_for_ice_gathering {
            let _ = gather_complete.recv().await;
            debug!("ICE gathering complete");
        }

        self.pc
            .local_description()
            .await
            .map(|desc| desc.sdp)
            .ok_or_else(|| SessionError::Transport("missing local description".to_string()))
    }

    async fn set_remote_description(&self, answer_sdp: &str) -> Result<()> {
        let answer = RTCSessionDescription::answer(answer_sdp.to_string())
            .map_err(|e| transport_err("invalid SDP answer", e))?;

        self.pc
            .set_remote_description(answer)
            .await
            .map_err(|e| transport_err("failed to set remote description", e))
    }

    async fn close(&self) -> Result<()> {
        self.pc
            .close()
            .await
            .map_err(|e| transport_err("failed to close peer connection", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::media::{CaptureConstraints, MediaCapture};
    use crate::infrastructure::media::SilenceCapture;

    #[test]
    fn test_connection_state_mapping() {
        assert_eq!(
            connection_state(RTCPeerConnectionState::Connected),
            ConnectionState::Connected
        );
        assert_eq!(
            connection_state(RTCPeerConnectionState::Failed),
            ConnectionState::Failed
        );
        assert_eq!(
            connection_state(RTCPeerConnectionState::Unspecified),
            ConnectionState::Unknown
        );
    }

    #[test]
    fn test_ice_servers_skip_empty_entries() {
        let servers = vec![
            IceServerConfig {
                urls: vec!["stun:stun.l.google.com:19302".to_string()],
                ..Default::default()
            },
            IceServerConfig::default(),
        ];
        let mapped = ice_servers(&servers);
        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped[0].urls, vec!["stun:stun.l.google.com:19302".to_string()]);
    }

    #[tokio::test]
    async fn test_offer_carries_audio_and_data_sections() {
        let connector = WebRtcConnector::new(RtcConfig {
            ice_servers: Vec::new(),
            wait_for_ice_gathering: false,
        });
        let PeerHandle { session, .. } = connector.connect().await.unwrap();

        let local = SilenceCapture::new()
            .acquire(CaptureConstraints::audio_only())
            .await
            .unwrap();
        session
            .add_track(local.first_audio_track().unwrap())
            .await
            .unwrap();
        let channel = session.create_data_channel("oai-events").await.unwrap();
        assert_eq!(channel.label(), "oai-events");

        let offer = session.create_offer().await.unwrap();
        assert!(offer.contains("m=audio"));
        assert!(offer.contains("m=application"));

        local.stop_all();
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_track_without_rtp_source_is_rejected() {
        let connector = WebRtcConnector::new(RtcConfig::default());
        let PeerHandle { session, .. } = connector.connect().await.unwrap();

        let bare = Arc::new(LocalTrack::new("bare", TrackKind::Audio));
        let err = session.add_track(bare).await.unwrap_err();
        assert!(matches!(err, SessionError::Transport(_)));

        let foreign = Arc::new(LocalTrack::with_sink(
            "foreign",
            TrackKind::Audio,
            Arc::new(String::from("not an RTP track")),
        ));
        let err = session.add_track(foreign).await.unwrap_err();
        assert!(matches!(err, SessionError::Transport(_)));

        session.close().await.unwrap();
    }
}
