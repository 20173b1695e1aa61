//! Data channel adapter

use crate::domain::session::{DataChannel, TransportEvent, TransportEventSender};
use crate::domain::shared::error::SessionError;
use crate::domain::shared::result::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::data_channel::RTCDataChannel;

/// Wraps an `RTCDataChannel` whose callbacks feed the session's event stream
pub struct WebRtcDataChannel {
    dc: Arc<RTCDataChannel>,
}

impl WebRtcDataChannel {
    /// Install open/message/close observers and wrap the channel.
    ///
    /// Called exactly once per channel instance, right after creation.
    pub fn attach(dc: Arc<RTCDataChannel>, tx: TransportEventSender) -> Self {
        let label = dc.label().to_string();

        dc.on_open(Box::new({
            let tx = tx.clone();
            let label = label.clone();
            move || {
                debug!("Data channel '{}' opened", label);
                let _ = tx.send(TransportEvent::ChannelOpen { label });
                Box::pin(async {})
            }
        }));

        dc.on_message(Box::new({
            let tx = tx.clone();
            let label = label.clone();
            move |msg: DataChannelMessage| {
                let payload = String::from_utf8_lossy(&msg.data).into_owned();
                let _ = tx.send(TransportEvent::ChannelMessage {
                    label: label.clone(),
                    payload,
                });
                Box::pin(async {})
            }
        }));

        dc.on_close(Box::new(move || {
            let _ = tx.send(TransportEvent::ChannelClosed {
                label: label.clone(),
            });
            Box::pin(async {})
        }));

        Self { dc }
    }
}

#[async_trait]
impl DataChannel for WebRtcDataChannel {
    fn label(&self) -> String {
        self.dc.label().to_string()
    }

    async fn close(&self) -> Result<()> {
        self.dc
            .close()
            .await
            .map_err(|e| SessionError::Transport(format!("data channel close failed: {}", e)))
    }
}
