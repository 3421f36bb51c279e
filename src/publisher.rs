//! Label delivery to the connected subscriber.
//!
//! Each qualifying frame produces one WebSocket text message holding
//! `{"label": "<pose label>"}`. Nothing is acknowledged, buffered or retried.

use crate::{classifier::PoseLabel, Error, Result};
use futures::SinkExt;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};
use std::io::ErrorKind;
use tokio_tungstenite::{
    tungstenite::{error::ProtocolError, Error as WsError, Message},
    WebSocketStream,
};

/// Wire message sent for every classified frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelMessage {
    pub label: PoseLabel,
}

impl LabelMessage {
    pub fn new(label: PoseLabel) -> Self {
        Self { label }
    }

    /// Encode as the JSON text frame payload
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a JSON text frame payload
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` for malformed payloads or unknown labels.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Receives labels from the pipeline
#[allow(async_fn_in_trait)]
pub trait LabelSink {
    /// Deliver one label
    async fn publish(&mut self, label: PoseLabel) -> Result<()>;
}

impl<P: LabelSink> LabelSink for &mut P {
    async fn publish(&mut self, label: PoseLabel) -> Result<()> {
        (**self).publish(label).await
    }
}

/// A subscriber slot that may be empty
impl<P: LabelSink> LabelSink for Option<P> {
    async fn publish(&mut self, label: PoseLabel) -> Result<()> {
        match self {
            Some(sink) => sink.publish(label).await,
            None => Err(Error::Publish("no subscriber connected".to_string())),
        }
    }
}

/// Sends labels as text frames over one WebSocket connection
pub struct WebSocketPublisher<S> {
    stream: WebSocketStream<S>,
    peer: String,
}

impl<S> WebSocketPublisher<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an already upgraded connection
    pub fn new(stream: WebSocketStream<S>, peer: impl Into<String>) -> Self {
        Self {
            stream,
            peer: peer.into(),
        }
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Send a close frame; errors are ignored since the peer may be gone
    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}

impl<S> LabelSink for WebSocketPublisher<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    async fn publish(&mut self, label: PoseLabel) -> Result<()> {
        let text = LabelMessage::new(label).to_json()?;
        match self.stream.send(Message::Text(text)).await {
            Ok(()) => Ok(()),
            Err(e) if is_disconnect(&e) => Err(Error::Disconnected(format!("{}: {}", self.peer, e))),
            Err(e) => Err(e.into()),
        }
    }
}

/// Whether a send failure means the peer will never read again
fn is_disconnect(error: &WsError) -> bool {
    match error {
        WsError::ConnectionClosed | WsError::AlreadyClosed => true,
        WsError::Protocol(ProtocolError::SendAfterClosing) => true,
        WsError::Io(e) => matches!(
            e.kind(),
            ErrorKind::BrokenPipe | ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::UnexpectedEof
        ),
        _ => false,
    }
}
