//! Listening endpoint for the label channel.
//!
//! Connections are served one at a time: the first accepted client becomes
//! the subscriber of a fresh pipeline session that owns the capture device
//! until the session ends, which includes the subscriber disconnecting.
//! Clients that connect meanwhile wait in the accept backlog and are served
//! afterwards; concurrent subscribers are not supported.

use crate::{
    camera::FrameSource,
    detection::PoseDetector,
    display::{FrameView, Headless, PreviewWindow},
    pipeline::{FramePipeline, PipelineSettings, SessionStats},
    publisher::WebSocketPublisher,
    Error, Result,
};
use log::{error, info, warn};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

/// Preview window settings for a session
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSettings {
    pub enabled: bool,
    pub window_name: String,
    pub show_fps: bool,
    pub draw_landmarks: bool,
}

impl ViewSettings {
    pub fn headless() -> Self {
        Self {
            enabled: false,
            window_name: String::new(),
            show_fps: false,
            draw_landmarks: false,
        }
    }

    fn open(&self) -> Result<Box<dyn FrameView>> {
        if self.enabled {
            Ok(Box::new(PreviewWindow::new(
                &self.window_name,
                self.show_fps,
                self.draw_landmarks,
            )?))
        } else {
            Ok(Box::new(Headless))
        }
    }
}

/// Bind the listening socket
///
/// # Errors
///
/// Returns `Error::Io` if the address cannot be bound.
pub async fn bind(host: &str, port: u16) -> Result<TcpListener> {
    let listener = TcpListener::bind((host, port)).await?;
    info!("Server listening on {}...", listener.local_addr()?);
    Ok(listener)
}

/// Cancel `token` when the process receives Ctrl-C
pub fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown requested");
                token.cancel();
            }
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
    });
}

/// Serves pipeline sessions to WebSocket subscribers
pub struct LabelServer<D, F> {
    detector: D,
    open_source: F,
    pipeline: PipelineSettings,
    view: ViewSettings,
}

impl<D, F, S> LabelServer<D, F>
where
    D: PoseDetector,
    F: FnMut() -> Result<S>,
    S: FrameSource,
{
    /// `open_source` is called once per session to acquire the frame source
    pub fn new(detector: D, open_source: F, pipeline: PipelineSettings, view: ViewSettings) -> Self {
        Self {
            detector,
            open_source,
            pipeline,
            view,
        }
    }

    /// Accept subscribers until `shutdown` is cancelled
    ///
    /// # Errors
    ///
    /// Returns an error if the frame source cannot be opened for a session or
    /// the listener fails. Handshake failures and other session errors are
    /// logged and the next subscriber is served.
    pub async fn serve(&mut self, listener: TcpListener, shutdown: CancellationToken) -> Result<()> {
        loop {
            let (stream, peer) = tokio::select! {
                () = shutdown.cancelled() => break,
                accepted = listener.accept() => accepted?,
            };
            let peer = peer.to_string();

            let publisher = match tokio_tungstenite::accept_async(stream).await {
                Ok(ws) => WebSocketPublisher::new(ws, peer.clone()),
                Err(e) => {
                    warn!("WebSocket handshake with {} failed: {}", peer, e);
                    continue;
                }
            };

            info!("Subscriber {} connected", peer);
            match self.session(publisher, shutdown.child_token()).await {
                Ok(stats) => info!("Session with {} ended after {} frames", peer, stats.frames),
                Err(e @ Error::Camera(_)) => return Err(e),
                Err(e) => error!("Session with {} failed: {}", peer, e),
            }
        }

        info!("Server stopped");
        Ok(())
    }

    /// Run one pipeline session for `publisher`
    ///
    /// # Errors
    ///
    /// Returns `Error::Camera` if the frame source cannot be opened.
    pub async fn session(
        &mut self,
        mut publisher: WebSocketPublisher<TcpStream>,
        stop: CancellationToken,
    ) -> Result<SessionStats> {
        let source = match (self.open_source)() {
            Ok(source) => source,
            Err(e) => {
                warn!("Closing {}: frame source unavailable", publisher.peer());
                publisher.close().await;
                return Err(match e {
                    Error::Camera(_) => e,
                    other => Error::Camera(other.to_string()),
                });
            }
        };
        let view = self.view.open()?;

        let mut pipeline = FramePipeline::new(source, &mut self.detector, &mut publisher, view, self.pipeline, stop);
        let result = pipeline.run().await;
        drop(pipeline);

        publisher.close().await;
        result
    }
}
