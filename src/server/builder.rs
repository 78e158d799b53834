// ────────────────────────────────
// src/server/builder.rs
// ────────────────────────────────
use crate::server::handler::METRICS_PATH;
use crate::server::listener::bind_tcp;
use anyhow::{anyhow, Result};
use futures::stream::{self, Stream, StreamExt};
use hyper::{server::conn::Http, Body, Request, Response};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::time::sleep;
use tower::Service;

/// Pause after a failed `accept()` before trying again.
pub const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Builder pattern so `main.rs` can inject the metrics handler (or any handler).
pub struct ServerBuilder<H>
where
    H: Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
{
    host: String,
    port: u16,
    handler: Option<H>,
}

impl<H> ServerBuilder<H>
where
    H: Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
{
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            handler: None,
        }
    }

    pub fn with_handler(mut self, handler: H) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Bind the TCP socket without accepting yet, so bind failures surface
    /// before anything else starts.
    pub async fn bind(self) -> Result<BoundServer<H>> {
        let handler = self
            .handler
            .ok_or_else(|| anyhow!("handler must be set via with_handler()"))?;
        let listener = bind_tcp(&self.host, self.port).await?;

        Ok(BoundServer { listener, handler })
    }
}

pub struct BoundServer<H> {
    listener: TcpListener,
    handler: H,
}

impl<H> BoundServer<H>
where
    H: Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
{
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections forever, one Tokio task per connection.
    pub async fn serve(self) -> Result<()> {
        tracing::info!(
            "Metrics server listening on http://{}{}",
            self.local_addr()?,
            METRICS_PATH
        );

        let incoming = stream::unfold(self.listener, |listener| async move {
            let accepted = listener.accept().await;
            Some((accepted, listener))
        });

        serve_incoming(incoming, self.handler).await;
        Ok(())
    }
}

/// Serve every connection yielded by `incoming` until it ends.
///
/// Accept errors (fd exhaustion, aborted handshakes) are logged and retried
/// after [`ACCEPT_ERROR_BACKOFF`]; they never stop the server.
pub async fn serve_incoming<S, I, H>(incoming: S, handler: H)
where
    S: Stream<Item = io::Result<(I, SocketAddr)>>,
    I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    H: Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
{
    futures::pin_mut!(incoming);

    while let Some(accepted) = incoming.next().await {
        let (stream, peer) = match accepted {
            Ok(accepted) => accepted,
            Err(err) => {
                tracing::warn!(%err, "failed to accept connection");
                sleep(ACCEPT_ERROR_BACKOFF).await;
                continue;
            }
        };
        let svc = handler.clone();

        tokio::spawn(async move {
            let http = Http::new();
            if let Err(err) = http.serve_connection(stream, svc).await {
                tracing::warn!(%peer, %err, "connection error");
            }
        });
    }
}
