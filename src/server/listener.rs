// ────────────────────────────────
// src/server/listener.rs
// Encapsulates low‑level TCP bind so hostnames and IP literals both work.
// ────────────────────────────────
use anyhow::{Context, Result};
use tokio::net::TcpListener;

pub async fn bind_tcp(host: &str, port: u16) -> Result<TcpListener> {
    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    Ok(listener)
}
