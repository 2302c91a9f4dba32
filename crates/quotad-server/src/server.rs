//! TCP acceptor setup.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use quotad_core::Result;

use crate::conn;
use crate::dispatch::Dispatcher;

/// Bind one listener per source host, all on `port`.
pub async fn bind_all(sources: &[String], port: u16) -> Result<Vec<TcpListener>> {
    let mut listeners = Vec::with_capacity(sources.len());
    for source in sources {
        let listener = TcpListener::bind((source.as_str(), port)).await?;
        tracing::info!(addr = %listener.local_addr()?, "listening");
        listeners.push(listener);
    }
    Ok(listeners)
}

/// Accept connections forever, one task per client.
pub async fn accept_loop(listener: TcpListener, dispatcher: Arc<Dispatcher>) {
    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                tokio::spawn(conn::serve(stream, Arc::clone(&dispatcher)));
            }
            Err(err) => {
                tracing::warn!(%err, "accept failed");
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}
