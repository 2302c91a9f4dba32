//! Per-connection task: read, frame, dispatch, reply.

use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::Instrument;

use quotad_core::protocol::frame::FrameBuffer;

use crate::dispatch::Dispatcher;

/// Serve one client until EOF, a write failure, or an oversized line.
pub async fn serve(mut stream: TcpStream, dispatcher: Arc<Dispatcher>) {
    let peer = match stream.peer_addr() {
        Ok(addr) => addr.to_string(),
        Err(_) => "-".to_owned(),
    };
    let span = tracing::debug_span!("conn", peer = %peer);

    async move {
        let mut frame = FrameBuffer::new();
        let mut chunk = vec![0u8; 4096];
        let mut out = BytesMut::new();

        loop {
            let n = match stream.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(err) => {
                    tracing::debug!(%err, "read failed");
                    break;
                }
            };

            let keep_open =
                frame.feed(&chunk[..n], |line| dispatcher.dispatch(line, &mut out));

            // Replies for complete lines go out even when the leftover
            // fragment forces a close.
            if !out.is_empty() {
                if let Err(err) = stream.write_all(&out).await {
                    tracing::debug!(%err, "write failed");
                    break;
                }
                out.clear();
            }
            if !keep_open {
                tracing::debug!("line exceeded buffer bound; closing");
                break;
            }
        }
    }
    .instrument(span)
    .await;
}
