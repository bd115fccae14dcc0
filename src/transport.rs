//! Newline-delimited JSON-RPC over a byte stream.
//!
//! Input is split on `\n` as it arrives, so several messages in one read and a
//! message spread over several reads are both handled. Every request runs on
//! its own task; responses go through a single writer task so each one is
//! written as one complete line.

use std::io;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::dispatcher::Dispatcher;

async fn write_lines<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<String>) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    writer.shutdown().await
}

/// Serves requests from `reader` until EOF, writing responses to `writer`.
///
/// Returns once every in-flight request has been answered.
pub async fn serve<R, W>(reader: R, writer: W, dispatcher: Dispatcher) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel::<String>();
    let writer_task = tokio::spawn(write_lines(writer, rx));

    let mut segments = BufReader::new(reader).split(b'\n');
    let mut in_flight = JoinSet::new();

    while let Some(segment) = segments.next_segment().await? {
        // Bytes go to the decoder as-is; invalid UTF-8 is a decode error.
        let line = segment.trim_ascii().to_vec();
        if line.is_empty() {
            continue;
        }

        let dispatcher = dispatcher.clone();
        let tx = tx.clone();
        in_flight.spawn(async move {
            if let Some(response) = dispatcher.handle_line(&line).await {
                if tx.send(response.to_line()).is_err() {
                    tracing::warn!("Output closed; dropping response {}", response.id);
                }
            }
        });

        while in_flight.try_join_next().is_some() {}
    }

    tracing::info!("Input closed; waiting for {} in-flight request(s)", in_flight.len());
    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            tracing::error!("Request task failed: {}", e);
        }
    }

    drop(tx);
    writer_task.await.map_err(io::Error::other)?
}
