//! Per-connection I/O tasks.
//!
//! Each accepted socket gets a reader task and a writer task. The reader
//! frames lines and forwards them to the control loop; the writer drains
//! the session's send buffer. Neither task touches server state: every
//! terminal condition is reported as a close event and handled on the
//! control task, scoped to this one connection.

use futures_util::{SinkExt, StreamExt};
use lark_proto::LineCodec;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, trace};

use crate::server::Event;
use crate::state::SessionId;

/// Spawn the reader and writer tasks for one connection.
///
/// Returns the sending end of the session's outbound queue. Dropping it
/// (when the session is removed) lets the writer flush what is queued and
/// close the socket.
pub fn spawn_connection(
    id: SessionId,
    stream: TcpStream,
    events: mpsc::Sender<Event>,
) -> mpsc::UnboundedSender<String> {
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
    let (read_half, write_half) = stream.into_split();

    {
        let events = events.clone();
        tokio::spawn(async move {
            let mut lines = FramedRead::new(read_half, LineCodec::new());
            let reason = loop {
                match lines.next().await {
                    Some(Ok(line)) => {
                        trace!(%id, %line, "recv");
                        if events.send(Event::Line { id, line }).await.is_err() {
                            // Control loop is gone; nothing left to notify.
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!(%id, error = %e, "read failed");
                        break "Connection error";
                    }
                    None => break "Client disconnected",
                }
            };
            let _ = events
                .send(Event::Closed {
                    id,
                    reason: reason.to_string(),
                })
                .await;
        });
    }

    tokio::spawn(async move {
        let mut sink = FramedWrite::new(write_half, LineCodec::new());
        while let Some(line) = outbound_rx.recv().await {
            trace!(%id, %line, "send");
            if let Err(e) = sink.send(line).await {
                debug!(%id, error = %e, "write failed");
                let _ = events
                    .send(Event::Closed {
                        id,
                        reason: "Connection error".to_string(),
                    })
                    .await;
                return;
            }
        }
        // Session dropped its sender: flush the tail and let the socket close.
        let _ = sink.flush().await;
    });

    outbound_tx
}
