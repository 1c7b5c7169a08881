//! TransmitLoop: outbound queue → socket.

use futures::{Sink, SinkExt};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::tungstenite::{self, Message};

use crate::base::NetError;
use crate::ws::message;

/// Write each queued payload as one message, in queue order.
///
/// A failed write is reported on `errors` and the next payload is tried;
/// nothing is retried. When the queue closes the sink is closed, which sends
/// the close frame.
pub async fn transmit_loop<K>(
    mut sink: K,
    mut outbound: UnboundedReceiver<Vec<u8>>,
    errors: UnboundedSender<NetError>,
) where
    K: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    while let Some(payload) = outbound.recv().await {
        if let Err(e) = sink.send(message::outbound(payload)).await {
            tracing::debug!(error = %e, "write failed");
            if errors.send(NetError::Write(e)).is_err() {
                break;
            }
        }
    }

    if let Err(e) = sink.close().await {
        tracing::debug!(error = %e, "close after outbound queue ended");
    }
}
