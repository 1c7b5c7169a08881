//! The interactive session: four loops plus the input reader, joined by
//! three unbounded queues and coordinated by [`Session::run`].
//!
//! ```text
//! stdin ─ InputLoop ─▶ outbound ─▶ TransmitLoop ─▶ socket
//! socket ─ ReceiveLoop ─▶ inbound ─▶ Printer(inbound) ─▶ stdout
//!            └────────────┬── errors ─▶ Printer(errors) ─▶ stdout
//! TransmitLoop ───────────┘                 │ clean close
//!                                           ▼
//!                                     coordinator shutdown
//! ```
//!
//! Each queue has exactly one producer and one consumer, so typed lines go
//! out in typing order and received messages print in arrival order.

mod input;
mod printer;
mod receive;
mod transmit;

pub use input::input_loop;
pub use printer::{print_errors, print_inbound};
pub use receive::receive_loop;
pub use transmit::transmit_loop;

use std::future::Future;
use std::io::Write;
use std::time::Duration;

use futures::{Sink, Stream};
use tokio::io::AsyncBufRead;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::{self, Message};

use crate::config::ClientConfig;
use crate::console::Palette;

/// How long the transmit loop gets to send the close frame on shutdown.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The peer closed the connection cleanly.
    RemoteClosed,
    /// The operator interrupted the process.
    Interrupted,
}

impl SessionEnd {
    pub fn exit_code(self) -> i32 {
        match self {
            SessionEnd::RemoteClosed => 0,
            SessionEnd::Interrupted => 130,
        }
    }
}

/// Runs the loops for one connection.
#[derive(Debug, Clone, Copy)]
pub struct Session {
    palette: Palette,
    read_limit: Option<usize>,
}

impl Session {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            palette: config.palette,
            read_limit: config.read_limit,
        }
    }

    /// Run until the peer closes cleanly or `interrupt` resolves.
    ///
    /// End of input does not end the session. On the way out every loop is
    /// stopped and the write half gets [`CLOSE_GRACE`] to close the socket.
    pub async fn run<K, S, R, W, I>(
        self,
        sink: K,
        source: S,
        input: R,
        out: W,
        interrupt: I,
    ) -> SessionEnd
    where
        K: Sink<Message, Error = tungstenite::Error> + Unpin + Send + 'static,
        S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin + Send + 'static,
        R: AsyncBufRead + Unpin + Send + 'static,
        W: Write + Clone + Send + 'static,
        I: Future<Output = ()>,
    {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (errors_tx, errors_rx) = mpsc::unbounded_channel();
        let (closed_tx, closed_rx) = oneshot::channel();

        let receiver = tokio::spawn(receive_loop(
            source,
            inbound_tx,
            errors_tx.clone(),
            self.read_limit,
        ));
        let transmitter = tokio::spawn(transmit_loop(sink, outbound_rx, errors_tx));
        let inbound_printer = tokio::spawn(print_inbound(inbound_rx, out.clone(), self.palette));
        let error_printer = tokio::spawn(print_errors(
            errors_rx,
            out.clone(),
            self.palette,
            closed_tx,
        ));
        // Held until shutdown so end of input leaves the socket open.
        let outbound_hold = outbound_tx.clone();
        let reader = tokio::spawn(async move {
            if let Err(e) = input_loop(input, out, outbound_tx).await {
                tracing::warn!(error = %e, "input loop stopped");
            }
        });

        let end = tokio::select! {
            closed = closed_rx => {
                if closed.is_err() {
                    tracing::debug!("error printer ended without a close notice");
                }
                SessionEnd::RemoteClosed
            }
            () = interrupt => SessionEnd::Interrupted,
        };
        tracing::debug!(?end, "session ending");

        reader.abort();
        receiver.abort();
        inbound_printer.abort();
        error_printer.abort();
        // With the last outbound sender gone the transmit loop drains and
        // closes the socket.
        drop(outbound_hold);
        if tokio::time::timeout(CLOSE_GRACE, transmitter).await.is_err() {
            tracing::debug!("socket close timed out");
        }

        end
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use futures::channel::mpsc as fmpsc;
    use futures::SinkExt;
    use std::io;
    use std::sync::{Arc, Mutex};

    /// Cloneable in-memory stdout.
    #[derive(Debug, Clone, Default)]
    pub(crate) struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        pub(crate) fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn session() -> Session {
        Session::new(&ClientConfig {
            palette: Palette::plain(),
            ..ClientConfig::default()
        })
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(SessionEnd::RemoteClosed.exit_code(), 0);
        assert_eq!(SessionEnd::Interrupted.exit_code(), 130);
    }

    #[tokio::test]
    async fn test_remote_close_ends_session() {
        let (wire_tx, mut wire_rx) = fmpsc::unbounded::<Message>();
        let sink = wire_tx.sink_map_err(|_| tungstenite::Error::ConnectionClosed);
        let (peer_tx, peer_rx) = fmpsc::unbounded::<Result<Message, tungstenite::Error>>();
        let buf = SharedBuf::default();

        peer_tx.unbounded_send(Ok(Message::Close(None))).unwrap();
        let input: &'static [u8] = b"typed\n";

        let end = session()
            .run(sink, peer_rx, input, buf.clone(), std::future::pending())
            .await;

        assert_eq!(end, SessionEnd::RemoteClosed);
        assert!(buf
            .contents()
            .contains("\r✝ EOF - connection closed by remote\n"));
        // Whatever was typed before shutdown still went out in order.
        while let Ok(Some(msg)) = wire_rx.try_next() {
            assert_eq!(msg, Message::Text("typed".into()));
        }
        drop(peer_tx);
    }

    #[tokio::test]
    async fn test_interrupt_ends_session() {
        let (wire_tx, _wire_rx) = fmpsc::unbounded::<Message>();
        let sink = wire_tx.sink_map_err(|_| tungstenite::Error::ConnectionClosed);
        let (_peer_tx, peer_rx) = fmpsc::unbounded::<Result<Message, tungstenite::Error>>();
        let input: &'static [u8] = b"";

        let end = session()
            .run(sink, peer_rx, input, SharedBuf::default(), async {})
            .await;

        assert_eq!(end, SessionEnd::Interrupted);
    }

    #[tokio::test]
    async fn test_end_of_input_does_not_end_session() {
        let (wire_tx, _wire_rx) = fmpsc::unbounded::<Message>();
        let sink = wire_tx.sink_map_err(|_| tungstenite::Error::ConnectionClosed);
        let (peer_tx, peer_rx) = fmpsc::unbounded::<Result<Message, tungstenite::Error>>();
        let buf = SharedBuf::default();
        let input: &'static [u8] = b"";

        let closer = async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            peer_tx.unbounded_send(Ok(Message::Text("late".into()))).unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
            peer_tx.unbounded_send(Ok(Message::Close(None))).unwrap();
            std::future::pending::<()>().await
        };

        let end = session().run(sink, peer_rx, input, buf.clone(), closer).await;

        assert_eq!(end, SessionEnd::RemoteClosed);
        assert!(buf.contents().contains("\r< late\n> "));
    }
}
