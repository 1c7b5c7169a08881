//! ReceiveLoop: socket → inbound queue.

use futures::{Stream, StreamExt};
use tokio::sync::mpsc::UnboundedSender;
use tokio_tungstenite::tungstenite::{self, Message};

use crate::base::NetError;
use crate::ws::message::{self, Inbound};

/// Read messages until the peer goes away.
///
/// Data goes to `inbound` in arrival order, each cut to `read_limit` bytes
/// when set. Read errors go to `errors` and reading continues. Once a clean
/// close has been reported nothing more can arrive, so the loop returns.
pub async fn receive_loop<S>(
    mut source: S,
    inbound: UnboundedSender<Vec<u8>>,
    errors: UnboundedSender<NetError>,
    read_limit: Option<usize>,
) where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    loop {
        let err = match source.next().await {
            Some(Ok(msg)) => match message::inbound(msg, read_limit) {
                Inbound::Data(data) => {
                    if inbound.send(data).is_err() {
                        return;
                    }
                    continue;
                }
                Inbound::Control => continue,
                Inbound::Closed => NetError::CleanClose,
            },
            Some(Err(e)) => message::read_error(e),
            None => NetError::CleanClose,
        };

        let clean = err.is_clean_close();
        if !clean {
            tracing::debug!(error = %err, "read failed");
        }
        if errors.send(err).is_err() || clean {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn drain<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> Vec<T> {
        let mut out = Vec::new();
        while let Ok(item) = rx.try_recv() {
            out.push(item);
        }
        out
    }

    #[tokio::test]
    async fn test_messages_forwarded_in_order() {
        let source = futures::stream::iter(vec![
            Ok(Message::Text("one".into())),
            Ok(Message::Ping(vec![])),
            Ok(Message::Binary(b"two".to_vec())),
            Ok(Message::Text("three".into())),
        ]);
        let (in_tx, mut in_rx) = mpsc::unbounded_channel();
        let (err_tx, mut err_rx) = mpsc::unbounded_channel();

        receive_loop(source, in_tx, err_tx, Some(512)).await;

        assert_eq!(
            drain(&mut in_rx),
            vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]
        );
        let errors = drain(&mut err_rx);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].is_clean_close());
    }

    #[tokio::test]
    async fn test_read_error_does_not_stop_loop() {
        let source = futures::stream::iter(vec![
            Err(tungstenite::Error::Utf8),
            Ok(Message::Text("after".into())),
            Ok(Message::Close(None)),
            Ok(Message::Text("never".into())),
        ]);
        let (in_tx, mut in_rx) = mpsc::unbounded_channel();
        let (err_tx, mut err_rx) = mpsc::unbounded_channel();

        receive_loop(source, in_tx, err_tx, None).await;

        assert_eq!(drain(&mut in_rx), vec![b"after".to_vec()]);
        let errors = drain(&mut err_rx);
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], NetError::Read(_)));
        assert!(errors[1].is_clean_close());
    }

    #[tokio::test]
    async fn test_oversized_message_truncated() {
        let source = futures::stream::iter(vec![Ok(Message::Binary(vec![7u8; 600]))]);
        let (in_tx, mut in_rx) = mpsc::unbounded_channel();
        let (err_tx, _err_rx) = mpsc::unbounded_channel();

        receive_loop(source, in_tx, err_tx, Some(512)).await;

        let got = drain(&mut in_rx);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].len(), 512);
    }
}
