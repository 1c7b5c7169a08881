//! InputLoop: operator lines → outbound queue.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc::UnboundedSender;

use crate::base::NetError;
use crate::console;

/// Read lines until end of input, queueing each as one message and
/// reprinting the prompt after it.
///
/// Lines are raw bytes with the trailing `\n` or `\r\n` removed; no
/// encoding is assumed.
pub async fn input_loop<R, W>(
    mut reader: R,
    mut out: W,
    outbound: UnboundedSender<Vec<u8>>,
) -> Result<(), NetError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    console::write_prompt(&mut out)?;
    let mut line = Vec::new();
    while reader.read_until(b'\n', &mut line).await? > 0 {
        if line.last() == Some(&b'\n') {
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
        }
        if outbound.send(std::mem::take(&mut line)).is_err() {
            tracing::debug!("outbound queue closed, input ignored");
            break;
        }
        console::write_prompt(&mut out)?;
    }
    tracing::debug!("end of input");
    Ok(())
}
