//! Printer(inbound) and Printer(errors).

use std::io::Write;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::oneshot;

use crate::base::NetError;
use crate::console::{self, Palette};

/// Print every received message in arrival order.
pub async fn print_inbound<W: Write>(
    mut inbound: UnboundedReceiver<Vec<u8>>,
    mut out: W,
    palette: Palette,
) {
    while let Some(msg) = inbound.recv().await {
        if let Err(e) = console::write_inbound(&mut out, &palette, &msg) {
            tracing::warn!(error = %e, "failed to print message");
        }
    }
}

/// Print every loop error. A clean close prints the close notice, fires
/// `closed` and ends the printer; anything else is printed and skipped.
pub async fn print_errors<W: Write>(
    mut errors: UnboundedReceiver<NetError>,
    mut out: W,
    palette: Palette,
    closed: oneshot::Sender<()>,
) {
    while let Some(err) = errors.recv().await {
        if err.is_clean_close() {
            if let Err(e) = console::write_closed(&mut out, &palette, &err) {
                tracing::warn!(error = %e, "failed to print close notice");
            }
            let _ = closed.send(());
            return;
        }
        if let Err(e) = console::write_error(&mut out, &palette, &err) {
            tracing::warn!(error = %e, "failed to print error");
        }
    }
}
