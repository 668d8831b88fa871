//! The host is whatever is driving the display: it sends commands (location,
//! units, button presses) and listens for notifications. Here that's a stream
//! of JSON lines, one message per line.

use crate::{
    coordinator::Event,
    message::{Envelope, Notification},
};
use anyhow::Context;
use log::{error, info, trace, warn};
use std::io::Write;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    sync::mpsc::UnboundedSender,
};

/// Outbound side of the host connection
pub trait HostTransport {
    fn post(&mut self, notification: Notification);
}

/// Writes notifications as JSON lines
pub struct JsonLinesHost<W> {
    output: W,
}

impl<W: Write> JsonLinesHost<W> {
    pub fn new(output: W) -> Self {
        Self { output }
    }

    fn write(&mut self, notification: &Notification) -> anyhow::Result<()> {
        serde_json::to_writer(&mut self.output, notification)
            .context("Error serializing notification")?;
        self.output.write_all(b"\n")?;
        self.output.flush()?;
        Ok(())
    }
}

impl<W: Write> HostTransport for JsonLinesHost<W> {
    fn post(&mut self, notification: Notification) {
        trace!("Posting {notification:?}");
        if let Err(err) = self.write(&notification) {
            error!("Error posting notification to host: {err:?}");
        }
    }
}

/// Read commands from the host, one JSON object per line, and forward them
/// to the coordinator. Lines that don't parse are logged and skipped. Returns
/// when the input closes.
pub async fn read_commands(
    input: impl AsyncRead + Unpin,
    events: UnboundedSender<Event>,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(input).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .context("Error reading host input")?
    {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Envelope>(line) {
            Ok(envelope) => {
                if events.send(Event::Inbound(envelope)).is_err() {
                    // Coordinator is gone, nobody to forward to
                    break;
                }
            }
            Err(err) => warn!("Ignoring malformed host message `{line}`: {err}"),
        }
    }
    info!("Host input closed");
    Ok(())
}
