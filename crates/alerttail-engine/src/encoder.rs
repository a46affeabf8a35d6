//! Serializes alerts from the stream to the output sink.

use alerttail_types::Alert;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::errors::WatchError;

/// Writes one JSON document per alert, newline terminated.
pub struct AlertEncoder<W> {
    writer: W,
    indent: bool,
}

impl<W> AlertEncoder<W>
where
    W: AsyncWrite + Unpin + Send,
{
    #[must_use]
    pub fn new(writer: W, indent: bool) -> Self {
        Self { writer, indent }
    }

    /// Render a single record. Indented records use tabs.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Serialize`] if the alert cannot be encoded.
    pub fn encode(&self, alert: &Alert) -> Result<Vec<u8>, WatchError> {
        let mut buf = Vec::with_capacity(512);
        if self.indent {
            let mut ser =
                serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"\t"));
            alert.serialize(&mut ser)?;
        } else {
            serde_json::to_writer(&mut buf, alert)?;
        }
        buf.push(b'\n');
        Ok(buf)
    }

    /// Write and flush one record.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError`] on serialization or write failure.
    pub async fn write(&mut self, alert: &Alert) -> Result<(), WatchError> {
        let record = self.encode(alert)?;
        self.writer.write_all(&record).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Consume `rx` until every sender is gone and the buffer is empty, then
    /// shut the writer down. Returns the number of records written.
    ///
    /// The first failure ends the drain; dropping `rx` then unblocks any
    /// producer waiting on a full stream.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError`] on the first serialization or write failure.
    pub async fn drain(mut self, mut rx: mpsc::Receiver<Alert>) -> Result<u64, WatchError> {
        let mut written = 0u64;
        while let Some(alert) = rx.recv().await {
            self.write(&alert).await?;
            written += 1;
        }
        self.finish().await?;
        tracing::debug!(written, "Alert stream drained");
        Ok(written)
    }

    /// Flush and shut down the writer.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Output`] if the writer fails to close.
    pub async fn finish(mut self) -> Result<(), WatchError> {
        self.writer.flush().await?;
        self.writer.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert() -> Alert {
        let mut alert = Alert::with_id("da637");
        alert.severity = Some("High".into());
        alert
    }

    #[test]
    fn compact_record_is_single_line() {
        let enc = AlertEncoder::new(Vec::new(), false);
        let out = String::from_utf8(enc.encode(&alert()).unwrap()).unwrap();
        assert!(out.ends_with('\n'));
        assert_eq!(out.matches('\n').count(), 1);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["id"], "da637");
        assert_eq!(value["severity"], "High");
    }

    #[test]
    fn indented_record_uses_tabs_and_same_content() {
        let enc = AlertEncoder::new(Vec::new(), true);
        let out = String::from_utf8(enc.encode(&alert()).unwrap()).unwrap();
        assert!(out.contains("\n\t\"id\": \"da637\""), "got: {out}");

        let compact = AlertEncoder::new(Vec::new(), false).encode(&alert()).unwrap();
        let a: serde_json::Value = serde_json::from_str(&out).unwrap();
        let b: serde_json::Value = serde_json::from_slice(&compact).unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn drain_writes_in_order_until_closed() {
        let (tx, rx) = mpsc::channel(4);
        for id in ["1", "2", "3"] {
            tx.send(Alert::with_id(id)).await.unwrap();
        }
        drop(tx);

        let mut out = Vec::new();
        let written = AlertEncoder::new(&mut out, false).drain(rx).await.unwrap();
        assert_eq!(written, 3);

        let ids: Vec<String> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str::<Alert>(l).unwrap().id.unwrap())
            .collect();
        assert_eq!(ids, ["1", "2", "3"]);
    }
}
