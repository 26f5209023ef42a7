//! Response sink abstraction for exported bytes.
//!
//! The export engine writes through an object-safe sink so the same
//! pipeline serves chunked HTTP responses and fully buffered bodies. Header
//! values are plain strings; bytes written are final wire bytes.

use privgate_core::{PrivGateError, Result};

/// Destination for the export's response framing and body bytes.
pub trait ExportSink: Send {
    /// Records one response header. Must be called before the first
    /// [`write`](Self::write).
    fn set_header(&mut self, name: &str, value: &str);

    /// Appends body bytes. A failure aborts the export best-effort.
    fn write(&mut self, bytes: &[u8]) -> Result<()>;
}

/// Applies the fixed response framing for a streamed CSV attachment.
///
/// Must run before the first body byte so chunked transfer starts cleanly.
pub fn apply_export_headers(sink: &mut dyn ExportSink, request_name: &str) {
    sink.set_header("Connection", "Keep-Alive");
    sink.set_header("Transfer-Encoding", "chunked");
    sink.set_header("X-Content-Type-Options", "nosniff");
    sink.set_header("Content-Type", "application/octet-stream");
    sink.set_header(
        "Content-Disposition",
        &format!("attachment;filename={}_export.csv", request_name),
    );
}

/// Buffering sink: accumulates the entire body in memory.
///
/// Used where the transport wants the response as a single string, and by
/// tests that assert on exact body bytes.
#[derive(Debug, Default)]
pub struct BufferSink {
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded headers in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Value of the first header with the given name, if any.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body accumulated so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Consumes the sink, returning the body as a string.
    pub fn into_body_string(self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl ExportSink for BufferSink {
    fn set_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.body.extend_from_slice(bytes);
        Ok(())
    }
}

/// Streaming sink: forwards each write as one chunk into a byte channel.
///
/// This is the shape of a chunked HTTP body writer; the receiving half
/// drains chunks as the pipeline produces them. A closed receiver surfaces
/// as a sink error, which aborts the export.
#[derive(Debug)]
pub struct ChannelSink {
    headers: Vec<(String, String)>,
    chunks: tokio::sync::mpsc::UnboundedSender<Vec<u8>>,
}

impl ChannelSink {
    /// Creates the sink and the receiving half of its chunk channel.
    pub fn new() -> (Self, tokio::sync::mpsc::UnboundedReceiver<Vec<u8>>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        (
            Self {
                headers: Vec::new(),
                chunks: tx,
            },
            rx,
        )
    }

    /// Recorded headers in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}

impl ExportSink for ChannelSink {
    fn set_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.chunks
            .send(bytes.to_vec())
            .map_err(|_| PrivGateError::sink_error("response consumer disconnected"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_sink_accumulates() {
        let mut sink = BufferSink::new();
        sink.write(b"a,b\r\n").unwrap();
        sink.write(b"1,2\r\n").unwrap();
        assert_eq!(sink.body(), b"a,b\r\n1,2\r\n");
    }

    #[test]
    fn test_export_headers() {
        let mut sink = BufferSink::new();
        apply_export_headers(&mut sink, "a_payroll");

        assert_eq!(sink.header("Transfer-Encoding"), Some("chunked"));
        assert_eq!(sink.header("X-Content-Type-Options"), Some("nosniff"));
        assert_eq!(
            sink.header("Content-Disposition"),
            Some("attachment;filename=a_payroll_export.csv")
        );
    }

    #[test]
    fn test_channel_sink_forwards_chunks() {
        let (mut sink, mut rx) = ChannelSink::new();
        sink.write(b"chunk-1").unwrap();
        sink.write(b"chunk-2").unwrap();
        drop(sink);

        assert_eq!(rx.blocking_recv().unwrap(), b"chunk-1");
        assert_eq!(rx.blocking_recv().unwrap(), b"chunk-2");
        assert!(rx.blocking_recv().is_none());
    }

    #[test]
    fn test_channel_sink_closed_receiver_errors() {
        let (mut sink, rx) = ChannelSink::new();
        drop(rx);
        assert!(sink.write(b"late").is_err());
    }
}
