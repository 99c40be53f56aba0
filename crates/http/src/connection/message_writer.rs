use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::protocol::SendError;

/// Sequential writer for one connection.
///
/// Each call to [`write`](MessageWriter::write) takes ownership of a buffer,
/// writes it completely and only then drops it. Writes are issued by the
/// connection task one after another, so segments reach the peer in call order.
#[derive(Debug)]
pub struct MessageWriter<W> {
    writer: W,
    written: u64,
}

impl<W> MessageWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Total bytes written on this connection.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub async fn write(&mut self, buf: Bytes) -> Result<(), SendError> {
        if buf.is_empty() {
            return Ok(());
        }

        self.writer.write_all(&buf).await?;
        self.written += buf.len() as u64;
        trace!(len = buf.len(), "segment written");
        Ok(())
    }

    #[inline]
    pub async fn flush(&mut self) -> Result<(), SendError> {
        Ok(self.writer.flush().await?)
    }

    /// Flushes and closes the write side of the connection.
    pub async fn shutdown(&mut self) -> Result<(), SendError> {
        self.writer.flush().await?;
        Ok(self.writer.shutdown().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn writes_in_call_order() {
        let (client, server) = tokio::io::duplex(64);
        let mut writer = MessageWriter::new(server);

        writer.write(Bytes::from_static(b"HTTP/1.1 200 OK\r\n")).await.unwrap();
        writer.write(Bytes::new()).await.unwrap();
        writer.write(Bytes::from_static(b"\r\n")).await.unwrap();
        writer.write(Bytes::from_static(b"body")).await.unwrap();
        assert_eq!(writer.written(), 23);
        writer.shutdown().await.unwrap();

        let mut received = Vec::new();
        let mut client = client;
        client.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"HTTP/1.1 200 OK\r\n\r\nbody");
    }
}
