use crate::frame::FrameCodec;
use bytes::Bytes;
use futures::SinkExt;
use quarry_common::{QuarryError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::AsyncWrite;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio_util::codec::FramedWrite;

/// Where a session's outgoing packets go. Payloads are unframed `id + body`;
/// framing and compression happen behind the transport.
pub trait Transport: Send + Sync {
    /// Queues one payload. Payloads leave in the order they were queued.
    fn send(&self, payload: Bytes) -> Result<()>;

    /// Switches to the compressed frame format for every payload queued after this call.
    fn enable_compression(&self, threshold: usize) -> Result<()>;

    fn close(&self);

    fn is_writable(&self) -> bool;
}

#[derive(Debug)]
pub enum TransportCommand {
    Payload(Bytes),
    Compression(usize),
    Close,
}

/// A [`Transport`] feeding a writer task over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    sender: UnboundedSender<TransportCommand>,
    open: Arc<AtomicBool>,
}

/// The receiving half of a [`ChannelTransport`], drained by [`TransportWriter::run`].
#[derive(Debug)]
pub struct TransportWriter {
    receiver: UnboundedReceiver<TransportCommand>,
    open: Arc<AtomicBool>,
}

impl ChannelTransport {
    pub fn new() -> (Self, TransportWriter) {
        let (sender, receiver) = unbounded_channel();
        let open = Arc::new(AtomicBool::new(true));
        (
            Self {
                sender,
                open: open.clone(),
            },
            TransportWriter { receiver, open },
        )
    }

    fn push(&self, command: TransportCommand) -> Result<()> {
        if !self.is_writable() {
            return Err(QuarryError::Closed);
        }
        self.sender.send(command).map_err(|_| {
            self.open.store(false, Ordering::SeqCst);
            QuarryError::Closed
        })
    }
}

impl Transport for ChannelTransport {
    fn send(&self, payload: Bytes) -> Result<()> {
        self.push(TransportCommand::Payload(payload))
    }

    fn enable_compression(&self, threshold: usize) -> Result<()> {
        self.push(TransportCommand::Compression(threshold))
    }

    fn close(&self) {
        // Anything queued before the close is still written
        let _ = self.sender.send(TransportCommand::Close);
        self.open.store(false, Ordering::SeqCst);
    }

    fn is_writable(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

impl TransportWriter {
    pub async fn recv(&mut self) -> Option<TransportCommand> {
        self.receiver.recv().await
    }

    /// Frames and writes queued payloads until the transport is closed or
    /// every sender is gone. A write error marks the transport unwritable.
    pub async fn run<W>(mut self, writer: W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let mut framed = FramedWrite::new(writer, FrameCodec::new());
        let result: Result<()> = async {
            while let Some(command) = self.receiver.recv().await {
                match command {
                    TransportCommand::Payload(payload) => framed.send(payload).await?,
                    TransportCommand::Compression(threshold) => {
                        framed.encoder_mut().set_compression(Some(threshold))
                    }
                    TransportCommand::Close => break,
                }
            }
            framed.close().await
        }
        .await;
        self.open.store(false, Ordering::SeqCst);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_writes_in_queue_order() {
        let (transport, writer) = ChannelTransport::new();
        transport.send(Bytes::from_static(&[0x01, 0xAA])).unwrap();
        transport.send(Bytes::from_static(&[0x02])).unwrap();
        transport.close();

        let mock = tokio_test::io::Builder::new()
            .write(&[0x02, 0x01, 0xAA])
            .write(&[0x01, 0x02])
            .build();
        tokio_test::assert_ok!(writer.run(mock).await);
    }

    #[tokio::test]
    async fn test_compression_applies_to_later_payloads() {
        let (transport, writer) = ChannelTransport::new();
        transport.send(Bytes::from_static(&[0x03, 0x00])).unwrap();
        transport.enable_compression(256).unwrap();
        transport.send(Bytes::from_static(&[0x02])).unwrap();
        transport.close();

        let mock = tokio_test::io::Builder::new()
            .write(&[0x02, 0x03, 0x00])
            .write(&[0x02, 0x00, 0x02])
            .build();
        tokio_test::assert_ok!(writer.run(mock).await);
    }

    #[test]
    fn test_send_after_close_fails() {
        let (transport, _writer) = ChannelTransport::new();
        transport.close();
        assert!(!transport.is_writable());
        assert_matches!(
            transport.send(Bytes::from_static(&[0x00])),
            Err(QuarryError::Closed)
        );
    }

    #[test]
    fn test_dropped_writer_closes() {
        let (transport, writer) = ChannelTransport::new();
        drop(writer);
        assert_matches!(
            transport.send(Bytes::from_static(&[0x00])),
            Err(QuarryError::Closed)
        );
        assert!(!transport.is_writable());
    }
}
