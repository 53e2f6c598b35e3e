use futures::StreamExt;
use quarry_common::{QuarryError, Result};
use quarry_logger::log::log;
use quarry_logger::severity::LogSeverity::{self, Debug, Error, Info};
use quarry_protocol::frame::FrameCodec;
use quarry_protocol::session::{ServerContext, Session};
use quarry_protocol::transport::{ChannelTransport, Transport};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio_util::codec::FramedRead;

/// A bound listener plus the context every accepted session shares.
pub struct Server {
    listener: TcpListener,
    context: Arc<ServerContext>,
}

impl Server {
    pub async fn bind(context: Arc<ServerContext>) -> Result<Self> {
        let address = format!("{}:{}", context.config.bind, context.config.port);
        let listener = TcpListener::bind(&address).await?;
        log(format!("Listening on {}", listener.local_addr()?), Info);
        Ok(Self { listener, context })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until the task is dropped. One task per connection.
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((socket, address)) => {
                    log(format!("New connection from: {}", address), Debug);
                    tokio::spawn(handle_connection(socket, address, self.context.clone()));
                }
                Err(err) => log(format!("Failed to accept a connection: {}", err), Error),
            }
        }
    }
}

async fn handle_connection(socket: TcpStream, address: SocketAddr, context: Arc<ServerContext>) {
    // Usually the peer hanging up while its last packets were written
    if let Err(err) = serve(socket, address, context).await {
        log(format!("Connection {} ended: {}", address, err), Debug);
    }
}

fn disconnect_reason(err: &QuarryError) -> &'static str {
    match err {
        QuarryError::Underflow(_)
        | QuarryError::MalformedTree(_)
        | QuarryError::ProtocolError(_) => "Invalid packet",
        _ => "Internal server error",
    }
}

fn severity_of(err: &QuarryError) -> LogSeverity {
    match err {
        QuarryError::OutOfRange { .. } => Error,
        QuarryError::Closed | QuarryError::ValidationRejected(_) => Debug,
        _ => Info,
    }
}

/// Logs a handler failure and closes the session when the error is fatal to it.
fn report(session: &mut Session, err: QuarryError) {
    log(
        format!("Error from {}: {}", session.address(), err),
        severity_of(&err),
    );
    if err.is_fatal() {
        session.close(disconnect_reason(&err));
    }
}

/// Drives one connection: frames in, ticks on the configured interval,
/// packets out through a writer task owning the socket's write half.
async fn serve(socket: TcpStream, address: SocketAddr, context: Arc<ServerContext>) -> Result<()> {
    socket.set_nodelay(true)?;
    let (read_half, write_half) = socket.into_split();

    let (transport, writer) = ChannelTransport::new();
    let transport = Arc::new(transport);
    let writer_task = tokio::spawn(writer.run(write_half));

    let mut frames = FramedRead::new(read_half, FrameCodec::new());
    let mut session = Session::new(address, transport.clone(), context.clone());
    let mut ticker = interval(context.config.tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while !session.is_closed() && transport.is_writable() {
        tokio::select! {
            frame = frames.next() => match frame {
                Some(Ok(frame)) => {
                    // A join holds this branch for the whole paced stream and the
                    // ticker waits. The join clears any dig and restarts the
                    // keep-alive clock, and the delayed tick fires right after.
                    let result = session.handle_frame(&frame, Instant::now()).await;
                    // Frames after a compression switch arrive in the compressed format
                    frames.decoder_mut().set_compression(session.compression());
                    if let Err(err) = result {
                        report(&mut session, err);
                    }
                }
                Some(Err(err)) => {
                    log(format!("Bad frame from {}: {}", address, err), Info);
                    session.close(disconnect_reason(&err));
                }
                None => break,
            },
            _ = ticker.tick() => {
                if let Err(err) = session.tick(Instant::now()) {
                    report(&mut session, err);
                }
            }
        }
    }

    session.close("Disconnected");
    log(format!("Connection {} closed", address), Debug);
    match writer_task.await {
        Ok(result) => result,
        Err(err) => Err(QuarryError::IoError(err.into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_errors_get_generic_reason() {
        assert_eq!(
            disconnect_reason(&QuarryError::underflow("varint")),
            "Invalid packet"
        );
        assert_eq!(
            disconnect_reason(&QuarryError::protocol("bad state")),
            "Invalid packet"
        );
        assert_eq!(disconnect_reason(&QuarryError::Closed), "Internal server error");
    }

    #[test]
    fn test_encoding_overflow_logged_as_error() {
        let err = QuarryError::OutOfRange { value: 300, bits: 8 };
        assert_eq!(severity_of(&err), Error);
        assert_eq!(
            severity_of(&QuarryError::ValidationRejected("air".to_owned())),
            Debug
        );
    }
}
