use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::FutureExt;
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::sync::{Notify, watch};
use tracing::{debug, error, info, warn};

use crate::connection::HttpConnection;
use crate::handler::Handler;
use crate::protocol::{HttpError, ServerError};
use crate::server::ServerConfig;

/// Owns the listening socket and spawns one task per accepted connection.
///
/// The handler is shared by all connections, so it is also the place for
/// application state.
///
/// ```no_run
/// use micro_h1::connection::Exchange;
/// use micro_h1::handler::make_handler;
/// use micro_h1::server::Server;
///
/// #[tokio::main]
/// async fn main() {
///     let mut server = Server::new(make_handler(|exchange: &mut Exchange<'_>| {
///         exchange.write("hello world");
///     }));
///
///     let addr = server.listen("127.0.0.1:8080").await.expect("bind");
///     println!("listening on {addr}");
///
///     tokio::signal::ctrl_c().await.expect("ctrl-c");
///     server.stop();
///     server.stopped().await;
/// }
/// ```
#[derive(Debug)]
pub struct Server<H> {
    handler: Arc<H>,
    config: Arc<ServerConfig>,
    shared: Arc<Shared>,
    local_addr: Option<SocketAddr>,
}

#[derive(Debug)]
struct Shared {
    stopping: AtomicBool,
    stop: Notify,
    stopped: watch::Sender<bool>,
}

impl<H> Server<H>
where
    H: Handler + Send + Sync + 'static,
{
    pub fn new(handler: H) -> Self {
        Self::with_config(ServerConfig::default(), handler)
    }

    pub fn with_config(config: ServerConfig, handler: H) -> Self {
        let (stopped, _) = watch::channel(false);
        Self {
            handler: Arc::new(handler),
            config: Arc::new(config),
            shared: Arc::new(Shared { stopping: AtomicBool::new(false), stop: Notify::new(), stopped }),
            local_addr: None,
        }
    }

    /// Binds `addr` and starts accepting connections on the current runtime.
    ///
    /// Returns the bound address, useful when binding port `0`.
    pub async fn listen<A: ToSocketAddrs>(&mut self, addr: A) -> Result<SocketAddr, ServerError> {
        if let Some(local_addr) = self.local_addr {
            return Err(ServerError::AlreadyListening(local_addr));
        }

        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!(%local_addr, "start listening");

        self.local_addr = Some(local_addr);
        tokio::spawn(accept_loop(listener, Arc::clone(&self.handler), Arc::clone(&self.config), Arc::clone(&self.shared)));
        Ok(local_addr)
    }
}

impl<H> Server<H> {
    /// Stops accepting connections.
    ///
    /// Connections already waiting in the backlog are accepted and closed
    /// right away, then the listening socket is dropped. Open connections are
    /// not affected. Calling `stop` more than once has no further effect.
    pub fn stop(&self) {
        if self.shared.stopping.swap(true, Ordering::AcqRel) {
            return;
        }

        info!(local_addr = ?self.local_addr, "stopping server");
        if self.local_addr.is_some() {
            self.shared.stop.notify_one();
        } else {
            self.shared.stopped.send_replace(true);
        }
    }

    /// Resolves once the listening socket is closed.
    pub async fn stopped(&self) {
        let mut stopped = self.shared.stopped.subscribe();
        if stopped.wait_for(|stopped| *stopped).await.is_err() {
            debug!("stop signal dropped");
        }
    }

    pub fn is_stopping(&self) -> bool {
        self.shared.stopping.load(Ordering::Acquire)
    }

    /// The application handler, shared with every connection.
    pub fn handler(&self) -> &Arc<H> {
        &self.handler
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}

impl<H> Drop for Server<H> {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn accept_loop<H>(listener: TcpListener, handler: Arc<H>, config: Arc<ServerConfig>, shared: Arc<Shared>)
where
    H: Handler + Send + Sync + 'static,
{
    loop {
        let accepted = tokio::select! {
            biased;
            () = shared.stop.notified() => break,
            accepted = listener.accept() => accepted,
        };

        let (tcp_stream, remote_addr) = match accepted {
            Ok(stream_and_addr) => stream_and_addr,
            Err(e) => {
                warn!(cause = %e, "failed to accept");
                continue;
            }
        };

        if shared.stopping.load(Ordering::Acquire) {
            debug!(%remote_addr, "server is stopping, connection closed");
            drop(tcp_stream);
            break;
        }

        let handler = Arc::clone(&handler);
        let config = Arc::clone(&config);
        tokio::spawn(async move {
            let (reader, writer) = tcp_stream.into_split();
            let connection = HttpConnection::new(reader, writer, config);
            match connection.process(handler).await {
                Ok(()) => debug!(%remote_addr, "finished process, connection shutdown"),
                Err(HttpError::Timeout) => debug!(%remote_addr, "connection idle, shutdown"),
                Err(e) => error!(%remote_addr, cause = %e, "service has error, connection shutdown"),
            }
        });
    }

    // close whatever is still queued in the backlog
    while let Some(Ok((tcp_stream, remote_addr))) = listener.accept().now_or_never() {
        debug!(%remote_addr, "server is stopping, connection closed");
        drop(tcp_stream);
    }

    drop(listener);
    shared.stopped.send_replace(true);
    info!("server stopped");
}
