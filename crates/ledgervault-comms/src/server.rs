//! TCP vault server.
//!
//! One exchange per connection: the client writes its envelope and
//! half-closes, the server answers and closes.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::config::ServerConfig;
use crate::error::{CommsError, Result};
use crate::transport::{read_limited, RequestHandler};

/// A listening vault server.
pub struct VaultServer<H> {
    listener: TcpListener,
    handler: Arc<H>,
    config: ServerConfig,
}

impl<H: RequestHandler + 'static> VaultServer<H> {
    /// Bind to `config.bind_addr`.
    pub async fn bind(config: ServerConfig, handler: Arc<H>) -> Result<Self> {
        let listener = TcpListener::bind(config.bind_addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "vault server listening");
        Ok(Self {
            listener,
            handler,
            config,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `shutdown` resolves. Each connection is
    /// served on its own task.
    pub async fn serve_until(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("vault server shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            tracing::warn!(error = %e, "accept failed");
                            continue;
                        }
                    };
                    tracing::debug!(%peer, "connection accepted");
                    let handler = Arc::clone(&self.handler);
                    let config = self.config.clone();
                    tokio::spawn(async move {
                        if let Err(e) = serve_connection(stream, handler, &config).await {
                            tracing::warn!(%peer, error = %e, "connection failed");
                        }
                    });
                }
            }
        }
    }

    /// Serve on a background task.
    pub fn spawn(self) -> Result<ServerHandle> {
        let addr = self.local_addr()?;
        let (tx, rx) = oneshot::channel();
        let task = tokio::spawn(self.serve_until(async move {
            let _ = rx.await;
        }));
        Ok(ServerHandle {
            addr,
            shutdown: tx,
            task,
        })
    }
}

/// A server running on a background task.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<Result<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections and wait for the accept loop to end.
    /// Connections already accepted run to completion on their own.
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown.send(());
        self.task
            .await
            .map_err(|e| CommsError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
    }
}

async fn serve_connection<H: RequestHandler + ?Sized>(
    mut stream: TcpStream,
    handler: Arc<H>,
    config: &ServerConfig,
) -> Result<()> {
    let request = tokio::time::timeout(
        config.read_timeout,
        read_limited(&mut stream, config.max_message_size),
    )
    .await
    .map_err(|_| CommsError::Timeout)??;

    let reply = handler.handle(request).await;
    send_reply(&mut stream, &reply, config.write_timeout).await
}

/// Write `reply` and close, giving up once `limit` has passed.
async fn send_reply<W: AsyncWrite + Unpin>(
    stream: &mut W,
    reply: &str,
    limit: Duration,
) -> Result<()> {
    tokio::time::timeout(limit, async {
        stream.write_all(reply.as_bytes()).await?;
        stream.shutdown().await
    })
    .await
    .map_err(|_| CommsError::Timeout)??;
    Ok(())
}
