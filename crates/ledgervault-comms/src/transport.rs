//! Transport abstraction for envelope exchange.
//!
//! Every exchange is one request envelope out and one reply envelope back.
//! There is no framing or multiplexing beyond what the carrier provides.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;

use crate::config::ClientConfig;
use crate::error::{CommsError, Result};
use crate::url::{Scheme, ServerUrl};

/// Sends a signed envelope and returns the reply envelope.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, envelope: String) -> Result<String>;
}

/// Server side of an exchange. Always produces a reply.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn handle(&self, envelope: String) -> String;
}

#[async_trait]
impl<H: RequestHandler + ?Sized> RequestHandler for Arc<H> {
    async fn handle(&self, envelope: String) -> String {
        (**self).handle(envelope).await
    }
}

/// Pick a transport for `url` by its scheme.
pub fn connect(url: &ServerUrl, config: &ClientConfig) -> Result<Box<dyn Transport>> {
    let transport: Box<dyn Transport> = match url.supported_scheme()? {
        Scheme::File => Box::new(TcpTransport::new(url.authority(), config.clone())),
        Scheme::Ws | Scheme::Wss => Box::new(WebSocketTransport::new(url.to_string(), config.clone())),
        Scheme::Http | Scheme::Https => {
            Box::new(HttpTransport::new(url.to_string(), config.clone())?)
        }
    };
    Ok(transport)
}

/// Bound an exchange by the connection timeout.
async fn bounded<T>(config: &ClientConfig, exchange: impl Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(config.connection_timeout, exchange).await {
        Ok(result) => result,
        Err(_) => Err(CommsError::Timeout),
    }
}

fn send_failed(e: impl std::fmt::Display) -> CommsError {
    CommsError::Send(e.to_string())
}

fn check_size(size: usize, limit: usize) -> Result<()> {
    if size > limit {
        return Err(CommsError::MessageTooLarge { size, limit });
    }
    Ok(())
}

/// Read a whole stream up to `limit` bytes.
pub(crate) async fn read_limited<R>(reader: &mut R, limit: usize) -> Result<String>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    reader
        .take(limit as u64 + 1)
        .read_to_end(&mut buf)
        .await
        .map_err(send_failed)?;
    check_size(buf.len(), limit)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

// ─────────────────────────────────────────────────────────────────────────────
// TCP
// ─────────────────────────────────────────────────────────────────────────────

/// Raw TCP (`file://`): write the envelope, half-close, read to EOF.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    authority: String,
    config: ClientConfig,
}

impl TcpTransport {
    pub fn new(authority: impl Into<String>, config: ClientConfig) -> Self {
        Self {
            authority: authority.into(),
            config,
        }
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&self, envelope: String) -> Result<String> {
        bounded(&self.config, async {
            let mut stream = TcpStream::connect(&self.authority).await.map_err(send_failed)?;
            stream.write_all(envelope.as_bytes()).await.map_err(send_failed)?;
            stream.shutdown().await.map_err(send_failed)?;
            read_limited(&mut stream, self.config.max_message_size).await
        })
        .await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// WebSocket
// ─────────────────────────────────────────────────────────────────────────────

/// WebSocket (`ws://`, `wss://`): one text frame out, one frame back.
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    url: String,
    config: ClientConfig,
}

impl WebSocketTransport {
    pub fn new(url: impl Into<String>, config: ClientConfig) -> Self {
        Self {
            url: url.into(),
            config,
        }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send(&self, envelope: String) -> Result<String> {
        bounded(&self.config, async {
            let (mut socket, _) = tokio_tungstenite::connect_async(self.url.as_str())
                .await
                .map_err(send_failed)?;
            socket.send(Message::Text(envelope)).await.map_err(send_failed)?;

            let reply = loop {
                match socket.next().await {
                    Some(Ok(Message::Text(text))) => break text,
                    Some(Ok(Message::Binary(bytes))) => {
                        break String::from_utf8_lossy(&bytes).into_owned()
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        return Err(send_failed("connection closed before reply"))
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return Err(send_failed(e)),
                }
            };
            check_size(reply.len(), self.config.max_message_size)?;

            if let Err(e) = socket.close(None).await {
                tracing::debug!(error = %e, "websocket close failed after reply");
            }
            Ok(reply)
        })
        .await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HTTP
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP (`http://`, `https://`): POST the envelope, the body is the reply.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    url: String,
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>, config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.connection_timeout)
            .build()
            .map_err(send_failed)?;
        Ok(Self {
            url: url.into(),
            client,
            config,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, envelope: String) -> Result<String> {
        bounded(&self.config, async {
            let response = self
                .client
                .post(self.url.as_str())
                .body(envelope)
                .send()
                .await
                .map_err(|e| if e.is_timeout() { CommsError::Timeout } else { send_failed(e) })?;
            let reply = response.text().await.map_err(send_failed)?;
            check_size(reply.len(), self.config.max_message_size)?;
            Ok(reply)
        })
        .await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Loopback
// ─────────────────────────────────────────────────────────────────────────────

/// Hands envelopes straight to an in-process [`RequestHandler`].
#[derive(Clone)]
pub struct LoopbackTransport {
    handler: Arc<dyn RequestHandler>,
}

impl LoopbackTransport {
    pub fn new(handler: Arc<dyn RequestHandler>) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn send(&self, envelope: String) -> Result<String> {
        Ok(self.handler.handle(envelope).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::net::TcpListener;

    struct Echo;

    #[async_trait]
    impl RequestHandler for Echo {
        async fn handle(&self, envelope: String) -> String {
            format!("echo:{}", envelope)
        }
    }

    fn quick() -> ClientConfig {
        ClientConfig {
            connection_timeout: Duration::from_millis(500),
            ..ClientConfig::default()
        }
    }

    #[tokio::test]
    async fn test_loopback() {
        let transport = LoopbackTransport::new(Arc::new(Echo));
        assert_eq!(transport.send("hi".into()).await.unwrap(), "echo:hi");
    }

    #[tokio::test]
    async fn test_tcp_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = String::new();
            stream.read_to_string(&mut request).await.unwrap();
            stream.write_all(request.to_uppercase().as_bytes()).await.unwrap();
        });

        let transport = TcpTransport::new(addr.to_string(), quick());
        assert_eq!(transport.send("hello".into()).await.unwrap(), "HELLO");
    }

    #[tokio::test]
    async fn test_tcp_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let config = ClientConfig {
            connection_timeout: Duration::from_millis(100),
            ..ClientConfig::default()
        };
        let err = TcpTransport::new(addr.to_string(), config)
            .send("hello".into())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Connection timeout");
    }

    #[tokio::test]
    async fn test_tcp_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = TcpTransport::new(addr.to_string(), quick())
            .send("hello".into())
            .await
            .unwrap_err();
        assert!(matches!(err, CommsError::Send(_)));
        assert!(err.to_string().starts_with("Failed to send transaction: "));
    }

    #[tokio::test]
    async fn test_tcp_reply_too_large() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            stream.read_to_end(&mut request).await.unwrap();
            let _ = stream.write_all(&[b'x'; 64]).await;
        });

        let config = ClientConfig {
            max_message_size: 16,
            ..quick()
        };
        let err = TcpTransport::new(addr.to_string(), config)
            .send("hello".into())
            .await
            .unwrap_err();
        assert!(matches!(err, CommsError::MessageTooLarge { limit: 16, .. }));
    }

    #[tokio::test]
    async fn test_websocket_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut socket = tokio_tungstenite::accept_async(stream).await.unwrap();
            if let Some(Ok(Message::Text(text))) = socket.next().await {
                socket.send(Message::Text(format!("ws:{}", text))).await.unwrap();
            }
        });

        let url = ServerUrl::new("ws", "127.0.0.1", addr.port());
        let transport = connect(&url, &quick()).unwrap();
        assert_eq!(transport.send("hello".into()).await.unwrap(), "ws:hello");
    }

    #[tokio::test]
    async fn test_http_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            let body = loop {
                let n = stream.read(&mut chunk).await.unwrap();
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).into_owned();
                if let Some((_, body)) = text.split_once("\r\n\r\n") {
                    if body.len() >= 5 {
                        break body.to_string();
                    }
                }
                if n == 0 {
                    break String::new();
                }
            };
            let reply = format!("http:{}", body);
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                reply.len(),
                reply
            );
            stream.write_all(response.as_bytes()).await.unwrap();
        });

        let url = ServerUrl::new("http", "127.0.0.1", addr.port());
        let transport = connect(&url, &quick()).unwrap();
        assert_eq!(transport.send("hello".into()).await.unwrap(), "http:hello");
    }

    #[test]
    fn test_connect_unsupported_scheme() {
        let url = ServerUrl::new("ftp", "localhost", 21);
        let err = connect(&url, &ClientConfig::default()).err().unwrap();
        assert_eq!(err.to_string(), "Unsupported url scheme: ftp");
    }
}
