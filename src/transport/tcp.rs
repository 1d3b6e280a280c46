//! TCP channel transport
//!
//! Newline-delimited JSON frames over a plain TCP stream: a `hello` frame
//! carrying the configured credentials at connect time, then one `state`
//! frame per submission. A failed send drops the connection and surfaces a
//! [`TransportError`]; the caller decides whether to reconnect.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::debug;

use super::{ChannelTransport, Credentials};
use crate::error::TransportError;
use crate::report::PadReport;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct HelloFrame<'a> {
    hello: &'a str,
    version: u8,
    encryption_mode: &'a str,
    encryption_key: &'a str,
}

#[derive(Serialize)]
struct StateFrame<'a> {
    gamepad: u8,
    report: &'a PadReport,
}

/// JSON-line transport to one remote receiver.
pub struct TcpTransport {
    addr: String,
    credentials: Credentials,
    stream: Mutex<Option<TcpStream>>,
}

impl TcpTransport {
    pub fn new(host: &str, port: u16, credentials: Credentials) -> Self {
        Self {
            addr: format!("{}:{}", host, port),
            credentials,
            stream: Mutex::new(None),
        }
    }

    async fn write_frame(
        &self,
        stream: &mut TcpStream,
        frame: &impl Serialize,
    ) -> Result<(), TransportError> {
        let mut line = serde_json::to_vec(frame)?;
        line.push(b'\n');
        stream
            .write_all(&line)
            .await
            .map_err(|source| TransportError::Send {
                addr: self.addr.clone(),
                source,
            })
    }
}

#[async_trait]
impl ChannelTransport for TcpTransport {
    fn describe(&self) -> String {
        self.addr.clone()
    }

    async fn connect(&self) -> Result<(), TransportError> {
        let connect = TcpStream::connect(&self.addr);
        let mut stream = match timeout(CONNECT_TIMEOUT, connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(TransportError::Connect {
                    addr: self.addr.clone(),
                    source,
                })
            }
            Err(_) => {
                return Err(TransportError::Connect {
                    addr: self.addr.clone(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        "connect timed out",
                    ),
                })
            }
        };

        // Latency matters more than throughput for controller state.
        stream.set_nodelay(true).map_err(|source| TransportError::Connect {
            addr: self.addr.clone(),
            source,
        })?;

        self.write_frame(
            &mut stream,
            &HelloFrame {
                hello: "padcast",
                version: 1,
                encryption_mode: &self.credentials.mode,
                encryption_key: &self.credentials.key,
            },
        )
        .await?;

        debug!("Connected to channel transport {}", self.addr);
        *self.stream.lock().await = Some(stream);
        Ok(())
    }

    async fn submit(&self, remote_index: u8, report: &PadReport) -> Result<(), TransportError> {
        let mut guard = self.stream.lock().await;
        let stream = guard.as_mut().ok_or_else(|| TransportError::NotConnected {
            addr: self.addr.clone(),
        })?;

        let frame = StateFrame {
            gamepad: remote_index,
            report,
        };

        if let Err(e) = self.write_frame(stream, &frame).await {
            // Drop the broken connection so the failure is visible once,
            // not on every subsequent write.
            *guard = None;
            return Err(e);
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        if let Some(mut stream) = self.stream.lock().await.take() {
            // Shutdown errors during teardown are expected; swallow them.
            let _ = stream.shutdown().await;
            debug!("Closed channel transport {}", self.addr);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncBufReadExt;

    #[tokio::test]
    async fn submit_without_connect_is_rejected() {
        let transport = TcpTransport::new("localhost", 1, Credentials::default());
        let err = transport
            .submit(0, &PadReport::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::NotConnected { .. }));
    }

    #[tokio::test]
    async fn connect_sends_hello_and_submit_sends_state_frames() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut lines = tokio::io::BufReader::new(stream).lines();
            let hello = lines.next_line().await.unwrap().unwrap();
            let state = lines.next_line().await.unwrap().unwrap();
            (hello, state)
        });

        let transport = TcpTransport::new(
            "127.0.0.1",
            port,
            Credentials {
                key: "secret".to_string(),
                mode: "aes-gcm".to_string(),
            },
        );
        transport.connect().await.unwrap();

        let report = PadReport {
            buttons: 0x1000,
            ..PadReport::default()
        };
        transport.submit(3, &report).await.unwrap();
        transport.close().await.unwrap();

        let (hello, state) = server.await.unwrap();

        let hello: serde_json::Value = serde_json::from_str(&hello).unwrap();
        assert_eq!(hello["hello"], "padcast");
        assert_eq!(hello["encryption_mode"], "aes-gcm");

        let state: serde_json::Value = serde_json::from_str(&state).unwrap();
        assert_eq!(state["gamepad"], 3);
        assert_eq!(state["report"]["buttons"], 0x1000);
    }

    #[tokio::test]
    async fn connect_failure_is_reported() {
        // Port 1 is essentially guaranteed closed.
        let transport = TcpTransport::new("127.0.0.1", 1, Credentials::default());
        let err = transport.connect().await.unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }));
    }
}
