//! TCP hardware bridge client
//!
//! Talks to the bridge daemon that fronts the physical slider and RGB
//! push-buttons. JSON lines in both directions: the bridge pushes
//! `{"event":"position","value":63}` and
//! `{"event":"button","uid":"btnA","released":true}`; we send
//! `{"cmd":"set_color","uid":"btnA","r":16,"g":16,"b":16}`.
//!
//! On close every indicator this client has addressed is reset to black
//! before the socket is released, so lamps never stay lit after shutdown.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use super::{HardwareEvent, PeripheralDriver};
use crate::error::HardwareError;

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
enum BridgeEvent {
    Position { value: i32 },
    Button { uid: String, released: bool },
}

#[derive(Serialize)]
struct ColorCommand<'a> {
    cmd: &'a str,
    uid: &'a str,
    r: u16,
    g: u16,
    b: u16,
}

/// Connected bridge client. Events arrive on the receiver returned by
/// [`BridgeDriver::connect`]; colors go out through [`PeripheralDriver`].
pub struct BridgeDriver {
    addr: String,
    writer: Mutex<Option<OwnedWriteHalf>>,
    /// Indicators to blank on close
    indicator_uids: Vec<String>,
}

impl BridgeDriver {
    /// Connect to the bridge and start the event reader.
    ///
    /// `indicator_uids` lists every indicator this run will address; they are
    /// reset to (0,0,0) when the driver closes.
    pub async fn connect(
        host: &str,
        port: u16,
        indicator_uids: Vec<String>,
    ) -> Result<(Self, mpsc::Receiver<HardwareEvent>), HardwareError> {
        let addr = format!("{}:{}", host, port);
        let stream = TcpStream::connect(&addr)
            .await
            .map_err(|source| HardwareError::Connect {
                addr: addr.clone(),
                source,
            })?;
        info!("Connected to hardware bridge at {}", addr);

        let (read_half, write_half) = stream.into_split();
        let (event_tx, event_rx) = mpsc::channel::<HardwareEvent>(64);
        tokio::spawn(Self::read_loop(read_half, event_tx));

        Ok((
            Self {
                addr,
                writer: Mutex::new(Some(write_half)),
                indicator_uids,
            },
            event_rx,
        ))
    }

    /// Parse bridge lines into hardware events until the socket closes.
    async fn read_loop(read_half: OwnedReadHalf, event_tx: mpsc::Sender<HardwareEvent>) {
        let mut lines = BufReader::new(read_half).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let event = match serde_json::from_str::<BridgeEvent>(&line) {
                        Ok(BridgeEvent::Position { value }) => HardwareEvent::Position(value),
                        Ok(BridgeEvent::Button { uid, released }) => {
                            HardwareEvent::Button { uid, released }
                        }
                        Err(e) => {
                            warn!("Ignoring malformed bridge line: {} ({})", line, e);
                            continue;
                        }
                    };
                    if event_tx.send(event).await.is_err() {
                        debug!("Hardware event receiver dropped, stopping bridge reader");
                        return;
                    }
                }
                // EOF and read errors both end the subsystem; during shutdown
                // the forced close lands here and must stay quiet.
                Ok(None) => {
                    debug!("Hardware bridge connection closed");
                    return;
                }
                Err(e) => {
                    debug!("Hardware bridge read ended: {}", e);
                    return;
                }
            }
        }
    }

    async fn send_color(
        writer: &mut OwnedWriteHalf,
        uid: &str,
        r: u16,
        g: u16,
        b: u16,
    ) -> Result<(), HardwareError> {
        let mut line = serde_json::to_vec(&ColorCommand {
            cmd: "set_color",
            uid,
            r,
            g,
            b,
        })
        .map_err(|e| HardwareError::Write(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        Ok(())
    }
}

#[async_trait]
impl PeripheralDriver for BridgeDriver {
    async fn set_indicator_color(
        &self,
        uid: &str,
        r: u16,
        g: u16,
        b: u16,
    ) -> Result<(), HardwareError> {
        let mut guard = self.writer.lock().await;
        let Some(writer) = guard.as_mut() else {
            // Already closed; indicator pushes after shutdown are moot.
            return Ok(());
        };
        Self::send_color(writer, uid, r, g, b).await
    }

    async fn close(&self) -> Result<(), HardwareError> {
        let mut guard = self.writer.lock().await;
        if let Some(mut writer) = guard.take() {
            for uid in &self.indicator_uids {
                if let Err(e) = Self::send_color(&mut writer, uid, 0, 0, 0).await {
                    warn!("Failed to blank indicator {}: {}", uid, e);
                    break;
                }
            }
            let _ = writer.shutdown().await;
            info!("Hardware bridge at {} closed", self.addr);
        }
        Ok(())
    }
}
