use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, oneshot};

use hanare_ipc::{EngineEvent, SubscribeRequest};

use super::EVENT_SOCKET_PATH;

pub type SnapshotRequest = oneshot::Sender<EngineEvent>;

/// Streams [`EngineEvent`]s to subscribers, one JSON object per line.
pub struct EventServer {
    socket_path: PathBuf,
    event_rx: broadcast::Receiver<EngineEvent>,
    snapshot_tx: mpsc::Sender<SnapshotRequest>,
}

impl EventServer {
    pub fn new(
        event_rx: broadcast::Receiver<EngineEvent>,
        snapshot_tx: mpsc::Sender<SnapshotRequest>,
    ) -> Self {
        Self::with_path(EVENT_SOCKET_PATH, event_rx, snapshot_tx)
    }

    pub fn with_path(
        path: impl AsRef<Path>,
        event_rx: broadcast::Receiver<EngineEvent>,
        snapshot_tx: mpsc::Sender<SnapshotRequest>,
    ) -> Self {
        Self {
            socket_path: path.as_ref().to_path_buf(),
            event_rx,
            snapshot_tx,
        }
    }

    pub async fn run(self) -> Result<()> {
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;
        tracing::info!("Event server listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let event_rx = self.event_rx.resubscribe();
                    let snapshot_tx = self.snapshot_tx.clone();
                    tokio::spawn(async move {
                        if let Err(e) = Self::handle_connection(stream, event_rx, snapshot_tx).await
                        {
                            tracing::debug!("Event subscriber disconnected: {}", e);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Event server accept error: {}", e);
                }
            }
        }
    }

    async fn handle_connection(
        stream: UnixStream,
        mut event_rx: broadcast::Receiver<EngineEvent>,
        snapshot_tx: mpsc::Sender<SnapshotRequest>,
    ) -> Result<()> {
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);
        let mut line = String::new();

        if reader.read_line(&mut line).await? == 0 {
            return Ok(());
        }

        let request: SubscribeRequest = serde_json::from_str(line.trim()).unwrap_or_default();
        let filter = request.effective_filter();
        tracing::debug!("New event subscriber with filter: {:?}", filter);

        if request.snapshot {
            let (resp_tx, resp_rx) = oneshot::channel();
            if snapshot_tx.send(resp_tx).await.is_ok() {
                if let Ok(snapshot) = resp_rx.await {
                    write_event(&mut writer, &snapshot).await?;
                }
            }
        }

        loop {
            match event_rx.recv().await {
                Ok(event) => {
                    if filter.matches(&event) {
                        write_event(&mut writer, &event).await?;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Event subscriber lagged by {} messages", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }

        Ok(())
    }
}

async fn write_event<W>(writer: &mut W, event: &EngineEvent) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let json = serde_json::to_string(event)?;
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

impl Drop for EventServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// Sender side of the event broadcast channel.
#[derive(Clone)]
pub struct EventBroadcaster {
    event_tx: broadcast::Sender<EngineEvent>,
}

impl EventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity);
        Self { event_tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_tx.subscribe()
    }

    pub fn send(&self, event: EngineEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hanare_ipc::EventFilter;

    fn socket_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("hanare-test-{}-{}.sock", name, std::process::id()))
    }

    #[tokio::test]
    async fn test_broadcaster_without_subscribers() {
        let broadcaster = EventBroadcaster::new(4);
        broadcaster.send(EngineEvent::EngineStarted);

        let mut rx = broadcaster.subscribe();
        broadcaster.send(EngineEvent::EngineStopped);
        assert_eq!(rx.recv().await.unwrap(), EngineEvent::EngineStopped);
    }

    #[tokio::test]
    async fn test_subscriber_gets_snapshot_then_filtered_events() {
        let path = socket_path("events");
        let broadcaster = EventBroadcaster::new(16);
        let (snapshot_tx, mut snapshot_rx) = mpsc::channel::<SnapshotRequest>(1);

        tokio::spawn(async move {
            while let Some(resp) = snapshot_rx.recv().await {
                let _ = resp.send(EngineEvent::EngineStarted);
            }
        });

        let server = EventServer::with_path(&path, broadcaster.subscribe(), snapshot_tx);
        tokio::spawn(server.run());
        while !path.exists() {
            tokio::task::yield_now().await;
        }

        let mut stream = UnixStream::connect(&path).await.unwrap();
        let request = SubscribeRequest {
            snapshot: true,
            filter: EventFilter {
                lifecycle: true,
                ..Default::default()
            },
        };
        let mut json = serde_json::to_string(&request).unwrap();
        json.push('\n');
        stream.write_all(json.as_bytes()).await.unwrap();

        let (reader, _writer) = stream.into_split();
        let mut reader = BufReader::new(reader);
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        assert_eq!(line.trim(), r#"{"type":"engine_started"}"#);

        broadcaster.send(EngineEvent::PerformanceSample {
            average_tick_micros: 10,
            max_tick_micros: 20,
            tick_count: 1,
            tracked_windows: 0,
        });
        broadcaster.send(EngineEvent::EngineStopped);

        line.clear();
        reader.read_line(&mut line).await.unwrap();
        assert_eq!(line.trim(), r#"{"type":"engine_stopped"}"#);

        let _ = std::fs::remove_file(&path);
    }
}
