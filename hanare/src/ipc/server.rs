use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;

use hanare_ipc::{Command, Response};

use super::SOCKET_PATH;

pub type CommandRequest = (Command, mpsc::Sender<Response>);

/// Newline-delimited JSON command socket. Each line is one [`Command`],
/// answered by one [`Response`] line.
pub struct IpcServer {
    socket_path: PathBuf,
    cmd_tx: mpsc::Sender<CommandRequest>,
}

impl IpcServer {
    pub fn new(cmd_tx: mpsc::Sender<CommandRequest>) -> Self {
        Self::with_path(SOCKET_PATH, cmd_tx)
    }

    pub fn with_path(path: impl AsRef<Path>, cmd_tx: mpsc::Sender<CommandRequest>) -> Self {
        Self {
            socket_path: path.as_ref().to_path_buf(),
            cmd_tx,
        }
    }

    pub async fn run(&self) -> Result<()> {
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;
        tracing::info!("IPC server listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let cmd_tx = self.cmd_tx.clone();
                    tokio::spawn(async move {
                        if let Err(e) = Self::handle_connection(stream, cmd_tx).await {
                            tracing::error!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Accept error: {}", e);
                }
            }
        }
    }

    async fn handle_connection(
        stream: UnixStream,
        cmd_tx: mpsc::Sender<CommandRequest>,
    ) -> Result<()> {
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);
        let mut line = String::new();

        loop {
            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                break;
            }
            let request = line.trim();
            if request.is_empty() {
                continue;
            }

            let response = dispatch(request, &cmd_tx).await;
            let json = serde_json::to_string(&response)?;
            writer.write_all(json.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }

        Ok(())
    }
}

async fn dispatch(line: &str, cmd_tx: &mpsc::Sender<CommandRequest>) -> Response {
    let cmd = match serde_json::from_str::<Command>(line) {
        Ok(cmd) => cmd,
        Err(e) => {
            return Response::Error {
                message: format!("Invalid command: {}", e),
            }
        }
    };
    tracing::debug!("Received command: {:?}", cmd);

    let (resp_tx, mut resp_rx) = mpsc::channel(1);
    if cmd_tx.send((cmd, resp_tx)).await.is_err() {
        return Response::Error {
            message: "Internal error: command channel closed".to_string(),
        };
    }
    resp_rx.recv().await.unwrap_or(Response::Error {
        message: "Internal error: no response".to_string(),
    })
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}
