use std::sync::mpsc as std_mpsc;

use tokio::sync::mpsc;

use crate::ipc::{CommandRequest, EventBroadcaster, EventServer, IpcServer, SnapshotRequest};
#[cfg(target_os = "macos")]
use crate::macos::DisplayReconfigEvent;
use hanare_ipc::{Command, EngineEvent};

pub struct IpcRelay {
    pub cmd_tx: std_mpsc::Sender<CommandRequest>,
    pub server_tx: mpsc::Sender<CommandRequest>,
    pub server_rx: mpsc::Receiver<CommandRequest>,
}

pub struct EventStreaming {
    pub broadcaster: EventBroadcaster,
    pub event_server_rx: tokio::sync::broadcast::Receiver<EngineEvent>,
    pub engine_event_rx: std_mpsc::Receiver<EngineEvent>,
}

pub struct SnapshotRelay {
    pub request_tx: mpsc::Sender<SnapshotRequest>,
    pub request_rx: mpsc::Receiver<SnapshotRequest>,
    pub main_tx: std_mpsc::Sender<SnapshotRequest>,
}

pub struct TokioChannels {
    pub ipc: IpcRelay,
    pub events: EventStreaming,
    pub snapshots: SnapshotRelay,
}

pub struct MainChannels {
    pub ipc_cmd_rx: std_mpsc::Receiver<CommandRequest>,
    pub engine_event_tx: std_mpsc::Sender<EngineEvent>,
    pub snapshot_request_rx: std_mpsc::Receiver<SnapshotRequest>,
    #[cfg(target_os = "macos")]
    pub display_reconfig_tx: std_mpsc::Sender<DisplayReconfigEvent>,
    #[cfg(target_os = "macos")]
    pub display_reconfig_rx: std_mpsc::Receiver<DisplayReconfigEvent>,
}

pub fn create_channels() -> (TokioChannels, MainChannels) {
    // IPC commands (tokio -> main thread)
    let (ipc_cmd_tx, ipc_cmd_rx) = std_mpsc::channel::<CommandRequest>();
    let (ipc_server_tx, ipc_server_rx) = mpsc::channel::<CommandRequest>(256);

    // Engine events (engine threads -> tokio)
    let (engine_event_tx, engine_event_rx) = std_mpsc::channel::<EngineEvent>();
    let broadcaster = EventBroadcaster::new(256);
    let event_server_rx = broadcaster.subscribe();

    // Snapshot requests (tokio -> main thread)
    let (snapshot_request_tx, snapshot_request_rx) = mpsc::channel::<SnapshotRequest>(16);
    let (snapshot_request_main_tx, snapshot_request_main_rx) =
        std_mpsc::channel::<SnapshotRequest>();

    #[cfg(target_os = "macos")]
    let (display_reconfig_tx, display_reconfig_rx) = std_mpsc::channel::<DisplayReconfigEvent>();

    let tokio_channels = TokioChannels {
        ipc: IpcRelay {
            cmd_tx: ipc_cmd_tx,
            server_tx: ipc_server_tx,
            server_rx: ipc_server_rx,
        },
        events: EventStreaming {
            broadcaster,
            event_server_rx,
            engine_event_rx,
        },
        snapshots: SnapshotRelay {
            request_tx: snapshot_request_tx,
            request_rx: snapshot_request_rx,
            main_tx: snapshot_request_main_tx,
        },
    };

    let main_channels = MainChannels {
        ipc_cmd_rx,
        engine_event_tx,
        snapshot_request_rx: snapshot_request_main_rx,
        #[cfg(target_os = "macos")]
        display_reconfig_tx,
        #[cfg(target_os = "macos")]
        display_reconfig_rx,
    };

    (tokio_channels, main_channels)
}

pub async fn run_async(channels: TokioChannels) {
    let TokioChannels {
        ipc,
        events,
        snapshots,
    } = channels;
    let IpcRelay {
        cmd_tx: ipc_cmd_tx,
        server_tx: ipc_server_tx,
        server_rx: mut ipc_rx,
    } = ipc;
    let EventStreaming {
        broadcaster,
        event_server_rx,
        engine_event_rx,
    } = events;
    let SnapshotRelay {
        request_tx: snapshot_request_tx,
        request_rx: mut snapshot_request_rx,
        main_tx: snapshot_request_main_tx,
    } = snapshots;

    tracing::info!("Tokio runtime started");

    let ipc_server = IpcServer::new(ipc_server_tx);
    tokio::spawn(async move {
        if let Err(e) = ipc_server.run().await {
            tracing::error!("IPC server error: {}", e);
        }
    });

    let event_server = EventServer::new(event_server_rx, snapshot_request_tx);
    tokio::spawn(async move {
        if let Err(e) = event_server.run().await {
            tracing::error!("Event server error: {}", e);
        }
    });

    // Engine threads emit on a std channel; fan out from a plain thread.
    std::thread::spawn(move || {
        while let Ok(event) = engine_event_rx.recv() {
            broadcaster.send(event);
        }
    });

    let quit_tx = ipc_cmd_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, shutting down");
            let (resp_tx, _resp_rx) = mpsc::channel(1);
            let _ = quit_tx.send((Command::Quit, resp_tx));
        }
    });

    loop {
        tokio::select! {
            Some((cmd, resp_tx)) = ipc_rx.recv() => {
                if ipc_cmd_tx.send((cmd, resp_tx)).is_err() {
                    tracing::error!("Failed to forward IPC command to main thread");
                    break;
                }
            }
            Some(snapshot_req) = snapshot_request_rx.recv() => {
                if snapshot_request_main_tx.send(snapshot_req).is_err() {
                    tracing::error!("Failed to forward snapshot request to main thread");
                }
            }
            else => break,
        }
    }

    tracing::info!("Tokio runtime exiting");
}
