mod client;
mod event_server;
mod server;

pub use client::{subscribe_and_print, IpcClient};
pub use event_server::{EventBroadcaster, EventServer, SnapshotRequest};
pub use server::{CommandRequest, IpcServer};

pub const SOCKET_PATH: &str = "/tmp/hanare.sock";
pub const EVENT_SOCKET_PATH: &str = "/tmp/hanare-events.sock";
