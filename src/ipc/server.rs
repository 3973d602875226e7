//! Unix domain socket server for IPC
//!
//! Provides request-response communication, forwards reset requests to the
//! trainer, and pushes trainer events to subscribed clients.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::unix::OwnedReadHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, error, info, warn};

use crate::events::{DisplayState, TrainerEvent};
use crate::state::Command;

use super::protocol::{Notification, Request, Response, TrainerStatus, MAX_MESSAGE_LEN};

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: Option<UnixListener>,
    state: Arc<RwLock<ServerState>>,
    shutdown_tx: broadcast::Sender<()>,
    /// Channel for handing reset requests to the trainer
    command_tx: mpsc::Sender<Command>,
    /// Source of trainer events for subscribed clients
    event_rx: Option<broadcast::Receiver<TrainerEvent>>,
}

/// Shared server state
struct ServerState {
    status: TrainerStatus,
    start_time: std::time::Instant,
}

/// Per-connection handles a client task needs
struct ClientContext {
    state: Arc<RwLock<ServerState>>,
    command_tx: mpsc::Sender<Command>,
    event_source: Option<broadcast::Receiver<TrainerEvent>>,
}

impl Server {
    /// Create a new IPC server
    pub fn new(socket_path: &Path, command_tx: mpsc::Sender<Command>) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // Set socket permissions to owner-only (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        let state = Arc::new(RwLock::new(ServerState {
            status: TrainerStatus::default(),
            start_time: std::time::Instant::now(),
        }));

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener: Some(listener),
            state,
            shutdown_tx,
            command_tx,
            event_rx: None,
        })
    }

    /// Create a new IPC server that can push trainer events
    pub fn with_events(
        socket_path: &Path,
        command_tx: mpsc::Sender<Command>,
        event_rx: broadcast::Receiver<TrainerEvent>,
    ) -> Result<Self> {
        let mut server = Self::new(socket_path, command_tx)?;
        server.event_rx = Some(event_rx);
        Ok(server)
    }

    /// Update the display state reported by `get_status`
    pub async fn set_display(&self, latest: DisplayState) {
        let mut server_state = self.state.write().await;
        let previous = server_state.status.display.replace(latest);

        let level = latest.level;
        if previous.map(|p| p.level) != Some(level) {
            info!(level, "IPC server: level updated");
        }
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        let listener = self.listener.as_ref().context("server not initialized")?;

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let context = ClientContext {
                        state: Arc::clone(&self.state),
                        command_tx: self.command_tx.clone(),
                        event_source: self.event_rx.as_ref().map(|rx| rx.resubscribe()),
                    };
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = Self::handle_client(stream, context) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Handle a single client connection
    async fn handle_client(stream: UnixStream, context: ClientContext) -> Result<()> {
        let (reader, mut writer) = stream.into_split();

        // Frames are read on their own task so a partial read is never
        // cancelled by an outgoing notification
        let (request_tx, mut request_rx) = mpsc::channel(8);
        let read_task = tokio::spawn(Self::read_requests(reader, request_tx));
        let mut events: Option<broadcast::Receiver<TrainerEvent>> = None;

        let result = loop {
            tokio::select! {
                request = request_rx.recv() => {
                    let Some(request) = request else {
                        debug!("client disconnected");
                        break Ok(());
                    };

                    let response = match request {
                        Ok(request) => {
                            debug!(?request, "received request");
                            let (response, subscribe) = Self::process_request(request, &context).await;
                            if subscribe && events.is_none() {
                                events = context.event_source.as_ref().map(|rx| rx.resubscribe());
                                debug!("client subscribed to notifications");
                            }
                            response
                        }
                        Err(message) => Response::error("bad_request", message),
                    };

                    if let Err(e) = Self::send_message(&mut writer, &response).await {
                        break Err(e);
                    }
                }
                event = next_event(&mut events) => match event {
                    Ok(event) => {
                        let note = Notification::Event { event };
                        if let Err(e) = Self::send_message(&mut writer, &note).await {
                            break Err(e);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        events = None;
                    }
                },
            }
        };

        read_task.abort();
        result
    }

    /// Read length-prefixed requests until EOF or a fatal framing error
    async fn read_requests(mut reader: OwnedReadHalf, request_tx: mpsc::Sender<Result<Request, String>>) {
        loop {
            let frame = match read_frame(&mut reader).await {
                Ok(Some(frame)) => frame,
                Ok(None) => return,
                Err(e) => {
                    warn!(?e, "dropping client");
                    return;
                }
            };

            let request = serde_json::from_slice::<Request>(&frame).map_err(|e| e.to_string());
            if request_tx.send(request).await.is_err() {
                return;
            }
        }
    }

    /// Send a length-prefixed JSON message
    async fn send_message<W, T>(stream: &mut W, msg: &T) -> Result<()>
    where
        W: AsyncWrite + Unpin,
        T: serde::Serialize,
    {
        let msg_bytes = serde_json::to_vec(msg)?;
        let msg_len = (msg_bytes.len() as u32).to_le_bytes();

        stream.write_all(&msg_len).await?;
        stream.write_all(&msg_bytes).await?;

        Ok(())
    }

    /// Process a request and return a response
    /// Returns (Response, should_subscribe)
    async fn process_request(request: Request, context: &ClientContext) -> (Response, bool) {
        match request {
            Request::Ping => (Response::Pong, false),

            Request::GetStatus => {
                let mut state = context.state.write().await;
                state.status.uptime_secs = state.start_time.elapsed().as_secs();
                (Response::Status(state.status.clone()), false)
            }

            Request::Reset => match context.command_tx.send(Command::Reset).await {
                Ok(()) => {
                    info!("reset requested via IPC");
                    (Response::ResetAccepted, false)
                }
                Err(_) => (Response::error("trainer_stopped", "trainer is not running"), false),
            },

            Request::Subscribe => {
                if context.event_source.is_some() {
                    (Response::Subscribed, true)
                } else {
                    (Response::error("no_events", "server has no event source"), false)
                }
            }
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        // Remove socket file
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}

/// Read one frame; `None` on a clean EOF between frames
async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_LEN {
        anyhow::bail!("message too large ({} bytes)", len);
    }

    let mut msg_buf = vec![0u8; len];
    reader.read_exact(&mut msg_buf).await?;
    Ok(Some(msg_buf))
}

/// Next event for a subscribed client; never resolves otherwise
async fn next_event(
    events: &mut Option<broadcast::Receiver<TrainerEvent>>,
) -> Result<TrainerEvent, broadcast::error::RecvError> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
