use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use explorer_logging::explorer_warn;
use tokio::sync::mpsc as async_mpsc;

use crate::explorer::Explorer;
use crate::{ExplorerError, ExplorerEvent, FailureKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplorerCommand {
    OpenRoot(String),
    SwitchRoot(String),
    Toggle(String),
    Select(String),
    SetDrawer(bool),
    ToggleDrawer,
}

/// Runs the controller on its own thread with a current-thread runtime.
/// Root changes are handled in order; every other command runs as its own
/// task so a slow load never blocks later clicks.
pub struct ExplorerHandle {
    cmd_tx: async_mpsc::UnboundedSender<ExplorerCommand>,
    event_rx: mpsc::Receiver<ExplorerEvent>,
    worker: Option<thread::JoinHandle<()>>,
}

impl ExplorerHandle {
    pub fn spawn(explorer: Explorer) -> Result<Self, ExplorerError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| {
                ExplorerError::new(
                    FailureKind::InternalContractViolation,
                    format!("cannot start runtime: {err}"),
                )
            })?;
        let (cmd_tx, mut cmd_rx) = async_mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel();
        let explorer = Arc::new(explorer);

        let worker = thread::spawn(move || {
            runtime.block_on(async move {
                while let Some(command) = cmd_rx.recv().await {
                    let explorer = explorer.clone();
                    let event_tx = event_tx.clone();
                    match command {
                        ExplorerCommand::OpenRoot(_) | ExplorerCommand::SwitchRoot(_) => {
                            handle_command(&explorer, command, &event_tx).await;
                        }
                        _ => {
                            tokio::spawn(async move {
                                handle_command(&explorer, command, &event_tx).await;
                            });
                        }
                    }
                }
            });
        });

        Ok(Self {
            cmd_tx,
            event_rx,
            worker: Some(worker),
        })
    }

    /// Returns false once the controller has stopped.
    pub fn send(&self, command: ExplorerCommand) -> bool {
        self.cmd_tx.send(command).is_ok()
    }

    pub fn try_recv(&self) -> Option<ExplorerEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<ExplorerEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Stops accepting commands and waits for queued root changes to finish.
    pub fn shutdown(mut self) {
        let (closed, _) = async_mpsc::unbounded_channel();
        drop(std::mem::replace(&mut self.cmd_tx, closed));
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                explorer_warn!("explorer worker panicked");
            }
        }
    }
}

async fn handle_command(
    explorer: &Explorer,
    command: ExplorerCommand,
    event_tx: &mpsc::Sender<ExplorerEvent>,
) {
    let result = match command {
        ExplorerCommand::OpenRoot(root_id) => explorer.open_root(&root_id).await,
        ExplorerCommand::SwitchRoot(root_id) => explorer.switch_root(&root_id).await,
        ExplorerCommand::Toggle(id) => explorer.toggle(&id).await,
        ExplorerCommand::Select(id) => explorer.select(&id).await,
        ExplorerCommand::SetDrawer(open) => explorer.set_drawer_open(open).await,
        ExplorerCommand::ToggleDrawer => explorer.toggle_drawer().await,
    };
    if let Err(err) = result {
        explorer_warn!("command failed: {}", err);
    }
    for event in explorer.drain_events() {
        let _ = event_tx.send(event);
    }
}
