//! Viewer runtime
//!
//! One tokio task per viewer. The task owns the viewer outright and
//! waits on three things: host events, config republishes and the
//! viewer's next timer deadline. Everything the viewer does therefore
//! runs on one task, one step at a time.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use veil_core::{Clock, Environment, ProtectedViewer, ProtectionConfig, RawEvent, ViewerSnapshot};

use crate::clock::TokioClock;
use crate::error::RuntimeError;
use crate::Result;

const COMMAND_BUFFER: usize = 64;

enum ViewerCommand {
    Event(RawEvent),
    Snapshot(oneshot::Sender<ViewerSnapshot>),
    Shutdown,
}

#[derive(Clone, Default)]
pub struct ViewerRuntime {
    clock: Arc<TokioClock>,
}

impl ViewerRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock viewers spawned here must be built with
    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    /// Move `viewer` onto its own task. The latest value of `config` is
    /// applied before the first event.
    pub fn spawn<E>(
        &self,
        viewer: ProtectedViewer<E>,
        config: watch::Receiver<ProtectionConfig>,
    ) -> ViewerHandle
    where
        E: Environment + Send + 'static,
    {
        let session_id = viewer.session_id();
        let (commands, rx) = mpsc::channel(COMMAND_BUFFER);
        let clock = self.clock.clone();

        let task = tokio::spawn(run_viewer(viewer, rx, config, clock));

        tracing::debug!(session_id = %session_id, "Viewer task spawned");

        ViewerHandle {
            session_id,
            commands,
            task,
        }
    }
}

pub struct ViewerHandle {
    session_id: Uuid,
    commands: mpsc::Sender<ViewerCommand>,
    task: JoinHandle<ViewerSnapshot>,
}

impl ViewerHandle {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub async fn send(&self, event: RawEvent) -> Result<()> {
        self.commands
            .send(ViewerCommand::Event(event))
            .await
            .map_err(|_| RuntimeError::Stopped)
    }

    pub async fn snapshot(&self) -> Result<ViewerSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(ViewerCommand::Snapshot(reply))
            .await
            .map_err(|_| RuntimeError::Stopped)?;

        rx.await.map_err(|_| RuntimeError::Stopped)
    }

    /// Tear the viewer down and return its final state
    pub async fn shutdown(self) -> Result<ViewerSnapshot> {
        // The task may already be gone; the join below reports that
        let _ = self.commands.send(ViewerCommand::Shutdown).await;
        Ok(self.task.await?)
    }
}

async fn run_viewer<E: Environment>(
    mut viewer: ProtectedViewer<E>,
    mut commands: mpsc::Receiver<ViewerCommand>,
    mut config: watch::Receiver<ProtectionConfig>,
    clock: Arc<TokioClock>,
) -> ViewerSnapshot {
    let session_id = viewer.session_id();
    let mut config_open = true;

    let initial = *config.borrow_and_update();
    if let Err(e) = viewer.apply_config(initial) {
        tracing::warn!(session_id = %session_id, "Initial config not applied: {}", e);
    }

    loop {
        let wake = viewer.next_deadline().map(|deadline| clock.instant_for(deadline));

        tokio::select! {
            command = commands.recv() => match command {
                Some(ViewerCommand::Event(event)) => {
                    if let Err(e) = viewer.handle_event(&event) {
                        tracing::warn!(session_id = %session_id, "Event dropped: {}", e);
                    }
                }
                Some(ViewerCommand::Snapshot(reply)) => {
                    let _ = reply.send(viewer.snapshot());
                }
                Some(ViewerCommand::Shutdown) | None => break,
            },
            changed = config.changed(), if config_open => {
                if changed.is_err() {
                    // Publisher gone; keep the last config
                    config_open = false;
                    continue;
                }

                let next = *config.borrow_and_update();
                if let Err(e) = viewer.apply_config(next) {
                    tracing::warn!(session_id = %session_id, "Config not applied: {}", e);
                }
            }
            _ = tokio::time::sleep_until(wake.unwrap_or_else(Instant::now)), if wake.is_some() => {
                if let Err(e) = viewer.advance() {
                    tracing::warn!(session_id = %session_id, "Timers not fired: {}", e);
                }
            }
        }
    }

    viewer.teardown();
    viewer.snapshot()
}
