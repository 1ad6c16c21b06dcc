use std::sync::Arc;

use tokio::{
    sync::{broadcast, mpsc, oneshot},
    time::{sleep, sleep_until, Duration},
};

use crate::{
    core::chain::{ChainError, ChainSnapshot},
    image::ArtifactRef,
    op::EditOp,
    remote::{ImageBackend, RemoteError},
    session::{EditSession, SessionView},
    types::{AdjustKind, ImageId, RequestEpoch},
};

use super::{events::EditorEvent, scheduler::PreviewScheduler};

const NOTICE_LOAD_FAILED: &str = "Failed to load image.";
const NOTICE_PREVIEW_FAILED: &str = "Failed to preview edit.";
const NOTICE_COPY_FAILED: &str = "Failed to save copy.";
const NOTICE_DELETE_FAILED: &str = "Failed to delete image.";

#[derive(Debug)]
pub enum EditorError {
    Remote(RemoteError),
    Chain(ChainError),
    /// A save-style action was invoked without a rendered preview.
    NoPendingEdit,
    ChannelClosed,
}

impl From<RemoteError> for EditorError {
    fn from(value: RemoteError) -> Self {
        Self::Remote(value)
    }
}

impl From<ChainError> for EditorError {
    fn from(value: ChainError) -> Self {
        Self::Chain(value)
    }
}

impl std::fmt::Display for EditorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditorError::Remote(err) => write!(f, "{err}"),
            EditorError::Chain(err) => write!(f, "{err}"),
            EditorError::NoPendingEdit => f.write_str("no pending edit"),
            EditorError::ChannelClosed => f.write_str("editor loop is gone"),
        }
    }
}

impl std::error::Error for EditorError {}

#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Quiet window for adjustment-driven previews, in milliseconds.
    pub debounce_ms: u64,
    /// Delay before reclustering fires after a copy, letting the copy
    /// settle server-side.
    pub copy_settle_ms: u64,
    pub command_queue_bound: usize,
    pub event_capacity: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            copy_settle_ms: 500,
            command_queue_bound: 64,
            event_capacity: 256,
        }
    }
}

/// Cloneable handle to a spawned editing session.
pub struct EditorHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<EditorEvent>,
}

impl Clone for EditorHandle {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            events_tx: self.events_tx.clone(),
        }
    }
}

enum Command {
    Rotate {
        degrees: i32,
        resp: oneshot::Sender<Result<(), EditorError>>,
    },
    Mirror {
        resp: oneshot::Sender<Result<(), EditorError>>,
    },
    SetAdjustment {
        kind: AdjustKind,
        value: i16,
        resp: oneshot::Sender<Result<(), EditorError>>,
    },
    Colorize {
        resp: oneshot::Sender<Result<(), EditorError>>,
    },
    Save {
        resp: oneshot::Sender<Result<(), EditorError>>,
    },
    SaveAsCopy {
        resp: oneshot::Sender<Result<Option<ImageId>, EditorError>>,
    },
    Revert {
        resp: oneshot::Sender<Result<(), EditorError>>,
    },
    RequestDelete {
        resp: oneshot::Sender<Result<(), EditorError>>,
    },
    ConfirmDelete {
        resp: oneshot::Sender<Result<(), EditorError>>,
    },
    PreviewSticker {
        resp: oneshot::Sender<Result<ArtifactRef, EditorError>>,
    },
    CreateSticker {
        resp: oneshot::Sender<Result<ArtifactRef, EditorError>>,
    },
    View {
        resp: oneshot::Sender<SessionView>,
    },
    Shutdown {
        resp: oneshot::Sender<Result<(), EditorError>>,
    },
}

enum TaskDone {
    Preview {
        epoch: RequestEpoch,
        result: Result<ArtifactRef, RemoteError>,
    },
    CopyFinished {
        result: Result<ImageId, RemoteError>,
    },
}

/// Spawns the single-writer coordinator for one image and returns its
/// handle. The baseline record is fetched before the first command is
/// processed.
pub fn spawn_editor(
    image_id: ImageId,
    backend: Arc<dyn ImageBackend>,
    config: EditorConfig,
) -> EditorHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.command_queue_bound);
    let (events_tx, _) = broadcast::channel::<EditorEvent>(config.event_capacity);
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<TaskDone>();

    let events_tx_loop = events_tx.clone();

    tokio::spawn(async move {
        let mut ed = EditorLoop {
            session: EditSession::new(image_id),
            scheduler: PreviewScheduler::new(Duration::from_millis(config.debounce_ms)),
            saving_copy: false,
            delete_requested: false,
            backend,
            events_tx: events_tx_loop,
            done_tx,
            config,
        };

        match ed.backend.fetch_image(image_id).await {
            Ok(record) => ed.session.set_baseline(record),
            Err(err) => {
                tracing::warn!(image_id, %err, "baseline fetch failed");
                ed.notify(NOTICE_LOAD_FAILED);
            }
        }

        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    let Some(cmd) = cmd else { break; };
                    if ed.handle_command(cmd).await {
                        break;
                    }
                }
                done = done_rx.recv() => {
                    if let Some(done) = done {
                        ed.handle_task_done(done);
                    }
                }
                _ = sleep_until(ed.scheduler.deadline()), if ed.scheduler.is_armed() => {
                    if let Some(chain) = ed.scheduler.fire() {
                        ed.dispatch_preview(chain);
                    }
                }
            }
        }
    });

    EditorHandle { cmd_tx, events_tx }
}

impl EditorHandle {
    /// Subscribes to the session's event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.events_tx.subscribe()
    }

    /// Appends a rotation (multiple of 90 degrees) and requests a preview
    /// immediately.
    pub async fn rotate(&self, degrees: i32) -> Result<(), EditorError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Rotate { degrees, resp: tx })
            .await
            .map_err(|_| EditorError::ChannelClosed)?;
        rx.await.map_err(|_| EditorError::ChannelClosed)?
    }

    /// Appends a horizontal flip and requests a preview immediately.
    pub async fn mirror(&self) -> Result<(), EditorError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Mirror { resp: tx })
            .await
            .map_err(|_| EditorError::ChannelClosed)?;
        rx.await.map_err(|_| EditorError::ChannelClosed)?
    }

    /// Updates one slider. The preview request is debounced; only the last
    /// value inside the quiet window reaches the network.
    pub async fn set_adjustment(&self, kind: AdjustKind, value: i16) -> Result<(), EditorError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::SetAdjustment {
                kind,
                value,
                resp: tx,
            })
            .await
            .map_err(|_| EditorError::ChannelClosed)?;
        rx.await.map_err(|_| EditorError::ChannelClosed)?
    }

    /// Requests one-shot server-side colorization, bypassing the chain.
    pub async fn colorize(&self) -> Result<(), EditorError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Colorize { resp: tx })
            .await
            .map_err(|_| EditorError::ChannelClosed)?;
        rx.await.map_err(|_| EditorError::ChannelClosed)?
    }

    /// Commits the rendered preview over the source image and rebaselines
    /// the session. Fails with [`EditorError::NoPendingEdit`] when nothing
    /// was rendered.
    pub async fn save(&self) -> Result<(), EditorError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Save { resp: tx })
            .await
            .map_err(|_| EditorError::ChannelClosed)?;
        rx.await.map_err(|_| EditorError::ChannelClosed)?
    }

    /// Persists original-plus-chain under a new identity, leaving the
    /// original untouched. Returns `Ok(None)` when a copy is already in
    /// flight — issuing it twice would create duplicate images.
    pub async fn save_as_copy(&self) -> Result<Option<ImageId>, EditorError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::SaveAsCopy { resp: tx })
            .await
            .map_err(|_| EditorError::ChannelClosed)?;
        rx.await.map_err(|_| EditorError::ChannelClosed)?
    }

    /// Discards all pending edits, cancels any undispatched preview, and
    /// re-fetches the original baseline.
    pub async fn revert(&self) -> Result<(), EditorError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Revert { resp: tx })
            .await
            .map_err(|_| EditorError::ChannelClosed)?;
        rx.await.map_err(|_| EditorError::ChannelClosed)?
    }

    /// First phase of deletion: opens the confirmation.
    pub async fn request_delete(&self) -> Result<(), EditorError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::RequestDelete { resp: tx })
            .await
            .map_err(|_| EditorError::ChannelClosed)?;
        rx.await.map_err(|_| EditorError::ChannelClosed)?
    }

    /// Second phase of deletion: performs the remote delete and ends the
    /// session regardless of network outcome.
    pub async fn confirm_delete(&self) -> Result<(), EditorError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::ConfirmDelete { resp: tx })
            .await
            .map_err(|_| EditorError::ChannelClosed)?;
        rx.await.map_err(|_| EditorError::ChannelClosed)?
    }

    /// Renders a sticker candidate for the confirmation UI.
    pub async fn preview_sticker(&self) -> Result<ArtifactRef, EditorError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::PreviewSticker { resp: tx })
            .await
            .map_err(|_| EditorError::ChannelClosed)?;
        rx.await.map_err(|_| EditorError::ChannelClosed)?
    }

    /// Persists a sticker cut from the source image.
    pub async fn create_sticker(&self) -> Result<ArtifactRef, EditorError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::CreateSticker { resp: tx })
            .await
            .map_err(|_| EditorError::ChannelClosed)?;
        rx.await.map_err(|_| EditorError::ChannelClosed)?
    }

    /// Read-only copy of the session state.
    pub async fn view(&self) -> Result<SessionView, EditorError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::View { resp: tx })
            .await
            .map_err(|_| EditorError::ChannelClosed)?;
        rx.await.map_err(|_| EditorError::ChannelClosed)
    }

    /// Stops the coordinator loop.
    pub async fn shutdown(&self) -> Result<(), EditorError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Shutdown { resp: tx })
            .await
            .map_err(|_| EditorError::ChannelClosed)?;
        rx.await.map_err(|_| EditorError::ChannelClosed)?
    }
}

struct EditorLoop {
    session: EditSession,
    scheduler: PreviewScheduler,
    saving_copy: bool,
    delete_requested: bool,
    backend: Arc<dyn ImageBackend>,
    events_tx: broadcast::Sender<EditorEvent>,
    done_tx: mpsc::UnboundedSender<TaskDone>,
    config: EditorConfig,
}

impl EditorLoop {
    /// Returns true when the session has ended and the loop should stop.
    async fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Rotate { degrees, resp } => {
                let _ = resp.send(self.apply_discrete(EditOp::Rotate { degrees }));
            }
            Command::Mirror { resp } => {
                let _ = resp.send(self.apply_discrete(EditOp::Mirror));
            }
            Command::SetAdjustment { kind, value, resp } => {
                let chain = self.session.set_adjustment(kind, value);
                self.scheduler.arm(chain);
                let _ = resp.send(Ok(()));
            }
            Command::Colorize { resp } => {
                // Deliberate one-shot action; a pending slider chain would
                // only repaint pre-color state, so drop it.
                self.scheduler.cancel();
                self.session.mark_pending();
                self.dispatch_colorize();
                let _ = resp.send(Ok(()));
            }
            Command::Save { resp } => {
                let _ = resp.send(self.save().await);
            }
            Command::SaveAsCopy { resp } => {
                self.save_as_copy(resp);
            }
            Command::Revert { resp } => {
                let _ = resp.send(self.revert().await);
            }
            Command::RequestDelete { resp } => {
                self.delete_requested = true;
                let _ = self.events_tx.send(EditorEvent::DeleteRequested {
                    id: self.session.image_id(),
                });
                let _ = resp.send(Ok(()));
            }
            Command::ConfirmDelete { resp } => {
                if !self.delete_requested {
                    // Stray confirmation without an open request is a
                    // no-op, same contract as the copy guard.
                    let _ = resp.send(Ok(()));
                    return false;
                }
                let _ = resp.send(self.confirm_delete().await);
                return true;
            }
            Command::PreviewSticker { resp } => {
                let result = self
                    .backend
                    .preview_sticker(self.session.image_id())
                    .await
                    .map_err(EditorError::from);
                let _ = resp.send(result);
            }
            Command::CreateSticker { resp } => {
                let _ = resp.send(self.create_sticker().await);
            }
            Command::View { resp } => {
                let _ = resp.send(self.session.view());
            }
            Command::Shutdown { resp } => {
                let _ = resp.send(Ok(()));
                return true;
            }
        }

        false
    }

    fn handle_task_done(&mut self, done: TaskDone) {
        match done {
            TaskDone::Preview { epoch, result } => match result {
                Ok(artifact) => {
                    if self.session.accept_preview(epoch, artifact.clone()) {
                        let _ = self
                            .events_tx
                            .send(EditorEvent::PreviewUpdated { epoch, artifact });
                    } else {
                        tracing::debug!(
                            epoch,
                            current = self.session.current_epoch(),
                            "dropping stale preview response"
                        );
                    }
                }
                Err(err) => {
                    if epoch == self.session.current_epoch() {
                        tracing::warn!(epoch, %err, "preview request failed");
                        self.notify(NOTICE_PREVIEW_FAILED);
                    } else {
                        tracing::debug!(epoch, "dropping stale preview failure");
                    }
                }
            },
            TaskDone::CopyFinished { result } => {
                self.saving_copy = false;
                match result {
                    Ok(new_id) => {
                        let _ = self.events_tx.send(EditorEvent::CopySaved { new_id });
                    }
                    Err(err) => {
                        tracing::warn!(%err, "save-as-copy failed");
                        self.notify(NOTICE_COPY_FAILED);
                    }
                }
            }
        }
    }

    fn apply_discrete(&mut self, op: EditOp) -> Result<(), EditorError> {
        let chain = self.session.apply_discrete(op)?;
        // The immediate request carries the full chain, slider entries
        // included, so any armed debounce is superseded.
        self.scheduler.cancel();
        self.dispatch_preview(chain);
        Ok(())
    }

    fn dispatch_preview(&mut self, chain: ChainSnapshot) {
        let epoch = self.session.begin_request();
        let image_id = self.session.image_id();
        let backend = Arc::clone(&self.backend);
        let done_tx = self.done_tx.clone();
        tracing::debug!(epoch, ops = chain.len(), "dispatching preview");
        tokio::spawn(async move {
            let result = backend.preview_chain(image_id, &chain).await;
            let _ = done_tx.send(TaskDone::Preview { epoch, result });
        });
    }

    fn dispatch_colorize(&mut self) {
        let epoch = self.session.begin_request();
        let image_id = self.session.image_id();
        let backend = Arc::clone(&self.backend);
        let done_tx = self.done_tx.clone();
        tracing::debug!(epoch, "dispatching colorize");
        tokio::spawn(async move {
            let result = backend.colorize(image_id).await;
            let _ = done_tx.send(TaskDone::Preview { epoch, result });
        });
    }

    async fn save(&mut self) -> Result<(), EditorError> {
        if self.session.preview().is_none() {
            return Err(EditorError::NoPendingEdit);
        }

        let image_id = self.session.image_id();
        self.backend.commit_replace(image_id).await?;

        // Fresh chain against the new baseline; the epoch bump inside
        // reset leaves any in-flight preview of the old chain stale.
        self.scheduler.cancel();
        self.session.reset();
        match self.backend.fetch_image(image_id).await {
            Ok(record) => self.session.set_baseline(record),
            Err(err) => {
                tracing::warn!(image_id, %err, "baseline refresh after save failed");
                self.notify(NOTICE_LOAD_FAILED);
            }
        }

        let _ = self.events_tx.send(EditorEvent::Saved { id: image_id });
        self.spawn_recluster(Duration::ZERO);
        Ok(())
    }

    fn save_as_copy(&mut self, resp: oneshot::Sender<Result<Option<ImageId>, EditorError>>) {
        if self.saving_copy {
            let _ = resp.send(Ok(None));
            return;
        }
        if self.session.preview().is_none() {
            let _ = resp.send(Err(EditorError::NoPendingEdit));
            return;
        }

        self.saving_copy = true;
        let image_id = self.session.image_id();
        let backend = Arc::clone(&self.backend);
        let done_tx = self.done_tx.clone();
        let settle = Duration::from_millis(self.config.copy_settle_ms);

        tokio::spawn(async move {
            let result = backend.create_copy(image_id).await;

            if result.is_ok() {
                let backend = Arc::clone(&backend);
                tokio::spawn(async move {
                    sleep(settle).await;
                    if let Err(err) = backend.trigger_recluster().await {
                        tracing::debug!(%err, "recluster after copy failed");
                    }
                });
            }

            let _ = resp.send(
                result
                    .clone()
                    .map(Some)
                    .map_err(EditorError::Remote),
            );
            let _ = done_tx.send(TaskDone::CopyFinished { result });
        });
    }

    async fn revert(&mut self) -> Result<(), EditorError> {
        self.scheduler.cancel();
        self.session.reset();

        let image_id = self.session.image_id();
        match self.backend.fetch_image(image_id).await {
            Ok(record) => {
                self.session.set_baseline(record);
                let _ = self.events_tx.send(EditorEvent::Reverted { id: image_id });
                Ok(())
            }
            Err(err) => {
                tracing::warn!(image_id, %err, "baseline refresh after revert failed");
                self.notify(NOTICE_LOAD_FAILED);
                Err(EditorError::Remote(err))
            }
        }
    }

    async fn confirm_delete(&mut self) -> Result<(), EditorError> {
        self.scheduler.cancel();
        let image_id = self.session.image_id();

        let outcome = match self.backend.delete_image(image_id).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_not_found() => {
                // Already gone is the same user-visible success as deleted
                // now.
                tracing::debug!(image_id, "delete target already gone");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(image_id, %err, "delete failed");
                self.notify(NOTICE_DELETE_FAILED);
                Err(EditorError::Remote(err))
            }
        };

        // The session ends regardless of how the network call went.
        let _ = self.events_tx.send(EditorEvent::Deleted { id: image_id });
        if outcome.is_ok() {
            self.spawn_recluster(Duration::ZERO);
        }
        outcome
    }

    async fn create_sticker(&mut self) -> Result<ArtifactRef, EditorError> {
        let image_id = self.session.image_id();
        let artifact = self.backend.create_sticker(image_id).await?;
        let _ = self.events_tx.send(EditorEvent::StickerSaved { id: image_id });
        Ok(artifact)
    }

    fn spawn_recluster(&self, delay: Duration) {
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            if delay > Duration::ZERO {
                sleep(delay).await;
            }
            if let Err(err) = backend.trigger_recluster().await {
                tracing::debug!(%err, "recluster trigger failed");
            }
        });
    }

    fn notify(&self, message: &str) {
        let _ = self.events_tx.send(EditorEvent::Notice {
            message: message.to_string(),
        });
    }
}
