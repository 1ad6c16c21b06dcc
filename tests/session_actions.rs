use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::time::{sleep, timeout};

use editchain::{
    image::{ArtifactRef, ImageRecord},
    op::EditOp,
    remote::{ImageBackend, RemoteError, RemoteResult},
    runtime::{
        events::EditorEvent,
        handle::{spawn_editor, EditorConfig, EditorError},
    },
    session::EditState,
    types::{AdjustKind, ImageId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Call {
    Fetch,
    Preview,
    Commit,
    Copy,
    Delete,
    StickerPreview,
    StickerCreate,
    Recluster,
}

/// Backend that logs every call; copy latency and delete outcome are
/// configurable per test.
struct LoggingBackend {
    calls: Mutex<Vec<Call>>,
    copy_delay_ms: u64,
    delete_result: RemoteResult<()>,
    counter: AtomicU64,
}

impl LoggingBackend {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            copy_delay_ms: 0,
            delete_result: Ok(()),
            counter: AtomicU64::new(0),
        }
    }

    fn with_copy_delay(mut self, ms: u64) -> Self {
        self.copy_delay_ms = ms;
        self
    }

    fn with_delete_result(mut self, result: RemoteResult<()>) -> Self {
        self.delete_result = result;
        self
    }

    fn log(&self, call: Call) {
        self.calls.lock().expect("lock").push(call);
    }

    fn count(&self, call: Call) -> usize {
        self.calls
            .lock()
            .expect("lock")
            .iter()
            .filter(|c| **c == call)
            .count()
    }
}

#[async_trait]
impl ImageBackend for LoggingBackend {
    async fn fetch_image(&self, id: ImageId) -> RemoteResult<ImageRecord> {
        self.log(Call::Fetch);
        Ok(ImageRecord {
            id,
            image: format!("http://host/media/uploads/img_{id}.jpg"),
            uploaded_at: None,
            labels: vec![],
            is_deleted: false,
        })
    }

    async fn preview_chain(&self, _id: ImageId, _chain: &[EditOp]) -> RemoteResult<ArtifactRef> {
        self.log(Call::Preview);
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ArtifactRef::new(format!("edited/preview_{n}.jpg")))
    }

    async fn commit_replace(&self, _id: ImageId) -> RemoteResult<()> {
        self.log(Call::Commit);
        Ok(())
    }

    async fn create_copy(&self, id: ImageId) -> RemoteResult<ImageId> {
        self.log(Call::Copy);
        if self.copy_delay_ms > 0 {
            sleep(Duration::from_millis(self.copy_delay_ms)).await;
        }
        Ok(1000 + id)
    }

    async fn colorize(&self, _id: ImageId) -> RemoteResult<ArtifactRef> {
        Err(RemoteError::Network("unexpected call".to_string()))
    }

    async fn preview_sticker(&self, _id: ImageId) -> RemoteResult<ArtifactRef> {
        self.log(Call::StickerPreview);
        Ok(ArtifactRef::new("media/previews/sticker.png"))
    }

    async fn create_sticker(&self, id: ImageId) -> RemoteResult<ArtifactRef> {
        self.log(Call::StickerCreate);
        Ok(ArtifactRef::new(format!(
            "http://host/media/uploads/sticker_{id}.png"
        )))
    }

    async fn delete_image(&self, _id: ImageId) -> RemoteResult<()> {
        self.log(Call::Delete);
        self.delete_result.clone()
    }

    async fn trigger_recluster(&self) -> RemoteResult<()> {
        self.log(Call::Recluster);
        Ok(())
    }
}

async fn next_event(events: &mut tokio::sync::broadcast::Receiver<EditorEvent>) -> EditorEvent {
    timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("event timeout")
        .expect("recv")
}

/// Makes one rendered edit so save-style preconditions hold.
async fn render_one_edit(
    editor: &editchain::runtime::handle::EditorHandle,
    events: &mut tokio::sync::broadcast::Receiver<EditorEvent>,
) {
    editor.rotate(90).await.expect("rotate");
    let evt = next_event(events).await;
    assert!(matches!(evt, EditorEvent::PreviewUpdated { .. }));
}

#[tokio::test(start_paused = true)]
async fn save_without_rendered_preview_fails() {
    let backend = Arc::new(LoggingBackend::new());
    let editor = spawn_editor(1, backend.clone(), EditorConfig::default());

    let err = editor.save().await.unwrap_err();
    assert!(matches!(err, EditorError::NoPendingEdit));
    assert_eq!(backend.count(Call::Commit), 0);

    let err = editor.save_as_copy().await.unwrap_err();
    assert!(matches!(err, EditorError::NoPendingEdit));
    assert_eq!(backend.count(Call::Copy), 0);

    editor.shutdown().await.expect("shutdown");
}

#[tokio::test(start_paused = true)]
async fn save_commits_and_starts_fresh_session() {
    let backend = Arc::new(LoggingBackend::new());
    let editor = spawn_editor(2, backend.clone(), EditorConfig::default());
    let mut events = editor.subscribe();

    render_one_edit(&editor, &mut events).await;
    editor.save().await.expect("save");

    assert_eq!(next_event(&mut events).await, EditorEvent::Saved { id: 2 });

    let view = editor.view().await.expect("view");
    assert!(view.chain.is_empty());
    assert!(view.preview.is_none());
    assert_eq!(view.state, EditState::Clean);

    assert_eq!(backend.count(Call::Commit), 1);
    // Initial load plus post-save refresh.
    assert_eq!(backend.count(Call::Fetch), 2);

    // Reclustering is fire-and-forget and must have been kicked off.
    sleep(Duration::from_millis(50)).await;
    assert_eq!(backend.count(Call::Recluster), 1);

    editor.shutdown().await.expect("shutdown");
}

#[tokio::test(start_paused = true)]
async fn save_as_copy_is_not_reentrant() {
    let backend = Arc::new(LoggingBackend::new().with_copy_delay(200));
    let editor = spawn_editor(3, backend.clone(), EditorConfig::default());
    let mut events = editor.subscribe();

    render_one_edit(&editor, &mut events).await;

    let first_handle = editor.clone();
    let first = tokio::spawn(async move { first_handle.save_as_copy().await });
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;

    // Second tap while the copy is outstanding coalesces into a no-op.
    let second = editor.save_as_copy().await.expect("second save_as_copy");
    assert_eq!(second, None);

    let first = first.await.expect("join").expect("first save_as_copy");
    assert_eq!(first, Some(1003));
    assert_eq!(backend.count(Call::Copy), 1);

    assert_eq!(
        next_event(&mut events).await,
        EditorEvent::CopySaved { new_id: 1003 },
    );

    // The guard clears once the copy settles; reclustering follows the
    // fixed settle delay.
    let third = editor.save_as_copy().await.expect("third save_as_copy");
    assert_eq!(third, Some(1003));
    assert_eq!(backend.count(Call::Copy), 2);

    sleep(Duration::from_millis(800)).await;
    assert!(backend.count(Call::Recluster) >= 1);

    editor.shutdown().await.expect("shutdown");
}

#[tokio::test(start_paused = true)]
async fn revert_clears_chain_and_cancels_pending_preview() {
    let backend = Arc::new(LoggingBackend::new());
    let editor = spawn_editor(4, backend.clone(), EditorConfig::default());
    let mut events = editor.subscribe();

    render_one_edit(&editor, &mut events).await;
    editor
        .set_adjustment(AdjustKind::Contrast, -20)
        .await
        .expect("adjust");
    editor.revert().await.expect("revert");

    assert_eq!(next_event(&mut events).await, EditorEvent::Reverted { id: 4 });

    // Past the quiet window: the cancelled slider chain must not fire.
    sleep(Duration::from_millis(400)).await;
    assert_eq!(backend.count(Call::Preview), 1);

    let view = editor.view().await.expect("view");
    assert!(view.chain.is_empty());
    assert!(view.preview.is_none());
    assert_eq!(view.state, EditState::Clean);
    assert!(view
        .displayed
        .expect("displayed")
        .starts_with("http://host/media/uploads/img_4.jpg?t="));

    editor.shutdown().await.expect("shutdown");
}

#[tokio::test(start_paused = true)]
async fn delete_is_two_phase_and_ends_the_session() {
    let backend = Arc::new(LoggingBackend::new());
    let editor = spawn_editor(5, backend.clone(), EditorConfig::default());
    let mut events = editor.subscribe();

    // A stray confirm with no open request does nothing.
    editor.confirm_delete().await.expect("stray confirm");
    assert_eq!(backend.count(Call::Delete), 0);

    editor.request_delete().await.expect("request");
    assert_eq!(
        next_event(&mut events).await,
        EditorEvent::DeleteRequested { id: 5 },
    );

    editor.confirm_delete().await.expect("confirm");
    assert_eq!(next_event(&mut events).await, EditorEvent::Deleted { id: 5 });
    assert_eq!(backend.count(Call::Delete), 1);

    // The loop has ended; the session is gone.
    let err = editor.view().await.unwrap_err();
    assert!(matches!(err, EditorError::ChannelClosed));
}

#[tokio::test(start_paused = true)]
async fn delete_treats_already_gone_as_success() {
    let backend = Arc::new(LoggingBackend::new().with_delete_result(Err(
        RemoteError::Rejected {
            status: 404,
            message: "Image not found".to_string(),
        },
    )));
    let editor = spawn_editor(6, backend.clone(), EditorConfig::default());
    let mut events = editor.subscribe();

    editor.request_delete().await.expect("request");
    assert_eq!(
        next_event(&mut events).await,
        EditorEvent::DeleteRequested { id: 6 },
    );

    editor.confirm_delete().await.expect("confirm");
    assert_eq!(next_event(&mut events).await, EditorEvent::Deleted { id: 6 });
}

#[tokio::test(start_paused = true)]
async fn delete_failure_still_ends_the_session() {
    let backend = Arc::new(
        LoggingBackend::new()
            .with_delete_result(Err(RemoteError::Network("connection reset".to_string()))),
    );
    let editor = spawn_editor(7, backend.clone(), EditorConfig::default());
    let mut events = editor.subscribe();

    editor.request_delete().await.expect("request");
    assert_eq!(
        next_event(&mut events).await,
        EditorEvent::DeleteRequested { id: 7 },
    );

    let err = editor.confirm_delete().await.unwrap_err();
    assert!(matches!(err, EditorError::Remote(RemoteError::Network(_))));

    assert_eq!(
        next_event(&mut events).await,
        EditorEvent::Notice {
            message: "Failed to delete image.".to_string(),
        },
    );
    assert_eq!(next_event(&mut events).await, EditorEvent::Deleted { id: 7 });

    let err = editor.view().await.unwrap_err();
    assert!(matches!(err, EditorError::ChannelClosed));
}

#[tokio::test(start_paused = true)]
async fn sticker_flow_previews_then_persists() {
    let backend = Arc::new(LoggingBackend::new());
    let editor = spawn_editor(8, backend.clone(), EditorConfig::default());
    let mut events = editor.subscribe();

    let candidate = editor.preview_sticker().await.expect("preview sticker");
    assert_eq!(candidate.url, "media/previews/sticker.png");
    assert_eq!(backend.count(Call::StickerPreview), 1);

    let saved = editor.create_sticker().await.expect("create sticker");
    assert_eq!(saved.url, "http://host/media/uploads/sticker_8.png");
    assert_eq!(
        next_event(&mut events).await,
        EditorEvent::StickerSaved { id: 8 },
    );

    // Stickers never touch the chain.
    let view = editor.view().await.expect("view");
    assert!(view.chain.is_empty());
    assert_eq!(view.state, EditState::Clean);

    editor.shutdown().await.expect("shutdown");
}
