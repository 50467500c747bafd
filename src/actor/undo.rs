//! Undo queue actor.
//!
//! Holds at most one pending undoable action. The pending action commits when
//! its window expires, when another action is submitted, or on flush/shutdown;
//! undo cancels it before any of those happen. Commits run as spawned tasks
//! and are never cancelled once started.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};

use crate::constants::{UNDO_COMMAND_CAPACITY, UNDO_EVENT_CAPACITY};

pub type UndoId = u64;

type CommitFn = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;
type RollbackFn = Box<dyn FnOnce() + Send>;

/// A committed-by-default action paired with the rollback of its optimistic effects.
///
/// The commit future handles its own failure (the submitter decides how a
/// failed commit is reported), so it resolves to `()`.
pub struct Undoable {
    label: String,
    commit: CommitFn,
    rollback: RollbackFn,
}

impl Undoable {
    pub fn new<C, Fut, R>(label: impl Into<String>, commit: C, rollback: R) -> Self
    where
        C: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
        R: FnOnce() + Send + 'static,
    {
        Self {
            label: label.into(),
            commit: Box::new(move || commit().boxed()),
            rollback: Box::new(rollback),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    fn into_commit(self) -> BoxFuture<'static, ()> {
        (self.commit)()
    }
}

impl fmt::Debug for Undoable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Undoable")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Commands sent TO the undo queue
#[derive(Debug)]
pub enum UndoCommand {
    Submit(Undoable),
    Undo,
    /// Commit the pending action now
    Flush,
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitReason {
    Expired,
    /// A newer action was submitted
    Replaced,
    Flushed,
}

/// Events sent FROM the undo queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoEvent {
    Pending { id: UndoId, label: String },
    Committed { id: UndoId, reason: CommitReason },
    Undone { id: UndoId, label: String },
    NothingToUndo,
}

/// Handle for controlling the undo queue actor
pub struct UndoQueueHandle {
    cmd_tx: mpsc::Sender<UndoCommand>,
    pub event_rx: mpsc::Receiver<UndoEvent>,
}

impl UndoQueueHandle {
    pub async fn submit(&self, undoable: Undoable) {
        if let Err(mpsc::error::SendError(cmd)) = self.cmd_tx.send(UndoCommand::Submit(undoable)).await
        {
            // Queue is gone: nothing can undo it any more, so commit right away
            tracing::warn!("Undo queue stopped, committing immediately");
            if let UndoCommand::Submit(undoable) = cmd {
                tokio::spawn(undoable.into_commit());
            }
        }
    }

    pub async fn undo(&self) {
        self.send(UndoCommand::Undo).await;
    }

    pub async fn flush(&self) {
        self.send(UndoCommand::Flush).await;
    }

    pub async fn shutdown(&self) {
        self.send(UndoCommand::Shutdown).await;
    }

    async fn send(&self, cmd: UndoCommand) {
        if let Err(e) = self.cmd_tx.send(cmd).await {
            tracing::debug!("Undo queue stopped, dropping {:?}", e.0);
        }
    }
}

/// Spawn the undo queue and return a handle to control it.
pub fn spawn_undo_queue(window: Duration) -> UndoQueueHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(UNDO_COMMAND_CAPACITY);
    let (event_tx, event_rx) = mpsc::channel(UNDO_EVENT_CAPACITY);

    tokio::spawn(undo_queue_loop(window, cmd_rx, event_tx));

    UndoQueueHandle { cmd_tx, event_rx }
}

struct PendingEntry {
    id: UndoId,
    undoable: Undoable,
    deadline: Instant,
}

async fn undo_queue_loop(
    window: Duration,
    mut cmd_rx: mpsc::Receiver<UndoCommand>,
    event_tx: mpsc::Sender<UndoEvent>,
) {
    let mut pending: Option<PendingEntry> = None;
    let mut next_id: UndoId = 1;

    loop {
        let deadline = pending.as_ref().map(|p| p.deadline);

        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(UndoCommand::Submit(undoable)) => {
                    // One pending action at a time: the previous one commits first
                    if let Some(previous) = pending.take() {
                        commit(previous, CommitReason::Replaced, &event_tx).await;
                    }

                    let id = next_id;
                    next_id += 1;
                    let label = undoable.label().to_string();
                    tracing::info!("Undoable #{} pending: {}", id, label);
                    pending = Some(PendingEntry {
                        id,
                        undoable,
                        deadline: Instant::now() + window,
                    });
                    emit(&event_tx, UndoEvent::Pending { id, label }).await;
                }
                Some(UndoCommand::Undo) => match pending.take() {
                    Some(PendingEntry { id, undoable, .. }) => {
                        let label = undoable.label.clone();
                        tracing::info!("Undoable #{} undone: {}", id, label);
                        (undoable.rollback)();
                        emit(&event_tx, UndoEvent::Undone { id, label }).await;
                    }
                    None => emit(&event_tx, UndoEvent::NothingToUndo).await,
                },
                Some(UndoCommand::Flush) => {
                    if let Some(entry) = pending.take() {
                        commit(entry, CommitReason::Flushed, &event_tx).await;
                    }
                }
                Some(UndoCommand::Shutdown) | None => {
                    if let Some(entry) = pending.take() {
                        commit(entry, CommitReason::Flushed, &event_tx).await;
                    }
                    break;
                }
            },
            _ = expiry(deadline) => {
                if let Some(entry) = pending.take() {
                    commit(entry, CommitReason::Expired, &event_tx).await;
                }
            }
        }
    }

    tracing::debug!("Undo queue stopped");
}

/// Resolves at the deadline, or never when nothing is pending
async fn expiry(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn commit(entry: PendingEntry, reason: CommitReason, event_tx: &mpsc::Sender<UndoEvent>) {
    let PendingEntry { id, undoable, .. } = entry;
    tracing::info!("Undoable #{} committing ({:?}): {}", id, reason, undoable.label);

    tokio::spawn(undoable.into_commit());
    emit(event_tx, UndoEvent::Committed { id, reason }).await;
}

async fn emit(event_tx: &mpsc::Sender<UndoEvent>, event: UndoEvent) {
    if let Err(e) = event_tx.send(event).await {
        tracing::debug!("Undo event receiver dropped: {}", e);
    }
}
