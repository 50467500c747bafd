//! Board coordinator - owns the columns, the focus registry and the undo
//! queue, and executes the effects thread controllers ask for.

mod effects;
mod event_loop;
pub mod presenter;
pub mod render;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::actor::{UndoQueueHandle, spawn_undo_queue};
use crate::config::Config;
use crate::focus::FocusRegistry;
use crate::mail::{MailStore, StoreError, ThreadId, ThreadSource};
use crate::thread::{ThreadAction, ThreadController, ThreadKey};

use presenter::ThreadPresenter;

/// Where an undoable move came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOrigin {
    /// A thread's own action; its controller stays locked until the move settles
    Thread(ThreadKey),
    /// A thread dropped onto another column
    Drop {
        source_column: String,
        target: String,
    },
}

/// Completions fed back into the board by spawned store calls
#[derive(Debug)]
pub enum BoardEvent {
    StarSettled {
        key: ThreadKey,
        starred: bool,
        result: Result<(), StoreError>,
    },
    MoveCommitted {
        origin: MoveOrigin,
    },
    MoveFailed {
        origin: MoveOrigin,
        error: StoreError,
    },
    MoveUndone {
        origin: MoveOrigin,
    },
}

/// One folder's threads, newest first
#[derive(Debug)]
pub struct Column {
    pub id: String,
    pub threads: Vec<ThreadController>,
}

pub struct App {
    pub(crate) config: Config,
    store: Arc<dyn MailStore>,
    source: Arc<dyn ThreadSource>,
    presenter: Box<dyn ThreadPresenter>,
    pub(crate) focus: FocusRegistry,
    pub(crate) undo: UndoQueueHandle,
    pub(crate) columns: Vec<Column>,
    event_tx: mpsc::UnboundedSender<BoardEvent>,
    event_rx: mpsc::UnboundedReceiver<BoardEvent>,
    /// Commits handed to the store whose outcome has not come back yet.
    /// Signed: the outcome can arrive before the queue's commit notice.
    in_flight: i64,
    /// Pending undoable action, shown until it commits or is undone
    pub(crate) undo_notice: Option<String>,
    /// One-line status shown under the board
    pub(crate) status: Option<String>,
    /// Dirty flag: board needs re-printing
    pub(crate) dirty: bool,
}

impl App {
    /// Must be called from within a tokio runtime (spawns the undo queue)
    pub fn new(
        config: Config,
        store: Arc<dyn MailStore>,
        source: Arc<dyn ThreadSource>,
        presenter: Box<dyn ThreadPresenter>,
    ) -> Self {
        let undo = spawn_undo_queue(config.undo.window());
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let columns = config
            .board
            .columns
            .iter()
            .map(|id| Column {
                id: id.clone(),
                threads: source
                    .load_threads(id)
                    .into_iter()
                    .map(|thread| ThreadController::new(id.clone(), thread))
                    .collect(),
            })
            .collect();

        Self {
            config,
            store,
            source,
            presenter,
            focus: FocusRegistry::new(),
            undo,
            columns,
            event_tx,
            event_rx,
            in_flight: 0,
            undo_notice: None,
            status: None,
            dirty: true,
        }
    }

    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    pub fn controller(&self, key: &ThreadKey) -> Option<&ThreadController> {
        find_controller(&self.columns, key)
    }

    /// Key of the `index`th thread shown in `column`
    pub fn key_at(&self, column: &str, index: usize) -> Option<ThreadKey> {
        self.column(column)?
            .threads
            .get(index)
            .map(|c| c.key().clone())
    }

    /// Reload every column from the thread source.
    ///
    /// Threads still present get their fresh data through `Replace`; new ones
    /// are mounted; vanished ones are unmounted and drop any focus they held.
    pub async fn refresh(&mut self) {
        let mut replaced = Vec::new();
        let mut vanished = Vec::new();

        for column in self.columns.iter_mut() {
            let mut mounted: HashMap<ThreadId, ThreadController> =
                std::mem::take(&mut column.threads)
                    .into_iter()
                    .map(|c| (c.key().thread.clone(), c))
                    .collect();

            for thread in self.source.load_threads(&column.id) {
                match mounted.remove(&thread.id) {
                    Some(controller) => {
                        replaced.push((controller.key().clone(), thread));
                        column.threads.push(controller);
                    }
                    None => column
                        .threads
                        .push(ThreadController::new(column.id.clone(), thread)),
                }
            }
            vanished.extend(mounted.into_values().map(|c| c.key().clone()));
        }

        for key in vanished {
            self.unmount(&key);
        }
        for (key, thread) in replaced {
            self.dispatch(&key, ThreadAction::Replace(thread)).await;
        }
        self.dirty = true;
    }

    fn unmount(&mut self, key: &ThreadKey) {
        tracing::debug!("Unmounting {}", key);
        if self.focus.forget(key) {
            self.presenter.close_thread();
        }
    }
}

fn find_controller<'a>(columns: &'a [Column], key: &ThreadKey) -> Option<&'a ThreadController> {
    columns
        .iter()
        .find(|c| c.id == key.column)?
        .threads
        .iter()
        .find(|c| c.key() == key)
}

fn find_controller_mut<'a>(
    columns: &'a mut [Column],
    key: &ThreadKey,
) -> Option<&'a mut ThreadController> {
    columns
        .iter_mut()
        .find(|c| c.id == key.column)?
        .threads
        .iter_mut()
        .find(|c| c.key() == key)
}
