pub mod undo;

pub use undo::{CommitReason, UndoEvent, UndoId, UndoQueueHandle, Undoable, spawn_undo_queue};
