//! Drag source capability.
//!
//! The drag engine only ever sees a `DragPayload`; the drop target moves the
//! payload's ids itself.

use crate::mail::membership::folder_message_ids;
use crate::mail::{Thread, Uid};

use super::machine::ThreadController;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragPayload {
    /// Folder-scoped ids in the source column
    pub message_ids: Vec<Uid>,
    pub source_column: String,
    pub account_name: String,
}

pub trait DragSource {
    fn begin_drag(&self) -> DragPayload;

    /// Visual state only
    fn is_dragging(&self) -> bool;
}

pub fn drag_payload(thread: &Thread, column: &str) -> DragPayload {
    DragPayload {
        message_ids: folder_message_ids(thread, column),
        source_column: column.to_string(),
        account_name: thread.account_name().to_string(),
    }
}

impl DragSource for ThreadController {
    fn begin_drag(&self) -> DragPayload {
        drag_payload(self.thread(), &self.key().column)
    }

    fn is_dragging(&self) -> bool {
        self.state().dragging
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::types::test_support::{message, thread};
    use crate::thread::machine::{ThreadAction, ThreadEnv};

    #[test]
    fn test_payload_projects_folder_ids() {
        let t = thread(
            "t1",
            vec![
                message("work", "m2", &[("inbox", 8), ("archive", 2)]),
                message("work", "m1", &[("archive", 1)]),
            ],
        );

        let mut controller = ThreadController::new("archive", t);
        assert_eq!(
            controller.begin_drag(),
            DragPayload {
                message_ids: vec![2, 1],
                source_column: "archive".to_string(),
                account_name: "work".to_string(),
            }
        );

        assert!(!controller.is_dragging());
        controller.dispatch(ThreadAction::DragStarted, ThreadEnv::default());
        assert!(controller.is_dragging());
    }
}
