//! Per-thread transient action state

use crate::mail::Thread;

/// The one mutating operation a thread may have outstanding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Busy {
    #[default]
    None,
    Starring,
    Archiving,
    Trashing,
    Restoring,
    /// Generalized move to an arbitrary folder
    Moving,
}

impl Busy {
    pub fn is_move(self) -> bool {
        matches!(
            self,
            Busy::Archiving | Busy::Trashing | Busy::Restoring | Busy::Moving
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            Busy::None => "",
            Busy::Starring => "starring",
            Busy::Archiving => "archiving",
            Busy::Trashing => "trashing",
            Busy::Restoring => "restoring",
            Busy::Moving => "moving",
        }
    }
}

/// Optimistic UI state owned by a thread's controller; never persisted.
///
/// The thread is locked exactly while `busy` is not `Busy::None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadActionState {
    pub starred: bool,
    pub unread: bool,
    pub archived: bool,
    pub open: bool,
    pub hover: bool,
    pub busy: Busy,
    pub error: bool,
    pub dragging: bool,
    /// Pointer moves seen since hover was last cleared
    pub pointer_moves: u32,
}

impl ThreadActionState {
    pub fn seeded(thread: &Thread) -> Self {
        Self {
            starred: thread.starred(),
            unread: thread.unread(),
            archived: thread.archived(),
            ..Default::default()
        }
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.busy != Busy::None
    }

    /// Back to idle after a finished, failed or undone operation
    pub(crate) fn settle(&mut self, error: bool) {
        self.busy = Busy::None;
        self.error = error;
    }
}
