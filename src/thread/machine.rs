//! Thread action state machine.
//!
//! `transition` is a pure function from the current state and an action to the
//! next state plus a list of effects. It never talks to the mail store, the
//! presenter or the focus registry itself; the coordinator executes the
//! returned effects and feeds completions back in as further actions.

use std::fmt;

use crate::constants::{POINTER_MOVES_IGNORED, folders};
use crate::mail::membership::{folder_message_ids, read_keys};
use crate::mail::{Thread, ThreadId, Uid};

use super::state::{Busy, ThreadActionState};

/// A thread as realized in one column
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThreadKey {
    pub column: String,
    pub thread: ThreadId,
}

impl ThreadKey {
    pub fn new(column: impl Into<String>, thread: impl Into<ThreadId>) -> Self {
        Self {
            column: column.into(),
            thread: thread.into(),
        }
    }
}

impl fmt::Display for ThreadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.column, self.thread)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ThreadContext<'a> {
    pub key: &'a ThreadKey,
    pub thread: &'a Thread,
}

/// Global facts a transition may consult
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadEnv {
    /// Some thread (any column) is open in the presenter
    pub any_open: bool,
}

#[derive(Debug, Clone)]
pub enum ThreadAction {
    /// Open if closed, close if open
    Click,
    Open,
    Close,
    /// The presenter closed this thread
    PresenterClosed,
    FocusGained,
    FocusLost,
    PointerMoved,
    PointerLeft,
    /// Fresh thread data from the data-fetch layer
    Replace(Thread),
    ToggleStar,
    StarSucceeded { starred: bool },
    StarFailed,
    Archive,
    Trash,
    Restore,
    MoveTo(String),
    MoveUndone,
    /// The move reached the store but the thread is still mounted here
    MoveCommitted,
    MoveFailed,
    DragStarted,
    DragEnded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRequest {
    pub account: String,
    pub ids: Vec<Uid>,
    pub from: String,
    pub to: String,
    pub busy: Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    MarkRead(Vec<String>),
    RequestFocus,
    ReleaseFocus,
    OpenPresenter,
    ClosePresenter,
    ReloadPresenter,
    SetStar {
        account: String,
        folder: String,
        ids: Vec<Uid>,
        starred: bool,
    },
    SubmitMove(MoveRequest),
}

#[derive(Debug, Clone)]
pub struct Transition {
    pub state: ThreadActionState,
    pub effects: Vec<Effect>,
}

pub fn transition(
    state: &ThreadActionState,
    ctx: ThreadContext<'_>,
    env: ThreadEnv,
    action: ThreadAction,
) -> Transition {
    let mut next = state.clone();
    let mut effects = Vec::new();

    match action {
        ThreadAction::Click if state.open => effects.push(Effect::ClosePresenter),
        ThreadAction::Click => open(state, &mut next, &mut effects, ctx),
        ThreadAction::Open => {
            if state.open {
                tracing::debug!("Thread {} already open", ctx.key);
            } else {
                open(state, &mut next, &mut effects, ctx);
            }
        }
        ThreadAction::Close => {
            if state.open {
                effects.push(Effect::ClosePresenter);
            }
        }
        ThreadAction::PresenterClosed => next.open = false,
        ThreadAction::FocusGained => next.hover = true,
        ThreadAction::FocusLost => {
            next.hover = false;
            next.pointer_moves = 0;
        }
        ThreadAction::PointerMoved => {
            next.pointer_moves = state.pointer_moves.saturating_add(1);
            if next.pointer_moves > POINTER_MOVES_IGNORED
                && !state.is_locked()
                && !state.hover
                && !env.any_open
            {
                effects.push(Effect::RequestFocus);
            }
        }
        ThreadAction::PointerLeft => {
            if state.hover && !state.is_locked() && !env.any_open {
                effects.push(Effect::ReleaseFocus);
            }
        }
        ThreadAction::Replace(thread) => {
            next.starred = thread.starred();
            next.unread = thread.unread();
            next.archived = thread.archived();

            // An open thread that grew must re-sync read state and content
            if state.open && thread.len() != ctx.thread.len() {
                if next.unread {
                    effects.push(Effect::MarkRead(read_keys(&thread)));
                }
                next.unread = false;
                effects.push(Effect::ReloadPresenter);
            }
        }
        ThreadAction::ToggleStar => {
            if state.is_locked() {
                tracing::debug!("Thread {} locked, not starring", ctx.key);
            } else {
                next.busy = Busy::Starring;
                next.error = false;
                effects.push(Effect::SetStar {
                    account: ctx.thread.account_name().to_string(),
                    folder: ctx.key.column.clone(),
                    ids: folder_message_ids(ctx.thread, &ctx.key.column),
                    starred: !state.starred,
                });
            }
        }
        ThreadAction::StarSucceeded { starred } => {
            if state.busy == Busy::Starring {
                next.settle(false);
                next.starred = starred;
            } else {
                tracing::debug!("Thread {} ignoring stale star result", ctx.key);
            }
        }
        ThreadAction::StarFailed => {
            if state.busy == Busy::Starring {
                next.settle(true);
            }
        }
        ThreadAction::Archive => {
            begin_move(state, &mut next, &mut effects, ctx, folders::ARCHIVE, Busy::Archiving);
        }
        ThreadAction::Trash => {
            if ctx.key.column == folders::TRASH {
                tracing::debug!("Thread {} already trashed", ctx.key);
            } else {
                begin_move(state, &mut next, &mut effects, ctx, folders::TRASH, Busy::Trashing);
            }
        }
        ThreadAction::Restore => {
            if ctx.key.column == folders::INBOX {
                tracing::debug!("Thread {} already in inbox", ctx.key);
            } else {
                begin_move(state, &mut next, &mut effects, ctx, folders::INBOX, Busy::Restoring);
            }
        }
        ThreadAction::MoveTo(folder) => {
            if folder == ctx.key.column {
                tracing::debug!("Thread {} already in {}", ctx.key, folder);
            } else {
                begin_move(state, &mut next, &mut effects, ctx, &folder, Busy::Moving);
            }
        }
        ThreadAction::MoveUndone | ThreadAction::MoveCommitted => {
            if state.busy.is_move() {
                next.settle(false);
            }
        }
        ThreadAction::MoveFailed => {
            if state.busy.is_move() {
                next.settle(true);
            }
        }
        ThreadAction::DragStarted => next.dragging = true,
        ThreadAction::DragEnded => next.dragging = false,
    }

    Transition {
        state: next,
        effects,
    }
}

fn open(
    state: &ThreadActionState,
    next: &mut ThreadActionState,
    effects: &mut Vec<Effect>,
    ctx: ThreadContext<'_>,
) {
    if !state.hover {
        effects.push(Effect::RequestFocus);
    }
    if state.unread {
        effects.push(Effect::MarkRead(read_keys(ctx.thread)));
    }
    // Read optimistically, before the store confirms anything
    next.open = true;
    next.unread = false;
    effects.push(Effect::OpenPresenter);
}

fn begin_move(
    state: &ThreadActionState,
    next: &mut ThreadActionState,
    effects: &mut Vec<Effect>,
    ctx: ThreadContext<'_>,
    to: &str,
    busy: Busy,
) {
    // No double moves
    if state.is_locked() {
        tracing::debug!("Thread {} locked, not {}", ctx.key, busy.label());
        return;
    }

    if state.open {
        effects.push(Effect::ClosePresenter);
    }
    if state.hover {
        effects.push(Effect::ReleaseFocus);
    }

    next.busy = busy;
    next.error = false;
    effects.push(Effect::SubmitMove(MoveRequest {
        account: ctx.thread.account_name().to_string(),
        ids: folder_message_ids(ctx.thread, &ctx.key.column),
        from: ctx.key.column.clone(),
        to: to.to_string(),
        busy,
    }));
}

/// Owns one thread's data and action state within a column
#[derive(Debug, Clone)]
pub struct ThreadController {
    key: ThreadKey,
    thread: Thread,
    state: ThreadActionState,
}

impl ThreadController {
    pub fn new(column: impl Into<String>, thread: Thread) -> Self {
        Self {
            key: ThreadKey::new(column, thread.id.clone()),
            state: ThreadActionState::seeded(&thread),
            thread,
        }
    }

    pub fn key(&self) -> &ThreadKey {
        &self.key
    }

    pub fn thread(&self) -> &Thread {
        &self.thread
    }

    pub fn state(&self) -> &ThreadActionState {
        &self.state
    }

    pub fn dispatch(&mut self, action: ThreadAction, env: ThreadEnv) -> Vec<Effect> {
        let replacement = match &action {
            ThreadAction::Replace(thread) => Some(thread.clone()),
            _ => None,
        };

        let ctx = ThreadContext {
            key: &self.key,
            thread: &self.thread,
        };
        let Transition { state, effects } = transition(&self.state, ctx, env, action);

        self.state = state;
        if let Some(thread) = replacement {
            self.thread = thread;
        }
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::types::MessageFlags;
    use crate::mail::types::test_support::{message, thread};

    fn inbox_thread() -> Thread {
        thread(
            "t1",
            vec![
                message("acct", "mid1", &[("inbox", 11)]),
                message("acct", "mid2", &[("inbox", 12)]),
            ],
        )
    }

    fn controller(column: &str) -> ThreadController {
        ThreadController::new(column, inbox_thread())
    }

    fn idle() -> ThreadEnv {
        ThreadEnv::default()
    }

    #[test]
    fn test_open_marks_read_and_requests_focus() {
        let mut c = controller("inbox");
        assert!(c.state().unread);

        let effects = c.dispatch(ThreadAction::Open, idle());

        assert_eq!(
            effects,
            vec![
                Effect::RequestFocus,
                Effect::MarkRead(vec!["acct-mid1".to_string(), "acct-mid2".to_string()]),
                Effect::OpenPresenter,
            ]
        );
        assert!(c.state().open);
        assert!(!c.state().unread);
    }

    #[test]
    fn test_open_when_hovered_skips_focus_request() {
        let mut c = controller("inbox");
        c.dispatch(ThreadAction::FocusGained, idle());
        let effects = c.dispatch(ThreadAction::Open, idle());
        assert!(!effects.contains(&Effect::RequestFocus));
    }

    #[test]
    fn test_open_twice_is_noop() {
        let mut c = controller("inbox");
        c.dispatch(ThreadAction::Open, idle());
        assert!(c.dispatch(ThreadAction::Open, idle()).is_empty());
    }

    #[test]
    fn test_click_toggles() {
        let mut c = controller("inbox");
        let effects = c.dispatch(ThreadAction::Click, idle());
        assert!(effects.contains(&Effect::OpenPresenter));

        let effects = c.dispatch(ThreadAction::Click, idle());
        assert_eq!(effects, vec![Effect::ClosePresenter]);
        c.dispatch(ThreadAction::PresenterClosed, idle());
        assert!(!c.state().open);
    }

    #[test]
    fn test_close_when_closed_is_noop() {
        let mut c = controller("inbox");
        assert!(c.dispatch(ThreadAction::Close, idle()).is_empty());
    }

    #[test]
    fn test_archive_submits_move_of_folder_ids() {
        let mut c = controller("inbox");
        let effects = c.dispatch(ThreadAction::Archive, idle());

        assert_eq!(
            effects,
            vec![Effect::SubmitMove(MoveRequest {
                account: "acct".to_string(),
                ids: vec![11, 12],
                from: "inbox".to_string(),
                to: "archive".to_string(),
                busy: Busy::Archiving,
            })]
        );
        assert_eq!(c.state().busy, Busy::Archiving);
        assert!(c.state().is_locked());
    }

    #[test]
    fn test_archive_closes_and_releases_focus_first() {
        let mut c = controller("inbox");
        c.dispatch(ThreadAction::FocusGained, idle());
        c.dispatch(ThreadAction::Open, idle());

        let effects = c.dispatch(ThreadAction::Archive, idle());
        assert_eq!(effects[0], Effect::ClosePresenter);
        assert_eq!(effects[1], Effect::ReleaseFocus);
        assert!(matches!(effects[2], Effect::SubmitMove(_)));
    }

    #[test]
    fn test_second_destructive_action_while_locked_is_dropped() {
        let mut c = controller("inbox");
        c.dispatch(ThreadAction::Archive, idle());
        let before = c.state().clone();

        assert!(c.dispatch(ThreadAction::Archive, idle()).is_empty());
        assert!(c.dispatch(ThreadAction::Trash, idle()).is_empty());
        assert!(c.dispatch(ThreadAction::ToggleStar, idle()).is_empty());
        assert_eq!(c.state(), &before);
    }

    #[test]
    fn test_trash_in_trash_is_noop() {
        let mut c = controller("trash");
        assert!(c.dispatch(ThreadAction::Trash, idle()).is_empty());
        assert_eq!(c.state().busy, Busy::None);
    }

    #[test]
    fn test_restore_in_inbox_is_noop() {
        let mut c = controller("inbox");
        assert!(c.dispatch(ThreadAction::Restore, idle()).is_empty());
    }

    #[test]
    fn test_precondition_checked_before_lock() {
        // Already in trash while starring: rejected by the precondition, not the lock
        let mut c = controller("trash");
        c.dispatch(ThreadAction::ToggleStar, idle());
        let effects = c.dispatch(ThreadAction::Trash, idle());
        assert!(effects.is_empty());
        assert_eq!(c.state().busy, Busy::Starring);
    }

    #[test]
    fn test_restore_from_trash_targets_inbox() {
        let t = thread("t9", vec![message("acct", "m", &[("trash", 4)])]);
        let mut c = ThreadController::new("trash", t);
        let effects = c.dispatch(ThreadAction::Restore, idle());
        match &effects[..] {
            [Effect::SubmitMove(req)] => {
                assert_eq!(req.to, "inbox");
                assert_eq!(req.ids, vec![4]);
            }
            other => panic!("unexpected effects: {:?}", other),
        }
        assert_eq!(c.state().busy, Busy::Restoring);
    }

    #[test]
    fn test_move_to_same_folder_is_noop() {
        let mut c = controller("inbox");
        assert!(
            c.dispatch(ThreadAction::MoveTo("inbox".to_string()), idle())
                .is_empty()
        );
        let effects = c.dispatch(ThreadAction::MoveTo("receipts".to_string()), idle());
        assert_eq!(effects.len(), 1);
        assert_eq!(c.state().busy, Busy::Moving);
    }

    #[test]
    fn test_undo_returns_to_idle() {
        let mut c = controller("inbox");
        c.dispatch(ThreadAction::Trash, idle());
        c.dispatch(ThreadAction::MoveUndone, idle());
        assert_eq!(c.state().busy, Busy::None);
        assert!(!c.state().is_locked());
        assert!(!c.state().error);
    }

    #[test]
    fn test_commit_without_unmount_unlocks() {
        let mut c = controller("inbox");
        c.dispatch(ThreadAction::MoveTo("receipts".to_string()), idle());
        c.dispatch(ThreadAction::MoveCommitted, idle());
        assert!(!c.state().is_locked());
        assert!(!c.state().error);
    }

    #[test]
    fn test_failed_move_sets_error_and_unlocks() {
        let mut c = controller("inbox");
        c.dispatch(ThreadAction::Archive, idle());
        c.dispatch(ThreadAction::MoveFailed, idle());
        assert!(!c.state().is_locked());
        assert!(c.state().error);

        // A new attempt clears the error
        c.dispatch(ThreadAction::Archive, idle());
        assert!(!c.state().error);
    }

    #[test]
    fn test_star_toggle_flow() {
        let mut c = controller("inbox");
        let effects = c.dispatch(ThreadAction::ToggleStar, idle());
        assert_eq!(
            effects,
            vec![Effect::SetStar {
                account: "acct".to_string(),
                folder: "inbox".to_string(),
                ids: vec![11, 12],
                starred: true,
            }]
        );
        assert!(!c.state().starred, "starred flips only on success");

        c.dispatch(ThreadAction::StarSucceeded { starred: true }, idle());
        assert!(c.state().starred);
        assert!(!c.state().is_locked());
    }

    #[test]
    fn test_star_while_locked_emits_nothing() {
        let mut c = controller("inbox");
        c.dispatch(ThreadAction::ToggleStar, idle());
        assert!(c.dispatch(ThreadAction::ToggleStar, idle()).is_empty());
    }

    #[test]
    fn test_star_failure_keeps_flag_and_unlocks() {
        let mut c = controller("inbox");
        c.dispatch(ThreadAction::ToggleStar, idle());
        c.dispatch(ThreadAction::StarFailed, idle());
        assert!(!c.state().starred);
        assert!(!c.state().is_locked());
        assert!(c.state().error);
    }

    #[test]
    fn test_stale_star_result_ignored() {
        let mut c = controller("inbox");
        c.dispatch(ThreadAction::StarSucceeded { starred: true }, idle());
        assert!(!c.state().starred);
    }

    #[test]
    fn test_replace_grown_open_thread_marks_read_and_reloads() {
        let mut c = controller("inbox");
        c.dispatch(ThreadAction::Open, idle());

        let grown = thread(
            "t1",
            vec![
                message("acct", "mid3", &[("inbox", 13)]),
                message("acct", "mid1", &[("inbox", 11)]),
                message("acct", "mid2", &[("inbox", 12)]),
            ],
        );
        let effects = c.dispatch(ThreadAction::Replace(grown), idle());

        assert_eq!(
            effects,
            vec![
                Effect::MarkRead(vec![
                    "acct-mid3".to_string(),
                    "acct-mid1".to_string(),
                    "acct-mid2".to_string(),
                ]),
                Effect::ReloadPresenter,
            ]
        );
        assert!(!c.state().unread);
        assert_eq!(c.thread().len(), 3);
    }

    #[test]
    fn test_replace_closed_thread_reseeds_flags_only() {
        let mut c = controller("inbox");
        let mut newest = message("acct", "mid3", &[("inbox", 13)]);
        newest.flags = MessageFlags::SEEN | MessageFlags::FLAGGED;
        let fresh = thread("t1", vec![newest]);

        let effects = c.dispatch(ThreadAction::Replace(fresh), idle());
        assert!(effects.is_empty());
        assert!(c.state().starred);
        assert!(!c.state().unread);
    }

    #[test]
    fn test_pointer_hover_ignores_first_move() {
        let mut c = controller("inbox");
        assert!(c.dispatch(ThreadAction::PointerMoved, idle()).is_empty());
        assert_eq!(
            c.dispatch(ThreadAction::PointerMoved, idle()),
            vec![Effect::RequestFocus]
        );
    }

    #[test]
    fn test_pointer_hover_blocked_while_any_thread_open() {
        let mut c = controller("inbox");
        let open = ThreadEnv { any_open: true };
        c.dispatch(ThreadAction::PointerMoved, open);
        assert!(c.dispatch(ThreadAction::PointerMoved, open).is_empty());

        c.dispatch(ThreadAction::FocusGained, idle());
        assert!(c.dispatch(ThreadAction::PointerLeft, open).is_empty());
        assert_eq!(
            c.dispatch(ThreadAction::PointerLeft, idle()),
            vec![Effect::ReleaseFocus]
        );
    }

    #[test]
    fn test_focus_lost_resets_pointer_count() {
        let mut c = controller("inbox");
        c.dispatch(ThreadAction::PointerMoved, idle());
        c.dispatch(ThreadAction::FocusLost, idle());
        assert_eq!(c.state().pointer_moves, 0);
        assert!(!c.state().hover);
    }

    #[test]
    fn test_drag_flag() {
        let mut c = controller("inbox");
        c.dispatch(ThreadAction::DragStarted, idle());
        assert!(c.state().dragging);
        c.dispatch(ThreadAction::DragEnded, idle());
        assert!(!c.state().dragging);
    }
}
