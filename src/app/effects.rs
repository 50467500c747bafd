//! Thread dispatch and effect execution

use std::sync::Arc;

use crate::actor::Undoable;
use crate::thread::{
    Busy, DragPayload, DragSource, Effect, MoveRequest, ThreadAction, ThreadEnv, ThreadKey,
};

use super::{App, BoardEvent, MoveOrigin, find_controller, find_controller_mut};

impl App {
    fn env(&self) -> ThreadEnv {
        ThreadEnv {
            any_open: self.focus.is_any_open(),
        }
    }

    /// Feed an action to one thread and carry out whatever it asks for
    pub async fn dispatch(&mut self, key: &ThreadKey, action: ThreadAction) {
        let env = self.env();
        let Some(controller) = find_controller_mut(&mut self.columns, key) else {
            tracing::debug!("No thread {} for {:?}", key, action);
            return;
        };

        let effects = controller.dispatch(action, env);
        self.dirty = true;
        for effect in effects {
            self.apply_effect(key, effect).await;
        }
    }

    /// Dispatch for notifications that never produce effects
    fn notify(&mut self, key: &ThreadKey, action: ThreadAction) {
        let env = self.env();
        if let Some(controller) = find_controller_mut(&mut self.columns, key) {
            let effects = controller.dispatch(action, env);
            if !effects.is_empty() {
                tracing::warn!("Dropping unexpected effects from {}: {:?}", key, effects);
            }
        }
    }

    async fn apply_effect(&mut self, key: &ThreadKey, effect: Effect) {
        tracing::trace!("Effect from {}: {:?}", key, effect);
        match effect {
            Effect::MarkRead(keys) => self.store.mark_read(&keys),
            Effect::RequestFocus => self.hand_focus(Some(key.clone())),
            Effect::ReleaseFocus => {
                if self.focus.is_owner(key) {
                    self.hand_focus(None);
                }
            }
            Effect::OpenPresenter => self.open_in_presenter(key),
            Effect::ClosePresenter => {
                if self.focus.open() == Some(key) {
                    self.close_open_thread();
                }
            }
            Effect::ReloadPresenter => {
                if self.focus.open() == Some(key)
                    && let Some(controller) = find_controller(&self.columns, key)
                {
                    self.presenter.reload_thread(controller.thread());
                }
            }
            Effect::SetStar {
                account,
                folder,
                ids,
                starred,
            } => self.spawn_star(key.clone(), account, folder, ids, starred),
            Effect::SubmitMove(request) => {
                self.submit_move(MoveOrigin::Thread(key.clone()), request)
                    .await
            }
        }
    }

    /// Move keyboard focus, clearing hover on the thread that loses it
    fn hand_focus(&mut self, next: Option<ThreadKey>) {
        if let Some(previous) = self.focus.owner().cloned()
            && Some(&previous) != next.as_ref()
        {
            self.notify(&previous, ThreadAction::FocusLost);
        }
        self.focus.set_owner(next.clone());
        if let Some(key) = next {
            self.notify(&key, ThreadAction::FocusGained);
        }
    }

    fn open_in_presenter(&mut self, key: &ThreadKey) {
        if self.focus.open().is_some_and(|open| open != key) {
            self.close_open_thread();
        }
        if let Some(controller) = find_controller(&self.columns, key) {
            self.presenter.open_thread(&key.column, controller.thread());
        }
        self.focus.set_open(Some(key.clone()));
    }

    /// Close whatever thread the presenter shows
    pub fn close_open_thread(&mut self) {
        let Some(key) = self.focus.open().cloned() else {
            return;
        };
        self.presenter.close_thread();
        self.focus.set_open(None);
        self.notify(&key, ThreadAction::PresenterClosed);
    }

    fn spawn_star(
        &self,
        key: ThreadKey,
        account: String,
        folder: String,
        ids: Vec<crate::mail::Uid>,
        starred: bool,
    ) {
        tracing::info!(
            "{} {} message(s) of {}",
            if starred { "Starring" } else { "Unstarring" },
            ids.len(),
            key
        );
        let store = Arc::clone(&self.store);
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = if starred {
                store.star_messages(&account, &folder, &ids).await
            } else {
                store.unstar_messages(&account, &folder, &ids).await
            };
            let _ = event_tx.send(BoardEvent::StarSettled {
                key,
                starred,
                result,
            });
        });
    }

    /// Hand a move to the undo queue; the store only sees it on commit
    async fn submit_move(&mut self, origin: MoveOrigin, request: MoveRequest) {
        let label = move_label(&request);
        let store = Arc::clone(&self.store);
        let commit_tx = self.event_tx.clone();
        let rollback_tx = self.event_tx.clone();
        let rollback_origin = origin.clone();

        let undoable = Undoable::new(
            label,
            move || async move {
                let MoveRequest {
                    account,
                    ids,
                    from,
                    to,
                    ..
                } = request;
                match store.move_messages(&account, &ids, &from, &to).await {
                    Ok(()) => {
                        store.reconcile_changes();
                        let _ = commit_tx.send(BoardEvent::MoveCommitted { origin });
                    }
                    Err(error) => {
                        tracing::warn!("Move {} -> {} failed: {}", from, to, error);
                        let _ = commit_tx.send(BoardEvent::MoveFailed { origin, error });
                    }
                }
            },
            move || {
                let _ = rollback_tx.send(BoardEvent::MoveUndone {
                    origin: rollback_origin,
                });
            },
        );
        self.undo.submit(undoable).await;
    }

    /// Drag a mounted thread, optionally dropping it onto `target`.
    ///
    /// The drop goes through the thread's own `MoveTo`, so the folder
    /// precondition and the lock apply and the source locks while pending.
    pub async fn drag_to(&mut self, key: &ThreadKey, target: Option<&str>) {
        let Some(controller) = find_controller(&self.columns, key) else {
            tracing::debug!("No thread {} to drag", key);
            return;
        };
        if controller.state().is_locked() {
            tracing::debug!("Thread {} locked, not dragging", key);
            return;
        }
        tracing::debug!("Dragging {:?}", controller.begin_drag());

        self.dispatch(key, ThreadAction::DragStarted).await;
        self.dispatch(key, ThreadAction::DragEnded).await;

        if let Some(target) = target {
            self.dispatch(key, ThreadAction::MoveTo(target.to_string()))
                .await;
        }
    }

    /// Drop target side for a bare payload with no mounted source thread
    #[allow(dead_code)]
    pub async fn drop_payload(&mut self, payload: DragPayload, target: &str) {
        if payload.source_column == target || payload.message_ids.is_empty() {
            tracing::debug!("Ignoring drop of {:?} on {}", payload, target);
            return;
        }

        let origin = MoveOrigin::Drop {
            source_column: payload.source_column.clone(),
            target: target.to_string(),
        };
        let request = MoveRequest {
            account: payload.account_name,
            ids: payload.message_ids,
            from: payload.source_column,
            to: target.to_string(),
            busy: Busy::Moving,
        };
        self.submit_move(origin, request).await;
    }
}

fn move_label(request: &MoveRequest) -> String {
    let verb = match request.busy {
        Busy::Archiving => "Archived",
        Busy::Trashing => "Trashed",
        Busy::Restoring => "Restored",
        _ => "Moved",
    };
    format!(
        "{} {} message(s) from {} to {}",
        verb,
        request.ids.len(),
        request.from,
        request.to
    )
}
