//! Main event loop, board/undo event processing and line commands

use anyhow::Result;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::actor::UndoEvent;
use crate::command::{ParsedCommand, ThreadVerb, available_commands, parse_command};
use crate::constants::SHUTDOWN_GRACE_SECS;
use crate::thread::{ThreadAction, ThreadKey};

use super::render::render_board;
use super::{App, BoardEvent, MoveOrigin};

impl App {
    pub async fn run(&mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            // Render only when dirty
            if self.dirty {
                self.print_board();
                self.dirty = false;
            }

            tokio::select! {
                line = lines.next_line() => match line? {
                    Some(line) => {
                        if !self.handle_line(&line).await {
                            break;
                        }
                    }
                    None => break,
                },
                Some(event) = self.event_rx.recv() => self.handle_board_event(event).await,
                Some(event) = self.undo.event_rx.recv() => self.handle_undo_event(event),
            }
        }

        self.shutdown().await;
        Ok(())
    }

    /// Commit anything still pending and wait for the store to answer
    pub async fn shutdown(&mut self) {
        tracing::info!("Shutting down, committing pending actions");
        self.undo.shutdown().await;

        // The queue closes its event channel once it has committed everything
        while let Some(event) = self.undo.event_rx.recv().await {
            self.handle_undo_event(event);
        }

        let grace = tokio::time::sleep(Duration::from_secs(SHUTDOWN_GRACE_SECS));
        tokio::pin!(grace);
        while self.in_flight > 0 {
            tokio::select! {
                Some(event) = self.event_rx.recv() => self.handle_board_event(event).await,
                _ = &mut grace => {
                    tracing::warn!("Gave up waiting for {} commit(s)", self.in_flight);
                    break;
                }
            }
        }
    }

    /// Handle one queued board or undo event. Returns false once both
    /// channels are closed.
    #[cfg(test)]
    pub(crate) async fn next_event(&mut self) -> bool {
        tokio::select! {
            Some(event) = self.event_rx.recv() => {
                self.handle_board_event(event).await;
                true
            }
            Some(event) = self.undo.event_rx.recv() => {
                self.handle_undo_event(event);
                true
            }
            else => false,
        }
    }

    pub(crate) async fn handle_board_event(&mut self, event: BoardEvent) {
        tracing::debug!("Board event: {:?}", event);
        match event {
            BoardEvent::StarSettled {
                key,
                starred,
                result,
            } => match result {
                Ok(()) => {
                    self.dispatch(&key, ThreadAction::StarSucceeded { starred })
                        .await
                }
                Err(error) => {
                    tracing::warn!("Star on {} failed: {}", key, error);
                    self.status = Some(format!("Star failed: {}", error));
                    self.dispatch(&key, ThreadAction::StarFailed).await;
                }
            },
            BoardEvent::MoveCommitted { origin } => {
                self.in_flight -= 1;
                self.refresh().await;
                if let MoveOrigin::Thread(key) = origin {
                    // Still mounted here: the store kept it in this folder
                    self.dispatch(&key, ThreadAction::MoveCommitted).await;
                }
            }
            BoardEvent::MoveFailed { origin, error } => {
                self.in_flight -= 1;
                self.status = Some(format!("Move failed: {}", error));
                if let MoveOrigin::Thread(key) = origin {
                    self.dispatch(&key, ThreadAction::MoveFailed).await;
                }
            }
            BoardEvent::MoveUndone { origin } => {
                if let MoveOrigin::Thread(key) = origin {
                    self.dispatch(&key, ThreadAction::MoveUndone).await;
                }
            }
        }
        self.dirty = true;
    }

    pub(crate) fn handle_undo_event(&mut self, event: UndoEvent) {
        match event {
            UndoEvent::Pending { label, .. } => {
                self.undo_notice = Some(format!("{} (undo to revert)", label));
            }
            UndoEvent::Committed { id, reason } => {
                tracing::debug!("Undoable #{} committed ({:?})", id, reason);
                self.in_flight += 1;
                self.undo_notice = None;
            }
            UndoEvent::Undone { label, .. } => {
                self.undo_notice = None;
                self.status = Some(format!("Undone: {}", label));
            }
            UndoEvent::NothingToUndo => {
                self.status = Some("Nothing to undo".to_string());
            }
        }
        self.dirty = true;
    }

    /// Returns false when the session should end
    async fn handle_line(&mut self, line: &str) -> bool {
        let Some(command) = parse_command(line) else {
            if !line.trim().is_empty() {
                println!("Unknown command: {} (try 'help')", line.trim());
            }
            return true;
        };

        match command {
            ParsedCommand::Show => self.dirty = true,
            ParsedCommand::Help => print_help(),
            ParsedCommand::Quit => return false,
            ParsedCommand::Undo => self.undo.undo().await,
            ParsedCommand::Flush => self.undo.flush().await,
            ParsedCommand::Thread {
                verb,
                column,
                index,
            } => match self.key_at(&column, index) {
                Some(key) => self.run_verb(&key, verb).await,
                None => println!("No thread {} in {}", index, column),
            },
            ParsedCommand::Drag {
                column,
                index,
                target,
            } => match self.key_at(&column, index) {
                Some(key) => self.drag_to(&key, Some(&target)).await,
                None => println!("No thread {} in {}", index, column),
            },
        }
        true
    }

    async fn run_verb(&mut self, key: &ThreadKey, verb: ThreadVerb) {
        let action = match verb {
            ThreadVerb::Open => ThreadAction::Open,
            ThreadVerb::Click => ThreadAction::Click,
            ThreadVerb::Close => ThreadAction::Close,
            ThreadVerb::Star => ThreadAction::ToggleStar,
            ThreadVerb::Archive => ThreadAction::Archive,
            ThreadVerb::Trash => ThreadAction::Trash,
            ThreadVerb::Restore => ThreadAction::Restore,
            ThreadVerb::Leave => ThreadAction::PointerLeft,
            ThreadVerb::Hover => {
                // Entering the row counts as the first, ignored, move
                self.dispatch(key, ThreadAction::PointerMoved).await;
                ThreadAction::PointerMoved
            }
        };
        self.dispatch(key, action).await;
    }

    fn print_board(&self) {
        print!("{}", render_board(self, &self.config.ui.date_format));
    }
}

fn print_help() {
    for command in available_commands() {
        println!("  {:<36} {}", command.name, command.description);
    }
}
