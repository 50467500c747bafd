//! Thread presenter: the reading pane that shows one open thread

use chrono::DateTime;

use crate::mail::Thread;
use crate::mail::membership::{address_list, attachment_count};

/// Receives open/close/reload requests from the coordinator
pub trait ThreadPresenter: Send {
    fn open_thread(&mut self, column: &str, thread: &Thread);
    fn close_thread(&mut self);
    /// The open thread changed underneath the reader
    fn reload_thread(&mut self, thread: &Thread);
}

/// Prints the open thread to stdout
pub struct StdoutPresenter {
    date_format: String,
}

impl StdoutPresenter {
    pub fn new(date_format: impl Into<String>) -> Self {
        Self {
            date_format: date_format.into(),
        }
    }

    fn print(&self, heading: &str, thread: &Thread) {
        println!(
            "--- {} {} ({} message(s), {} attachment(s))",
            heading,
            thread.newest().subject,
            thread.len(),
            attachment_count(thread)
        );
        println!("    {}", address_list(thread).join(", "));
        for message in thread.messages() {
            let date = DateTime::from_timestamp(message.date, 0)
                .map(|dt| dt.format(&self.date_format).to_string())
                .unwrap_or_default();
            let from = message
                .from
                .first()
                .map(|a| a.short().to_string())
                .unwrap_or_default();
            println!("    {:>8}  {:<16} {}", date, from, message.excerpt);
        }
    }
}

impl ThreadPresenter for StdoutPresenter {
    fn open_thread(&mut self, column: &str, thread: &Thread) {
        self.print(&format!("[{}]", column), thread);
    }

    fn close_thread(&mut self) {
        println!("--- closed");
    }

    fn reload_thread(&mut self, thread: &Thread) {
        self.print("(updated)", thread);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum PresenterCall {
        Open { column: String, thread: String },
        Close,
        Reload { thread: String, messages: usize },
    }

    /// Records presenter calls into a shared log the test keeps a handle to
    #[derive(Clone, Default)]
    pub struct RecordingPresenter {
        pub calls: Arc<Mutex<Vec<PresenterCall>>>,
    }

    impl RecordingPresenter {
        pub fn calls(&self) -> Vec<PresenterCall> {
            self.calls.lock().clone()
        }
    }

    impl ThreadPresenter for RecordingPresenter {
        fn open_thread(&mut self, column: &str, thread: &Thread) {
            self.calls.lock().push(PresenterCall::Open {
                column: column.to_string(),
                thread: thread.id.clone(),
            });
        }

        fn close_thread(&mut self) {
            self.calls.lock().push(PresenterCall::Close);
        }

        fn reload_thread(&mut self, thread: &Thread) {
            self.calls.lock().push(PresenterCall::Reload {
                thread: thread.id.clone(),
                messages: thread.len(),
            });
        }
    }
}
