//! Plain-text board rendering

use std::fmt::Write;

use chrono::DateTime;

use crate::constants::folders;
use crate::mail::membership::{address_list, attachment_count};
use crate::thread::{ThreadControls, ThreadController};

use super::App;

pub fn render_board(app: &App, date_format: &str) -> String {
    let mut out = String::new();

    for column in &app.columns {
        let controls = ThreadControls::for_column(&column.id);
        let _ = writeln!(
            out,
            "== {} ({}) [{}] ==",
            column.id,
            column.threads.len(),
            controls.hint()
        );
        if column.threads.is_empty() {
            let _ = writeln!(out, "   (empty)");
        }
        for (index, controller) in column.threads.iter().enumerate() {
            let _ = writeln!(out, "{}", thread_line(index, controller, date_format));
        }
    }

    if let Some(notice) = &app.undo_notice {
        let _ = writeln!(out, ">> {}", notice);
    }
    if let Some(status) = &app.status {
        let _ = writeln!(out, "!! {}", status);
    }
    out
}

fn thread_line(index: usize, controller: &ThreadController, date_format: &str) -> String {
    let thread = controller.thread();
    let state = controller.state();

    let date = DateTime::from_timestamp(thread.newest().date, 0)
        .map(|dt| dt.format(date_format).to_string())
        .unwrap_or_default();

    let mut line = format!(
        "{:>3} {}{} {:<8} {:<24} {}",
        index,
        if state.starred { '*' } else { ' ' },
        if state.unread { 'u' } else { ' ' },
        date,
        truncate(&address_list(thread).join(", "), 24),
        thread.newest().subject,
    );

    if thread.len() > 1 {
        let _ = write!(line, " ({})", thread.len());
    }
    let attachments = attachment_count(thread);
    if attachments > 0 {
        let _ = write!(line, " +{} att", attachments);
    }

    let mut tags = Vec::new();
    if state.open {
        tags.push("open");
    }
    if state.hover {
        tags.push("hover");
    }
    if state.archived && controller.key().column != folders::ARCHIVE {
        tags.push("archived");
    }
    if state.is_locked() {
        tags.push(state.busy.label());
    }
    if state.dragging {
        tags.push("dragging");
    }
    if state.error {
        tags.push("error");
    }
    if !tags.is_empty() {
        let _ = write!(line, " [{}]", tags.join(" "));
    }
    line
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('~');
    cut
}
