//! Which of a thread's messages belong to a given folder, plus the small
//! per-thread summaries shown in a column.

use super::types::{Thread, Uid};

/// Folder-scoped ids of the thread's messages present in `folder`, in thread order.
///
/// Every remote mutation works on these ids: the same message carries a
/// different id in each folder it lives in.
pub fn folder_message_ids(thread: &Thread, folder: &str) -> Vec<Uid> {
    thread
        .messages()
        .iter()
        .filter_map(|message| message.uid_in(folder))
        .collect()
}

/// Keys used by the read-state tracker: `account_name-message_id`
pub fn read_keys(thread: &Thread) -> Vec<String> {
    thread
        .messages()
        .iter()
        .map(|message| format!("{}-{}", message.account_name, message.message_id))
        .collect()
}

/// Unique short sender names across the thread, first occurrence wins
pub fn address_list(thread: &Thread) -> Vec<String> {
    let mut seen = Vec::new();
    for address in thread.messages().iter().flat_map(|m| m.from.iter()) {
        let short = address.short();
        if !seen.iter().any(|s: &String| s == short) {
            seen.push(short.to_string());
        }
    }
    seen
}

pub fn attachment_count(thread: &Thread) -> usize {
    thread.messages().iter().map(|m| m.attachment_count).sum()
}
