use std::collections::HashMap;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::constants::folders;

/// Folder-scoped message identifier (an IMAP UID within one folder)
pub type Uid = u32;

pub type ThreadId = String;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct MessageFlags: u32 {
        const SEEN = 0b00000001;
        const ANSWERED = 0b00000010;
        const FLAGGED = 0b00000100;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
}

impl Address {
    /// Short display form: the name when known, otherwise the bare address
    pub fn short(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.email,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Message {
    pub account_name: String,
    pub message_id: String,
    /// Identifier of this message in every folder it is present in
    pub folder_uids: HashMap<String, Uid>,
    pub flags: MessageFlags,
    pub subject: String,
    pub from: Vec<Address>,
    pub date: i64,
    pub excerpt: String,
    pub attachment_count: usize,
}

impl Message {
    pub fn uid_in(&self, folder: &str) -> Option<Uid> {
        self.folder_uids.get(folder).copied()
    }

    pub fn is_seen(&self) -> bool {
        self.flags.contains(MessageFlags::SEEN)
    }

    pub fn is_flagged(&self) -> bool {
        self.flags.contains(MessageFlags::FLAGGED)
    }
}

/// A conversation: messages ordered newest-first.
///
/// Threads are replaced wholesale when fresh data arrives, never mutated in
/// place, so the derived flags below are always computed from the current
/// newest message.
#[derive(Debug, Clone)]
pub struct Thread {
    pub id: ThreadId,
    messages: Vec<Message>,
}

impl Thread {
    /// Returns `None` for an empty message list; a thread always has a newest message.
    pub fn new(id: impl Into<ThreadId>, messages: Vec<Message>) -> Option<Self> {
        if messages.is_empty() {
            return None;
        }
        Some(Self {
            id: id.into(),
            messages,
        })
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn newest(&self) -> &Message {
        // Non-empty by construction
        &self.messages[0]
    }

    pub fn account_name(&self) -> &str {
        &self.newest().account_name
    }

    pub fn starred(&self) -> bool {
        self.newest().is_flagged()
    }

    pub fn unread(&self) -> bool {
        !self.newest().is_seen()
    }

    /// Archived threads no longer have their newest message in the inbox
    pub fn archived(&self) -> bool {
        self.newest().uid_in(folders::INBOX).is_none()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn message(account: &str, message_id: &str, folders: &[(&str, Uid)]) -> Message {
        Message {
            account_name: account.to_string(),
            message_id: message_id.to_string(),
            folder_uids: folders
                .iter()
                .map(|(folder, uid)| (folder.to_string(), *uid))
                .collect(),
            flags: MessageFlags::empty(),
            subject: format!("Subject {}", message_id),
            from: vec![Address {
                name: None,
                email: "sender@example.com".to_string(),
            }],
            date: 1_700_000_000,
            excerpt: String::new(),
            attachment_count: 0,
        }
    }

    pub fn thread(id: &str, messages: Vec<Message>) -> Thread {
        Thread::new(id, messages).expect("test threads are non-empty")
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_empty_thread_rejected() {
        assert!(Thread::new("t", Vec::new()).is_none());
    }

    #[test]
    fn test_flags_seeded_from_newest_message() {
        let mut newest = message("acct", "m2", &[("inbox", 2)]);
        newest.flags = MessageFlags::FLAGGED;
        let mut older = message("acct", "m1", &[("archive", 9)]);
        older.flags = MessageFlags::SEEN;

        let t = thread("t1", vec![newest, older]);
        assert!(t.starred());
        assert!(t.unread());
        assert!(!t.archived());
        assert_eq!(t.account_name(), "acct");
    }

    #[test]
    fn test_archived_when_newest_not_in_inbox() {
        let t = thread("t1", vec![message("acct", "m1", &[("archive", 4)])]);
        assert!(t.archived());
    }

    #[test]
    fn test_address_short_form() {
        let named = Address {
            name: Some("Ada".to_string()),
            email: "ada@example.com".to_string(),
        };
        let blank = Address {
            name: Some("  ".to_string()),
            email: "bob@example.com".to_string(),
        };
        assert_eq!(named.short(), "Ada");
        assert_eq!(blank.short(), "bob@example.com");
    }
}
