//! In-process mail store.
//!
//! Backs the line-driven session with a mailbox loaded from a TOML fixture and
//! doubles as the recording store in tests: every call is logged, and moves or
//! star toggles can be made to fail on demand.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;

use super::store::{MailStore, StoreError, ThreadSource};
use super::types::{Address, Message, MessageFlags, Thread, ThreadId, Uid};

/// A call received by the store, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Move {
        account: String,
        ids: Vec<Uid>,
        from: String,
        to: String,
    },
    Star {
        account: String,
        folder: String,
        ids: Vec<Uid>,
    },
    Unstar {
        account: String,
        folder: String,
        ids: Vec<Uid>,
    },
    MarkRead(Vec<String>),
    Reconcile,
}

#[derive(Debug, Deserialize)]
struct MailboxFixture {
    #[serde(default)]
    messages: Vec<FixtureMessage>,
}

#[derive(Debug, Deserialize)]
struct FixtureMessage {
    account: String,
    message_id: String,
    thread: String,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    from: Vec<Address>,
    #[serde(default)]
    date: i64,
    #[serde(default)]
    excerpt: String,
    #[serde(default)]
    seen: bool,
    #[serde(default)]
    starred: bool,
    #[serde(default)]
    attachments: usize,
    folders: HashMap<String, Uid>,
}

impl FixtureMessage {
    fn into_entry(self) -> (ThreadId, Message) {
        let mut flags = MessageFlags::empty();
        flags.set(MessageFlags::SEEN, self.seen);
        flags.set(MessageFlags::FLAGGED, self.starred);
        let message = Message {
            account_name: self.account,
            message_id: self.message_id,
            folder_uids: self.folders,
            flags,
            subject: self.subject,
            from: self.from,
            date: self.date,
            excerpt: self.excerpt,
            attachment_count: self.attachments,
        };
        (self.thread, message)
    }
}

#[derive(Debug, Default)]
struct Inner {
    messages: Vec<(ThreadId, Message)>,
    calls: Vec<StoreCall>,
    fail_moves: bool,
    fail_stars: bool,
}

impl Inner {
    fn has_account(&self, account: &str) -> bool {
        self.messages.iter().any(|(_, m)| m.account_name == account)
    }

    fn next_uid(&self, folder: &str) -> Uid {
        self.messages
            .iter()
            .filter_map(|(_, m)| m.uid_in(folder))
            .max()
            .unwrap_or(0)
            + 1
    }

    fn set_flagged(&mut self, account: &str, folder: &str, ids: &[Uid], flagged: bool) {
        for (_, message) in self.messages.iter_mut() {
            if message.account_name == account
                && message.uid_in(folder).is_some_and(|uid| ids.contains(&uid))
            {
                message.flags.set(MessageFlags::FLAGGED, flagged);
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let fixture: MailboxFixture = toml::from_str(text).context("Invalid mailbox fixture")?;
        let store = Self::new();
        {
            let mut inner = store.inner.lock();
            inner.messages = fixture
                .messages
                .into_iter()
                .map(FixtureMessage::into_entry)
                .collect();
        }
        Ok(store)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read mailbox {}", path.display()))?;
        Self::from_toml(&text)
    }

    pub fn insert(&self, thread: impl Into<ThreadId>, message: Message) {
        self.inner.lock().messages.push((thread.into(), message));
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.inner.lock().calls.clone()
    }

    pub fn move_calls(&self) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, StoreCall::Move { .. }))
            .count()
    }

    pub fn set_fail_moves(&self, fail: bool) {
        self.inner.lock().fail_moves = fail;
    }

    pub fn set_fail_stars(&self, fail: bool) {
        self.inner.lock().fail_stars = fail;
    }
}

#[async_trait]
impl MailStore for MemoryStore {
    async fn move_messages(
        &self,
        account: &str,
        ids: &[Uid],
        from_folder: &str,
        to_folder: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.calls.push(StoreCall::Move {
            account: account.to_string(),
            ids: ids.to_vec(),
            from: from_folder.to_string(),
            to: to_folder.to_string(),
        });

        if inner.fail_moves {
            return Err(StoreError::Rejected(format!(
                "move {} -> {} refused",
                from_folder, to_folder
            )));
        }
        if !inner.has_account(account) {
            return Err(StoreError::UnknownAccount(account.to_string()));
        }

        let mut next_uid = inner.next_uid(to_folder);
        for (_, message) in inner.messages.iter_mut() {
            if message.account_name != account {
                continue;
            }
            let Some(uid) = message.uid_in(from_folder) else {
                continue;
            };
            if !ids.contains(&uid) {
                continue;
            }
            message.folder_uids.remove(from_folder);
            message.folder_uids.insert(to_folder.to_string(), next_uid);
            next_uid += 1;
        }

        tracing::debug!(
            "Moved {} messages {} -> {} for {}",
            ids.len(),
            from_folder,
            to_folder,
            account
        );
        Ok(())
    }

    async fn star_messages(
        &self,
        account: &str,
        folder: &str,
        ids: &[Uid],
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.calls.push(StoreCall::Star {
            account: account.to_string(),
            folder: folder.to_string(),
            ids: ids.to_vec(),
        });
        if inner.fail_stars {
            return Err(StoreError::Rejected("star refused".to_string()));
        }
        inner.set_flagged(account, folder, ids, true);
        Ok(())
    }

    async fn unstar_messages(
        &self,
        account: &str,
        folder: &str,
        ids: &[Uid],
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.calls.push(StoreCall::Unstar {
            account: account.to_string(),
            folder: folder.to_string(),
            ids: ids.to_vec(),
        });
        if inner.fail_stars {
            return Err(StoreError::Rejected("unstar refused".to_string()));
        }
        inner.set_flagged(account, folder, ids, false);
        Ok(())
    }

    fn mark_read(&self, keys: &[String]) {
        let mut inner = self.inner.lock();
        inner.calls.push(StoreCall::MarkRead(keys.to_vec()));
        for (_, message) in inner.messages.iter_mut() {
            let key = format!("{}-{}", message.account_name, message.message_id);
            if keys.contains(&key) {
                message.flags.insert(MessageFlags::SEEN);
            }
        }
    }

    fn reconcile_changes(&self) {
        self.inner.lock().calls.push(StoreCall::Reconcile);
    }
}

impl ThreadSource for MemoryStore {
    fn load_threads(&self, folder: &str) -> Vec<Thread> {
        let inner = self.inner.lock();

        let mut order: Vec<ThreadId> = Vec::new();
        let mut grouped: HashMap<ThreadId, Vec<Message>> = HashMap::new();
        for (thread_id, message) in inner.messages.iter() {
            if message.uid_in(folder).is_none() {
                continue;
            }
            if !grouped.contains_key(thread_id) {
                order.push(thread_id.clone());
            }
            grouped
                .entry(thread_id.clone())
                .or_default()
                .push(message.clone());
        }

        let mut threads: Vec<Thread> = order
            .into_iter()
            .filter_map(|id| {
                let mut messages = grouped.remove(&id)?;
                // Newest first within a thread
                messages.sort_by(|a, b| b.date.cmp(&a.date));
                Thread::new(id, messages)
            })
            .collect();

        threads.sort_by(|a, b| {
            b.newest()
                .date
                .cmp(&a.newest().date)
                .then_with(|| a.id.cmp(&b.id))
        });
        threads
    }
}
