//! Keyboard focus and open-thread registry.
//!
//! Holds at most one focused thread and at most one open thread. Replacing
//! the owner does not notify the previous one; callers clear the old owner's
//! hover state themselves before handing focus over.

use crate::thread::ThreadKey;

#[derive(Debug, Default)]
pub struct FocusRegistry {
    owner: Option<ThreadKey>,
    open: Option<ThreadKey>,
}

impl FocusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditionally replace the focused thread
    pub fn set_owner(&mut self, owner: Option<ThreadKey>) {
        tracing::debug!(
            "Focus: {:?} -> {:?}",
            self.owner.as_ref().map(|k| k.to_string()),
            owner.as_ref().map(|k| k.to_string())
        );
        self.owner = owner;
    }

    pub fn owner(&self) -> Option<&ThreadKey> {
        self.owner.as_ref()
    }

    pub fn is_owner(&self, key: &ThreadKey) -> bool {
        self.owner.as_ref() == Some(key)
    }

    pub fn set_open(&mut self, open: Option<ThreadKey>) {
        self.open = open;
    }

    pub fn open(&self) -> Option<&ThreadKey> {
        self.open.as_ref()
    }

    pub fn is_any_open(&self) -> bool {
        self.open.is_some()
    }

    /// Forget a thread that is being unmounted. Returns true if it was open.
    pub fn forget(&mut self, key: &ThreadKey) -> bool {
        if self.is_owner(key) {
            self.owner = None;
        }
        if self.open.as_ref() == Some(key) {
            self.open = None;
            return true;
        }
        false
    }
}
