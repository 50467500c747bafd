//! Application-wide constants for tuning and configuration
//!
//! Centralizes magic numbers to make them discoverable and configurable.

/// Default undo window in seconds before a destructive action is committed.
/// Overridable through `[undo] window_secs` in the config file.
pub const UNDO_WINDOW_SECS: u64 = 5;

/// Capacity of the undo queue command channel.
pub const UNDO_COMMAND_CAPACITY: usize = 32;

/// Capacity of the undo queue event channel.
pub const UNDO_EVENT_CAPACITY: usize = 64;

/// Pointer-move events ignored after a hover reset.
/// Scrolling a column emits one synthetic move under a still pointer.
pub const POINTER_MOVES_IGNORED: u32 = 1;

/// Well-known folder (column) ids
pub mod folders {
    pub const INBOX: &str = "inbox";
    pub const ARCHIVE: &str = "archive";
    pub const TRASH: &str = "trash";
    pub const SPAM: &str = "spam";
}

/// Upper bound on waiting for in-flight commits when the session ends.
pub const SHUTDOWN_GRACE_SECS: u64 = 10;
