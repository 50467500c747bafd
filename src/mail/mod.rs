pub mod memory;
pub mod membership;
pub mod store;
pub mod types;

pub use memory::{MemoryStore, StoreCall};
pub use membership::folder_message_ids;
pub use store::{MailStore, StoreError, ThreadSource};
pub use types::{Message, Thread, ThreadId, Uid};
