pub mod controls;
pub mod drag;
pub mod machine;
pub mod state;

pub use controls::ThreadControls;
pub use drag::{DragPayload, DragSource};
pub use machine::{Effect, MoveRequest, ThreadAction, ThreadController, ThreadEnv, ThreadKey};
pub use state::{Busy, ThreadActionState};
