//! Render pipeline - from reactive state to host updates.
//!
//! # Pipeline Architecture
//!
//! ```text
//! reactive write → render effect → latest tree → queue_update → flush → diff → apply
//! ```
//!
//! ## Data Flow
//!
//! 1. **render effect** - runs the app's render function, tracking every
//!    store field it reads (component renders included)
//! 2. **commit** - queued once per flush window; diffs the last committed
//!    tree against the newest one and applies the script to the host
//!
//! ## Key Design Principles
//!
//! - **First paint is synchronous**: `App::mount` returns with the tree on
//!   the host
//! - **Later paints are batched**: any number of writes between two flushes
//!   cost one diff and one apply
//! - **Failures poison, retries remount**: a half-applied script is never
//!   diffed against again

pub mod mount;

pub use mount::App;
