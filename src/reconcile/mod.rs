//! Reconciler - compute the minimal edit script between two trees.
//!
//! # Architecture
//!
//! ```text
//! diff(old, new)
//!   ├── text/text       → UpdateText or nothing
//!   ├── element/element → attributes + children (keyed or positional)
//!   ├── component pair  → diff of the rendered outputs
//!   └── anything else   → Replace
//! ```
//!
//! The diff is a pure function of the two descriptions. It never touches
//! the host; [`crate::renderer::apply`] does that.
//!
//! # Invariants
//!
//! - `diff(t, t)` is a no-op
//! - Keyed children that keep their relative order are never moved; the
//!   number of moves equals matched children minus the longest increasing
//!   run of their old positions
//! - A `PatchChild` is only emitted if its nested script does something

mod diff;
mod keyed;
mod lis;
mod script;

pub use diff::diff;
pub use lis::longest_increasing_subsequence;
pub use script::{DiffStats, EditScript, PatchOp};
