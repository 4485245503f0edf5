//! Tree descriptions.
//!
//! A description is the declarative, rebuilt-every-render picture of the UI:
//!
//! ```text
//! Element("div", {class: "container"})
//! ├── Element("h1") ── Text("Hello")
//! └── Element("ul", KEYED_CHILDREN)
//!     ├── Element("li", key = "a") ── Text("Item A")
//!     └── Element("li", key = "b") ── Text("Item B")
//! ```
//!
//! Nodes are a tagged variant over text leaves, elements and components, so
//! reconciliation and mounting switch over them exhaustively.

mod node;

pub use node::*;
