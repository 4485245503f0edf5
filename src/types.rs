//! Core types for spark-vdom.
//!
//! These are the small value types every other module speaks: keys,
//! attribute values, diff hint flags and reactive field names.

use std::fmt;
use std::rc::Rc;

// =============================================================================
// Key
// =============================================================================

/// Stable identity of a child across renders.
///
/// Keys only matter among siblings of a parent marked
/// [`PatchFlags::KEYED_CHILDREN`]. Uniqueness is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Int(i64),
    Str(Rc<str>),
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Key::Int(i64::from(value))
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(Rc::from(value))
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Str(Rc::from(value))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(n) => write!(f, "{n}"),
            Key::Str(s) => f.write_str(s),
        }
    }
}

// =============================================================================
// Attribute values
// =============================================================================

/// Event handler attached as an attribute value.
///
/// Handlers compare by pointer: a closure rebuilt on every render is always
/// "changed", the same `Rc` passed again is not.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn()>);

impl Handler {
    pub fn new(f: impl Fn() + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invoke the handler.
    pub fn call(&self) {
        (self.0)()
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:p})", Rc::as_ptr(&self.0))
    }
}

/// Value of an element attribute.
///
/// How a value lands on the host (plain attribute, style map, listener) is
/// the host adapter's business; the reconciler only compares and carries it.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Handler(Handler),
}

impl AttrValue {
    /// True for values that should be bound as listeners.
    pub fn is_handler(&self) -> bool {
        matches!(self, AttrValue::Handler(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Str(s) => f.write_str(s),
            AttrValue::Int(n) => write!(f, "{n}"),
            AttrValue::Float(n) => write!(f, "{n}"),
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Handler(_) => f.write_str("[handler]"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Int(value as i64)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<Handler> for AttrValue {
    fn from(value: Handler) -> Self {
        AttrValue::Handler(value)
    }
}

// =============================================================================
// Patch flags (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Diff hints set when a node is built. The reconciler reads them from
    /// the new node and never writes them.
    ///
    /// `CLASS`, `STYLE` and `PROPS` narrow the attribute diff to the keys they
    /// name unless `FULL_PROPS` is also set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PatchFlags: u16 {
        const NONE = 0;
        /// Pure text leaf, skip the attribute diff.
        const TEXT = 1 << 0;
        /// Only `class` is dynamic.
        const CLASS = 1 << 1;
        /// Only `style` is dynamic.
        const STYLE = 1 << 2;
        /// Only the keys in `dynamic_props` are dynamic.
        const PROPS = 1 << 3;
        /// Attribute keys themselves are dynamic, diff everything.
        const FULL_PROPS = 1 << 4;
        /// Children are reconciled by key.
        const KEYED_CHILDREN = 1 << 5;
        /// Children are reconciled by position (the default).
        const UNKEYED_CHILDREN = 1 << 6;
        /// Node is a component.
        const COMPONENT = 1 << 7;
    }
}

impl PatchFlags {
    /// True if the attribute diff is restricted to a known subset of keys.
    #[inline]
    pub fn narrows_attributes(self) -> bool {
        self.intersects(Self::CLASS | Self::STYLE | Self::PROPS) && !self.contains(Self::FULL_PROPS)
    }
}

// =============================================================================
// Reactive field names
// =============================================================================

/// Name of a tracked field inside a reactive record.
pub type Field = &'static str;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_conversions() {
        assert_eq!(Key::from(3), Key::Int(3));
        assert_eq!(Key::from("a"), Key::from(String::from("a")));
        assert_ne!(Key::from("1"), Key::from(1));
        assert_eq!(Key::from("abc").to_string(), "abc");
    }

    #[test]
    fn test_handler_pointer_equality() {
        let a = Handler::new(|| {});
        let b = a.clone();
        let c = Handler::new(|| {});
        assert_eq!(AttrValue::from(a.clone()), AttrValue::from(b));
        assert_ne!(AttrValue::from(a), AttrValue::from(c));
    }

    #[test]
    fn test_narrowing_flags() {
        assert!(!PatchFlags::empty().narrows_attributes());
        assert!(PatchFlags::CLASS.narrows_attributes());
        assert!((PatchFlags::STYLE | PatchFlags::KEYED_CHILDREN).narrows_attributes());
        assert!(!(PatchFlags::PROPS | PatchFlags::FULL_PROPS).narrows_attributes());
    }
}
