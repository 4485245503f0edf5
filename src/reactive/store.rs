//! Reactive records.
//!
//! [`Reactive<T>`] wraps a plain record. Reads name the field they touch and
//! subscribe the running computation to it; writes name the fields they
//! change and re-run those subscribers synchronously.
//!
//! ```
//! use spark_vdom::reactive::{effect, reactive};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! struct Counter { count: i32 }
//!
//! let state = reactive(Counter { count: 0 });
//! let seen = Rc::new(Cell::new(0));
//!
//! let (s, out) = (state.clone(), seen.clone());
//! effect(move || out.set(s.read("count", |c| c.count)));
//!
//! state.write("count", |c| c.count = 5);
//! assert_eq!(seen.get(), 5);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::runtime::{self, SubjectId};
use crate::types::Field;

struct ReactiveInner<T> {
    id: SubjectId,
    value: RefCell<T>,
}

impl<T> Drop for ReactiveInner<T> {
    fn drop(&mut self) {
        runtime::forget_subject(self.id);
    }
}

/// A tracked record.
///
/// Cloning gives another handle to the same record. Do not write from inside
/// a `read` closure of the same record.
pub struct Reactive<T> {
    inner: Rc<ReactiveInner<T>>,
}

impl<T> Clone for Reactive<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Reactive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reactive")
            .field("id", &self.inner.id)
            .field("value", &self.inner.value.borrow())
            .finish()
    }
}

/// Wrap a record so field reads are tracked and writes notify.
pub fn reactive<T: 'static>(record: T) -> Reactive<T> {
    Reactive::new(record)
}

impl<T: 'static> Reactive<T> {
    pub fn new(record: T) -> Self {
        Self {
            inner: Rc::new(ReactiveInner {
                id: runtime::next_subject_id(),
                value: RefCell::new(record),
            }),
        }
    }

    pub fn id(&self) -> SubjectId {
        self.inner.id
    }

    /// Tracked read of `field`.
    pub fn read<R>(&self, field: Field, f: impl FnOnce(&T) -> R) -> R {
        runtime::track(self.inner.id, field);
        f(&self.inner.value.borrow())
    }

    /// Tracked read of several fields at once.
    pub fn read_fields<R>(&self, fields: &[Field], f: impl FnOnce(&T) -> R) -> R {
        for &field in fields {
            runtime::track(self.inner.id, field);
        }
        f(&self.inner.value.borrow())
    }

    /// Untracked read.
    pub fn peek<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Write `field`, then run its subscribers.
    pub fn write<R>(&self, field: Field, f: impl FnOnce(&mut T) -> R) -> R {
        self.write_fields(&[field], f)
    }

    /// Write several fields in one go. Each subscriber runs once even if it
    /// read more than one of them.
    pub fn write_fields<R>(&self, fields: &[Field], f: impl FnOnce(&mut T) -> R) -> R {
        let result = {
            let mut value = self.inner.value.borrow_mut();
            f(&mut value)
        };
        runtime::trigger(self.inner.id, fields);
        result
    }

    /// Number of computations currently subscribed to `field`.
    pub fn subscriber_count(&self, field: Field) -> usize {
        runtime::subscriber_count(self.inner.id, field)
    }
}

// =============================================================================
// Tests
// =============================================================================
