//! Side table of host handles.

/// Host handle of one mounted node plus its mounted children.
///
/// Mirrors the shape of the description it was mounted from, with
/// components flattened to their rendered output. The renderer owns it;
/// descriptions never hold handles.
#[derive(Debug, Clone, PartialEq)]
pub struct Mounted<H> {
    pub handle: H,
    pub children: Vec<Mounted<H>>,
    /// Subtrees left attached next to `handle` by a replace the host could
    /// neither finish nor roll back. Teardown detaches and releases them.
    pub displaced: Vec<Mounted<H>>,
}

impl<H> Mounted<H> {
    pub fn leaf(handle: H) -> Self {
        Self {
            handle,
            children: Vec::new(),
            displaced: Vec::new(),
        }
    }

    /// Number of host nodes in this subtree, not counting displaced ones.
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(Mounted::len).sum::<usize>()
    }

    /// Never empty; a mounted subtree always has its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Handles in pre-order.
    pub fn handles(&self) -> Vec<&H> {
        let mut out = Vec::with_capacity(self.len());
        self.collect(&mut out);
        out
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a H>) {
        out.push(&self.handle);
        for child in &self.children {
            child.collect(out);
        }
    }
}
