//! `following` and `preceding`.
//!
//! Both walk the ancestor chain outward from the context node and materialize,
//! per level, the siblings on one side of the chain node together with their
//! subtrees. A forward-only child cursor cannot produce either order directly.
//! A backend failure anywhere during materialization discards the buffer and
//! surfaces as the iterator's only item.

use core::iter::FusedIterator;

use super::{not_below_parent, skip_through};
use crate::error::Error;
use crate::model::{NodeKind, XdmNode};

enum BufferState<N> {
    NotStarted(N),
    Replaying(std::vec::IntoIter<N>),
    Done,
}

impl<N: XdmNode> BufferState<N> {
    fn next_with(&mut self, fill: fn(&N) -> Result<Vec<N>, Error>) -> Option<Result<N, Error>> {
        if let BufferState::NotStarted(node) = self {
            match fill(node) {
                Ok(buf) => *self = BufferState::Replaying(buf.into_iter()),
                Err(e) => {
                    *self = BufferState::Done;
                    return Some(Err(e));
                }
            }
        }
        let BufferState::Replaying(it) = self else {
            return None;
        };
        match it.next() {
            Some(n) => Some(Ok(n)),
            None => {
                *self = BufferState::Done;
                None
            }
        }
    }
}

/// Appends `node` and its subtree in document order.
fn expand_into<N: XdmNode>(node: &N, out: &mut Vec<N>) -> Result<(), Error> {
    out.push(node.finish());
    for child in node.child_cursor() {
        expand_into(&child?, out)?;
    }
    Ok(())
}

/// `following` in document order.
pub struct FollowingAxis<N> {
    state: BufferState<N>,
}

impl<N: XdmNode> FollowingAxis<N> {
    pub(crate) fn new(node: N) -> Self {
        Self {
            state: BufferState::NotStarted(node),
        }
    }

    fn materialize(node: &N) -> Result<Vec<N>, Error> {
        let mut out = Vec::new();
        let mut levels = 0usize;
        let mut cur = node.clone();
        while let Some(parent) = cur.parent() {
            let mut cursor = parent.child_cursor();
            // attributes sit before all children of their owner
            if cur.kind() != NodeKind::Attribute {
                skip_through(&mut cursor, &cur)?;
            }
            for sib in cursor {
                expand_into(&sib?, &mut out)?;
            }
            levels += 1;
            cur = parent;
        }
        tracing::trace!(levels, buffered = out.len(), "following axis materialized");
        Ok(out)
    }
}

impl<N: XdmNode> Iterator for FollowingAxis<N> {
    type Item = Result<N, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.state.next_with(Self::materialize)
    }
}

impl<N: XdmNode> FusedIterator for FollowingAxis<N> {}

/// `preceding`, nearest first (reverse document order).
pub struct PrecedingAxis<N> {
    state: BufferState<N>,
}

impl<N: XdmNode> PrecedingAxis<N> {
    pub(crate) fn new(node: N) -> Self {
        Self {
            state: BufferState::NotStarted(node),
        }
    }

    fn materialize(node: &N) -> Result<Vec<N>, Error> {
        let mut out = Vec::new();
        let mut levels = 0usize;
        let mut cur = node.clone();
        while let Some(parent) = cur.parent() {
            // an attribute has no preceding siblings; its owner's do count
            if cur.kind() != NodeKind::Attribute {
                let mut level = Vec::new();
                let mut found = false;
                for sib in parent.child_cursor() {
                    let sib = sib?;
                    if sib.is(&cur) {
                        found = true;
                        break;
                    }
                    expand_into(&sib, &mut level)?;
                }
                if !found {
                    return Err(not_below_parent(&cur));
                }
                out.extend(level.into_iter().rev());
            }
            levels += 1;
            cur = parent;
        }
        tracing::trace!(levels, buffered = out.len(), "preceding axis materialized");
        Ok(out)
    }
}

impl<N: XdmNode> Iterator for PrecedingAxis<N> {
    type Item = Result<N, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.state.next_with(Self::materialize)
    }
}

impl<N: XdmNode> FusedIterator for PrecedingAxis<N> {}
