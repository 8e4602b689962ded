use core::iter::FusedIterator;

use crate::error::Error;
use crate::model::XdmNode;

enum DescendState<N: XdmNode> {
    NotStarted(N),
    // one open child cursor per level below the context node
    Walking(Vec<N::Children>),
    Done,
}

/// `descendant` and `descendant-or-self` in document order.
///
/// Pre-order depth-first walk over a stack of child cursors; nothing is
/// buffered beyond one open cursor per depth level.
pub struct DescendantAxis<N: XdmNode> {
    pending_self: Option<N>,
    state: DescendState<N>,
}

impl<N: XdmNode> DescendantAxis<N> {
    pub(crate) fn new(node: N, include_self: bool) -> Self {
        Self {
            pending_self: include_self.then(|| node.clone()),
            state: DescendState::NotStarted(node),
        }
    }
}

impl<N: XdmNode> Iterator for DescendantAxis<N> {
    type Item = Result<N, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(node) = self.pending_self.take() {
            return Some(Ok(node));
        }
        if let DescendState::NotStarted(node) = &self.state {
            self.state = DescendState::Walking(vec![node.child_cursor()]);
        }
        let DescendState::Walking(stack) = &mut self.state else {
            return None;
        };
        while let Some(top) = stack.last_mut() {
            match top.next() {
                Some(Ok(child)) => {
                    stack.push(child.child_cursor());
                    return Some(Ok(child));
                }
                Some(Err(e)) => {
                    self.state = DescendState::Done;
                    return Some(Err(e));
                }
                None => {
                    stack.pop();
                }
            }
        }
        self.state = DescendState::Done;
        None
    }
}

impl<N: XdmNode> FusedIterator for DescendantAxis<N> {}
