use core::iter::FusedIterator;

use super::LazyCursor;
use crate::error::Error;
use crate::model::XdmNode;

pub struct SelfAxis<N> {
    node: Option<N>,
}

impl<N> SelfAxis<N> {
    pub(crate) fn new(node: N) -> Self {
        Self { node: Some(node) }
    }
}

impl<N> Iterator for SelfAxis<N> {
    type Item = Result<N, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.node.take().map(Ok)
    }
}

impl<N> FusedIterator for SelfAxis<N> {}

pub struct ParentAxis<N> {
    node: Option<N>,
}

impl<N> ParentAxis<N> {
    pub(crate) fn new(node: N) -> Self {
        Self { node: Some(node) }
    }
}

impl<N: XdmNode> Iterator for ParentAxis<N> {
    type Item = Result<N, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.node.take()?.parent().map(Ok)
    }
}

impl<N: XdmNode> FusedIterator for ParentAxis<N> {}

enum AncestorState<N> {
    NotStarted(N),
    // last node handed out
    At(N),
    Done,
}

/// `ancestor` and `ancestor-or-self`, nearest first.
pub struct AncestorAxis<N> {
    state: AncestorState<N>,
    include_self: bool,
}

impl<N> AncestorAxis<N> {
    pub(crate) fn new(node: N, include_self: bool) -> Self {
        Self {
            state: AncestorState::NotStarted(node),
            include_self,
        }
    }
}

impl<N: XdmNode> Iterator for AncestorAxis<N> {
    type Item = Result<N, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = match core::mem::replace(&mut self.state, AncestorState::Done) {
            AncestorState::NotStarted(node) if self.include_self => Some(node),
            AncestorState::NotStarted(node) | AncestorState::At(node) => node.parent(),
            AncestorState::Done => None,
        }?;
        self.state = AncestorState::At(next.clone());
        Some(Ok(next))
    }
}

impl<N: XdmNode> FusedIterator for AncestorAxis<N> {}

/// `child` axis with a one-node lookahead for [`ChildAxis::has_more`].
pub struct ChildAxis<N: XdmNode> {
    cursor: LazyCursor<N, N::Children>,
    peeked: Option<Result<N, Error>>,
}

impl<N: XdmNode> ChildAxis<N> {
    pub(crate) fn new(node: N) -> Self {
        Self {
            cursor: LazyCursor::NotStarted(node),
            peeked: None,
        }
    }

    fn pull(&mut self) -> Option<Result<N, Error>> {
        self.cursor.pull(N::child_cursor)
    }

    /// Whether another child follows, without consuming it.
    pub fn has_more(&mut self) -> bool {
        if self.peeked.is_none() {
            self.peeked = self.pull();
        }
        self.peeked.is_some()
    }
}

impl<N: XdmNode> Iterator for ChildAxis<N> {
    type Item = Result<N, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.peeked.take() {
            Some(item) => Some(item),
            None => self.pull(),
        }
    }
}

impl<N: XdmNode> FusedIterator for ChildAxis<N> {}

/// `attribute` axis in backend declaration order.
pub struct AttributeAxis<N: XdmNode> {
    cursor: LazyCursor<N, N::Attributes>,
}

impl<N: XdmNode> AttributeAxis<N> {
    pub(crate) fn new(node: N) -> Self {
        Self {
            cursor: LazyCursor::NotStarted(node),
        }
    }
}

impl<N: XdmNode> Iterator for AttributeAxis<N> {
    type Item = Result<N, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.pull(N::attribute_cursor)
    }
}

impl<N: XdmNode> FusedIterator for AttributeAxis<N> {}
