use core::iter::FusedIterator;

use super::{not_below_parent, skip_through};
use crate::error::Error;
use crate::model::{NodeKind, XdmNode};

enum FollowingSiblingState<N: XdmNode> {
    NotStarted(N),
    Streaming(N::Children),
    Done,
}

/// `following-sibling` in document order. Streams the parent's child cursor
/// once the context node has been passed.
pub struct FollowingSiblingAxis<N: XdmNode> {
    state: FollowingSiblingState<N>,
}

impl<N: XdmNode> FollowingSiblingAxis<N> {
    pub(crate) fn new(node: N) -> Self {
        Self {
            state: FollowingSiblingState::NotStarted(node),
        }
    }

    fn open(node: &N) -> Result<Option<N::Children>, Error> {
        if node.kind() == NodeKind::Attribute {
            return Ok(None);
        }
        let Some(parent) = node.parent() else {
            return Ok(None);
        };
        let mut cursor = parent.child_cursor();
        skip_through(&mut cursor, node)?;
        Ok(Some(cursor))
    }
}

impl<N: XdmNode> Iterator for FollowingSiblingAxis<N> {
    type Item = Result<N, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if let FollowingSiblingState::NotStarted(node) = &self.state {
            match Self::open(node) {
                Ok(Some(cursor)) => self.state = FollowingSiblingState::Streaming(cursor),
                Ok(None) => self.state = FollowingSiblingState::Done,
                Err(e) => {
                    self.state = FollowingSiblingState::Done;
                    return Some(Err(e));
                }
            }
        }
        let FollowingSiblingState::Streaming(cursor) = &mut self.state else {
            return None;
        };
        match cursor.next() {
            Some(Ok(n)) => Some(Ok(n)),
            other => {
                self.state = FollowingSiblingState::Done;
                other
            }
        }
    }
}

impl<N: XdmNode> FusedIterator for FollowingSiblingAxis<N> {}

enum PrecedingSiblingState<N> {
    NotStarted(N),
    // siblings in document order, handed out from the back
    Replaying(Vec<N>),
    Done,
}

/// `preceding-sibling`, nearest first.
///
/// The child cursor only runs forward, so the siblings before the context node
/// are buffered and replayed back to front.
pub struct PrecedingSiblingAxis<N> {
    state: PrecedingSiblingState<N>,
}

impl<N: XdmNode> PrecedingSiblingAxis<N> {
    pub(crate) fn new(node: N) -> Self {
        Self {
            state: PrecedingSiblingState::NotStarted(node),
        }
    }

    fn buffer(node: &N) -> Result<Vec<N>, Error> {
        if node.kind() == NodeKind::Attribute {
            return Ok(Vec::new());
        }
        let Some(parent) = node.parent() else {
            return Ok(Vec::new());
        };
        let mut buf = Vec::new();
        for sib in parent.child_cursor() {
            let sib = sib?;
            if sib.is(node) {
                return Ok(buf);
            }
            buf.push(sib.finish());
        }
        Err(not_below_parent(node))
    }
}

impl<N: XdmNode> Iterator for PrecedingSiblingAxis<N> {
    type Item = Result<N, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if let PrecedingSiblingState::NotStarted(node) = &self.state {
            match Self::buffer(node) {
                Ok(buf) => self.state = PrecedingSiblingState::Replaying(buf),
                Err(e) => {
                    self.state = PrecedingSiblingState::Done;
                    return Some(Err(e));
                }
            }
        }
        let PrecedingSiblingState::Replaying(buf) = &mut self.state else {
            return None;
        };
        match buf.pop() {
            Some(n) => Some(Ok(n)),
            None => {
                self.state = PrecedingSiblingState::Done;
                None
            }
        }
    }
}

impl<N: XdmNode> FusedIterator for PrecedingSiblingAxis<N> {}
