//! Lazy axis iterators.
//!
//! Every axis is an explicit iterator struct over `Result<N, Error>` with its
//! own state enum. Iterators are fused: once they return `None`, or after a
//! terminating `Err`, every further call returns `None`. Creating an iterator
//! never touches the backend; cursors are opened on the first pull.

mod buffered;
mod descendant;
mod sibling;
mod simple;

use core::fmt;
use core::iter::FusedIterator;

use crate::error::{Error, ErrorCode};
use crate::model::XdmNode;

pub use buffered::{FollowingAxis, PrecedingAxis};
pub use descendant::DescendantAxis;
pub use sibling::{FollowingSiblingAxis, PrecedingSiblingAxis};
pub use simple::{AncestorAxis, AttributeAxis, ChildAxis, ParentAxis, SelfAxis};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    SelfAxis,
    Parent,
    Ancestor,
    AncestorOrSelf,
    Child,
    Descendant,
    DescendantOrSelf,
    Attribute,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
}

impl Axis {
    pub const ALL: [Axis; 12] = [
        Axis::SelfAxis,
        Axis::Parent,
        Axis::Ancestor,
        Axis::AncestorOrSelf,
        Axis::Child,
        Axis::Descendant,
        Axis::DescendantOrSelf,
        Axis::Attribute,
        Axis::FollowingSibling,
        Axis::PrecedingSibling,
        Axis::Following,
        Axis::Preceding,
    ];

    /// XPath axis name, e.g. `preceding-sibling`.
    pub fn name(self) -> &'static str {
        match self {
            Axis::SelfAxis => "self",
            Axis::Parent => "parent",
            Axis::Ancestor => "ancestor",
            Axis::AncestorOrSelf => "ancestor-or-self",
            Axis::Child => "child",
            Axis::Descendant => "descendant",
            Axis::DescendantOrSelf => "descendant-or-self",
            Axis::Attribute => "attribute",
            Axis::FollowingSibling => "following-sibling",
            Axis::PrecedingSibling => "preceding-sibling",
            Axis::Following => "following",
            Axis::Preceding => "preceding",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    /// Axes that produce nodes nearest-first, against document order.
    pub fn is_reverse(self) -> bool {
        matches!(
            self,
            Axis::Parent
                | Axis::Ancestor
                | Axis::AncestorOrSelf
                | Axis::PrecedingSibling
                | Axis::Preceding
        )
    }

    /// Axes that materialize part of the tree before their first result.
    pub fn is_buffering(self) -> bool {
        matches!(
            self,
            Axis::PrecedingSibling | Axis::Following | Axis::Preceding
        )
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One iterator factory per axis, available on every [`XdmNode`].
pub trait Axes: XdmNode {
    fn self_axis(&self) -> SelfAxis<Self> {
        SelfAxis::new(self.clone())
    }
    fn parent_axis(&self) -> ParentAxis<Self> {
        ParentAxis::new(self.clone())
    }
    fn ancestor(&self) -> AncestorAxis<Self> {
        AncestorAxis::new(self.clone(), false)
    }
    fn ancestor_or_self(&self) -> AncestorAxis<Self> {
        AncestorAxis::new(self.clone(), true)
    }
    fn child(&self) -> ChildAxis<Self> {
        ChildAxis::new(self.clone())
    }
    fn descendant(&self) -> DescendantAxis<Self> {
        DescendantAxis::new(self.clone(), false)
    }
    fn descendant_or_self(&self) -> DescendantAxis<Self> {
        DescendantAxis::new(self.clone(), true)
    }
    fn attribute(&self) -> AttributeAxis<Self> {
        AttributeAxis::new(self.clone())
    }
    fn following_sibling(&self) -> FollowingSiblingAxis<Self> {
        FollowingSiblingAxis::new(self.clone())
    }
    fn preceding_sibling(&self) -> PrecedingSiblingAxis<Self> {
        PrecedingSiblingAxis::new(self.clone())
    }
    fn following(&self) -> FollowingAxis<Self> {
        FollowingAxis::new(self.clone())
    }
    fn preceding(&self) -> PrecedingAxis<Self> {
        PrecedingAxis::new(self.clone())
    }

    fn axis(&self, axis: Axis) -> AxisIter<Self> {
        match axis {
            Axis::SelfAxis => AxisIter::SelfAxis(self.self_axis()),
            Axis::Parent => AxisIter::Parent(self.parent_axis()),
            Axis::Ancestor => AxisIter::Ancestor(self.ancestor()),
            Axis::AncestorOrSelf => AxisIter::Ancestor(self.ancestor_or_self()),
            Axis::Child => AxisIter::Child(self.child()),
            Axis::Descendant => AxisIter::Descendant(self.descendant()),
            Axis::DescendantOrSelf => AxisIter::Descendant(self.descendant_or_self()),
            Axis::Attribute => AxisIter::Attribute(self.attribute()),
            Axis::FollowingSibling => AxisIter::FollowingSibling(self.following_sibling()),
            Axis::PrecedingSibling => AxisIter::PrecedingSibling(self.preceding_sibling()),
            Axis::Following => AxisIter::Following(self.following()),
            Axis::Preceding => AxisIter::Preceding(self.preceding()),
        }
    }
}

impl<N: XdmNode> Axes for N {}

/// Any axis iterator behind one type.
pub enum AxisIter<N: XdmNode> {
    SelfAxis(SelfAxis<N>),
    Parent(ParentAxis<N>),
    Ancestor(AncestorAxis<N>),
    Child(ChildAxis<N>),
    Descendant(DescendantAxis<N>),
    Attribute(AttributeAxis<N>),
    FollowingSibling(FollowingSiblingAxis<N>),
    PrecedingSibling(PrecedingSiblingAxis<N>),
    Following(FollowingAxis<N>),
    Preceding(PrecedingAxis<N>),
}

impl<N: XdmNode> Iterator for AxisIter<N> {
    type Item = Result<N, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            AxisIter::SelfAxis(it) => it.next(),
            AxisIter::Parent(it) => it.next(),
            AxisIter::Ancestor(it) => it.next(),
            AxisIter::Child(it) => it.next(),
            AxisIter::Descendant(it) => it.next(),
            AxisIter::Attribute(it) => it.next(),
            AxisIter::FollowingSibling(it) => it.next(),
            AxisIter::PrecedingSibling(it) => it.next(),
            AxisIter::Following(it) => it.next(),
            AxisIter::Preceding(it) => it.next(),
        }
    }
}

impl<N: XdmNode> FusedIterator for AxisIter<N> {}

/// A backend cursor that is opened on first use and dropped once exhausted
/// or failed.
pub(crate) enum LazyCursor<N, C> {
    NotStarted(N),
    Open(C),
    Done,
}

impl<N, C: Iterator<Item = Result<N, Error>>> LazyCursor<N, C> {
    pub(crate) fn pull(&mut self, open: impl FnOnce(&N) -> C) -> Option<Result<N, Error>> {
        if let LazyCursor::NotStarted(node) = self {
            *self = LazyCursor::Open(open(node));
        }
        let LazyCursor::Open(cursor) = self else {
            return None;
        };
        match cursor.next() {
            Some(Ok(n)) => Some(Ok(n)),
            Some(Err(e)) => {
                *self = LazyCursor::Done;
                Some(Err(e))
            }
            None => {
                *self = LazyCursor::Done;
                None
            }
        }
    }
}

/// Advances `cursor` past `target`. Fails if the cursor never yields it.
pub(crate) fn skip_through<N: XdmNode>(
    cursor: &mut impl Iterator<Item = Result<N, Error>>,
    target: &N,
) -> Result<(), Error> {
    for sib in cursor {
        if sib?.is(target) {
            return Ok(());
        }
    }
    Err(not_below_parent(target))
}

pub(crate) fn not_below_parent<N: XdmNode>(node: &N) -> Error {
    tracing::warn!(?node, "node missing from its parent's child cursor");
    Error::from_code(
        ErrorCode::TreeInconsistent,
        format!("node {} is not among its parent's children", node.id().0),
    )
}
