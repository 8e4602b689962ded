//! A node from either backend, so one evaluation can mix constructed and
//! stored nodes.
use core::cmp::Ordering;

use crate::error::{Error, ErrorCode};
use crate::fragment::{FNode, FragmentCursor};
use crate::model::{Namespace, NodeId, NodeKind, QName, XdmNode};
use crate::store::{DbCursor, DbNode};

#[derive(Debug, Clone)]
pub enum AnyNode {
    Fragment(FNode),
    Stored(DbNode),
}

impl From<FNode> for AnyNode {
    fn from(n: FNode) -> Self {
        AnyNode::Fragment(n)
    }
}

impl From<DbNode> for AnyNode {
    fn from(n: DbNode) -> Self {
        AnyNode::Stored(n)
    }
}

pub enum AnyCursor {
    Fragment(FragmentCursor),
    Stored(DbCursor),
}

impl Iterator for AnyCursor {
    type Item = Result<AnyNode, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            AnyCursor::Fragment(c) => c.next().map(|r| r.map(AnyNode::Fragment)),
            AnyCursor::Stored(c) => c.next().map(|r| r.map(AnyNode::Stored)),
        }
    }
}

impl XdmNode for AnyNode {
    type Children = AnyCursor;
    type Attributes = AnyCursor;

    fn kind(&self) -> NodeKind {
        match self {
            AnyNode::Fragment(n) => n.kind(),
            AnyNode::Stored(n) => n.kind(),
        }
    }
    fn id(&self) -> NodeId {
        match self {
            AnyNode::Fragment(n) => n.id(),
            AnyNode::Stored(n) => n.id(),
        }
    }
    fn name(&self) -> Option<QName> {
        match self {
            AnyNode::Fragment(n) => n.name(),
            AnyNode::Stored(n) => n.name(),
        }
    }
    fn namespaces(&self) -> Vec<Namespace> {
        match self {
            AnyNode::Fragment(n) => n.namespaces(),
            AnyNode::Stored(n) => n.namespaces(),
        }
    }
    fn base_uri(&self) -> Option<String> {
        match self {
            AnyNode::Fragment(n) => n.base_uri(),
            AnyNode::Stored(n) => n.base_uri(),
        }
    }
    fn string_value(&self) -> String {
        match self {
            AnyNode::Fragment(n) => n.string_value(),
            AnyNode::Stored(n) => n.string_value(),
        }
    }
    fn parent(&self) -> Option<Self> {
        match self {
            AnyNode::Fragment(n) => n.parent().map(AnyNode::Fragment),
            AnyNode::Stored(n) => n.parent().map(AnyNode::Stored),
        }
    }
    fn child_cursor(&self) -> AnyCursor {
        match self {
            AnyNode::Fragment(n) => AnyCursor::Fragment(n.child_cursor()),
            AnyNode::Stored(n) => AnyCursor::Stored(n.child_cursor()),
        }
    }
    fn attribute_cursor(&self) -> AnyCursor {
        match self {
            AnyNode::Fragment(n) => AnyCursor::Fragment(n.attribute_cursor()),
            AnyNode::Stored(n) => AnyCursor::Stored(n.attribute_cursor()),
        }
    }
    fn is(&self, other: &Self) -> bool {
        match (self, other) {
            (AnyNode::Fragment(a), AnyNode::Fragment(b)) => a.is(b),
            (AnyNode::Stored(a), AnyNode::Stored(b)) => a.is(b),
            _ => false,
        }
    }
    fn diff(&self, other: &Self) -> Result<Ordering, Error> {
        match (self, other) {
            (AnyNode::Fragment(a), AnyNode::Fragment(b)) => a.diff(b),
            (AnyNode::Stored(a), AnyNode::Stored(b)) => a.diff(b),
            // stored documents sort before constructed fragments
            (AnyNode::Stored(_), AnyNode::Fragment(_)) => Ok(Ordering::Less),
            (AnyNode::Fragment(_), AnyNode::Stored(_)) => Ok(Ordering::Greater),
        }
    }
    fn set_parent(&self, parent: &Self) -> Result<(), Error> {
        match (self, parent) {
            (AnyNode::Fragment(a), AnyNode::Fragment(b)) => a.set_parent(b),
            (AnyNode::Stored(a), AnyNode::Stored(b)) => a.set_parent(b),
            _ => Err(Error::from_code(
                ErrorCode::ParentReassigned,
                "parent must come from the same backend",
            )),
        }
    }
    fn finish(&self) -> Self {
        match self {
            AnyNode::Fragment(n) => AnyNode::Fragment(n.finish()),
            AnyNode::Stored(n) => AnyNode::Stored(n.finish()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axes::Axes;
    use crate::fragment::{elem, text};
    use crate::store::{StoreOptions, Table};

    #[test]
    fn mixed_backends_order_stored_first() {
        let frag = elem("f").child(text("x")).build();
        let table = Table::shred(&frag, StoreOptions::new("t")).unwrap();
        let stored = AnyNode::from(table.root().unwrap());
        let constructed = AnyNode::from(frag);
        assert_eq!(stored.diff(&constructed).unwrap(), Ordering::Less);
        assert_eq!(constructed.diff(&stored).unwrap(), Ordering::Greater);
        assert!(!stored.is(&constructed));
        let kids: Vec<_> = constructed.child().collect::<Result<_, _>>().unwrap();
        assert_eq!(kids.len(), 1);
        assert_eq!(kids[0].string_value(), "x");
    }
}
