use crate::model::{NodeKind, XdmNode};

/// Kind-tagged view of a node, one variant per [`NodeKind`].
///
/// Lets callers outside the engine match on node kinds exhaustively instead
/// of branching on `kind()` themselves.
#[derive(Debug, Clone)]
pub enum NodeView<N> {
    Document(N),
    Element(N),
    Text(N),
    Attribute(N),
    Comment(N),
    ProcessingInstruction(N),
}

impl<N: XdmNode> NodeView<N> {
    pub fn of(node: N) -> Self {
        match node.kind() {
            NodeKind::Document => NodeView::Document(node),
            NodeKind::Element => NodeView::Element(node),
            NodeKind::Text => NodeView::Text(node),
            NodeKind::Attribute => NodeView::Attribute(node),
            NodeKind::Comment => NodeView::Comment(node),
            NodeKind::ProcessingInstruction => NodeView::ProcessingInstruction(node),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            NodeView::Document(_) => NodeKind::Document,
            NodeView::Element(_) => NodeKind::Element,
            NodeView::Text(_) => NodeKind::Text,
            NodeView::Attribute(_) => NodeKind::Attribute,
            NodeView::Comment(_) => NodeKind::Comment,
            NodeView::ProcessingInstruction(_) => NodeKind::ProcessingInstruction,
        }
    }

    pub fn node(&self) -> &N {
        match self {
            NodeView::Document(n)
            | NodeView::Element(n)
            | NodeView::Text(n)
            | NodeView::Attribute(n)
            | NodeView::Comment(n)
            | NodeView::ProcessingInstruction(n) => n,
        }
    }

    pub fn into_node(self) -> N {
        match self {
            NodeView::Document(n)
            | NodeView::Element(n)
            | NodeView::Text(n)
            | NodeView::Attribute(n)
            | NodeView::Comment(n)
            | NodeView::ProcessingInstruction(n) => n,
        }
    }
}
