use core::cmp::Ordering;
use core::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use smallvec::SmallVec;

use crate::error::{Error, ErrorCode};
use crate::fragment::{self, FNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Element,
    Text,
    Attribute,
    Comment,
    ProcessingInstruction,
}

impl NodeKind {
    /// Storage kind code of this node kind.
    pub fn code(self) -> u8 {
        match self {
            NodeKind::Document => 0,
            NodeKind::Element => 1,
            NodeKind::Text => 2,
            NodeKind::Attribute => 3,
            NodeKind::Comment => 4,
            NodeKind::ProcessingInstruction => 5,
        }
    }

    /// Inverse of [`NodeKind::code`]. Codes without a kind are rejected.
    pub fn from_code(code: u8) -> Result<Self, Error> {
        Ok(match code {
            0 => NodeKind::Document,
            1 => NodeKind::Element,
            2 => NodeKind::Text,
            3 => NodeKind::Attribute,
            4 => NodeKind::Comment,
            5 => NodeKind::ProcessingInstruction,
            other => {
                return Err(Error::from_code(
                    ErrorCode::UnknownKind,
                    format!("no node kind for storage code {other}"),
                ));
            }
        })
    }

    /// Whether nodes of this kind carry a name.
    pub fn is_named(self) -> bool {
        matches!(
            self,
            NodeKind::Element | NodeKind::Attribute | NodeKind::ProcessingInstruction
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub prefix: Option<String>,
    pub local: String,
    pub ns_uri: Option<String>,
}

impl QName {
    /// Splits a lexical `prefix:local` name; the namespace URI stays unresolved.
    pub fn parse(lexical: &str) -> Self {
        match lexical.split_once(':') {
            Some((prefix, local)) if !prefix.is_empty() && !local.is_empty() => QName {
                prefix: Some(prefix.to_string()),
                local: local.to_string(),
                ns_uri: None,
            },
            _ => QName {
                prefix: None,
                local: lexical.to_string(),
                ns_uri: None,
            },
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(p) => write!(f, "{p}:{}", self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// A namespace declaration (`xmlns` / `xmlns:prefix`) made on an element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    pub prefix: Option<String>,
    pub uri: String,
}

impl Namespace {
    pub fn new(prefix: Option<&str>, uri: &str) -> Self {
        Self {
            prefix: prefix.filter(|p| !p.is_empty()).map(str::to_string),
            uri: uri.to_string(),
        }
    }
}

/// Construction-time node identifier.
///
/// Ids are unique only among nodes drawn from the same [`IdGen`]. They follow
/// construction order, which for stored nodes need not match document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u64);

/// Per-document id counter. Clones share the same sequence.
#[derive(Debug, Clone, Default)]
pub struct IdGen(Arc<AtomicU64>);

impl IdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> NodeId {
        NodeId(self.0.fetch_add(1, AtomicOrdering::Relaxed))
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> u64 {
        self.0.load(AtomicOrdering::Relaxed)
    }
}

/// The backend contract every navigable node implements.
///
/// Backends supply raw access (kind, name, value, forward-only child and
/// attribute cursors, parent lookup, identity and order); the axis iterators in
/// [`crate::axes`] are written exclusively against this trait.
pub trait XdmNode: Clone + fmt::Debug + Send + Sync + 'static {
    /// Forward-only cursor over the children in document order.
    type Children: Iterator<Item = Result<Self, Error>> + Send;
    /// Cursor over the attributes in declaration order.
    type Attributes: Iterator<Item = Result<Self, Error>> + Send;

    fn kind(&self) -> NodeKind;
    fn id(&self) -> NodeId;
    fn name(&self) -> Option<QName>;
    fn namespaces(&self) -> Vec<Namespace> {
        Vec::new()
    }
    fn base_uri(&self) -> Option<String> {
        None
    }
    /// - text, attribute, comment, processing instruction: own content
    /// - element, document: concatenated descendant text
    fn string_value(&self) -> String;

    fn parent(&self) -> Option<Self>;
    fn child_cursor(&self) -> Self::Children;
    fn attribute_cursor(&self) -> Self::Attributes;

    /// Same underlying node. Never a value comparison.
    fn is(&self, other: &Self) -> bool;

    /// Total order over nodes. `Equal` iff [`XdmNode::is`]; document order
    /// within one tree; a stable but arbitrary order across unrelated trees.
    fn diff(&self, other: &Self) -> Result<Ordering, Error>;

    /// Sets the parent back-reference once. A second call with a different
    /// parent fails with [`ErrorCode::ParentReassigned`]; a parent that is this
    /// node or one of its descendants fails with [`ErrorCode::ParentCycle`].
    fn set_parent(&self, parent: &Self) -> Result<(), Error>;

    /// A handle that stays valid after the producing iterator advances.
    fn finish(&self) -> Self {
        self.clone()
    }

    /// Deep copy into a fresh fragment with new ids and no parent.
    fn copy(&self) -> Result<FNode, Error> {
        fragment::deep_copy(self)
    }

    fn root(&self) -> Self {
        let mut cur = self.clone();
        while let Some(p) = cur.parent() {
            cur = p;
        }
        cur
    }
}

fn path_to_root<N: XdmNode>(node: &N) -> SmallVec<[N; 16]> {
    let mut path: SmallVec<[N; 16]> = SmallVec::new();
    let mut cur = Some(node.clone());
    while let Some(n) = cur {
        cur = n.parent();
        path.push(n);
    }
    path.reverse();
    path
}

/// Document order of two nodes by ancestry and sibling position.
///
/// - an ancestor precedes its descendants
/// - attributes of an element precede its children
/// - siblings keep the order of the backend cursors
///
/// Returns `None` when the nodes do not share a root; backends resolve that
/// case themselves.
pub fn compare_in_tree<N: XdmNode>(a: &N, b: &N) -> Result<Option<Ordering>, Error> {
    if a.is(b) {
        return Ok(Some(Ordering::Equal));
    }
    let pa = path_to_root(a);
    let pb = path_to_root(b);
    if !pa[0].is(&pb[0]) {
        return Ok(None);
    }
    let len = pa.len().min(pb.len());
    let mut i = 1;
    while i < len && pa[i].is(&pb[i]) {
        i += 1;
    }
    if i == len {
        // one path is a prefix of the other
        return Ok(Some(pa.len().cmp(&pb.len())));
    }
    sibling_order(&pa[i - 1], &pa[i], &pb[i]).map(Some)
}

fn sibling_order<N: XdmNode>(parent: &N, a: &N, b: &N) -> Result<Ordering, Error> {
    for sib in parent.attribute_cursor().chain(parent.child_cursor()) {
        let sib = sib?;
        if sib.is(a) {
            return Ok(Ordering::Less);
        }
        if sib.is(b) {
            return Ok(Ordering::Greater);
        }
    }
    tracing::warn!(?parent, "nodes not found below their common parent");
    Err(Error::from_code(
        ErrorCode::TreeInconsistent,
        "node is not reachable from its parent",
    ))
}
