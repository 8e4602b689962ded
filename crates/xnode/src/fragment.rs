//! Constructed (in-memory) nodes.
//!
//! Focus:
//! - Ergonomic builder for fragments, ids allocated in document order
//! - Ownership flows top-down: a node's child list owns its children, the
//!   parent link is a `Weak` set exactly once
//! - Thread-safe (`Arc` + `RwLock`) so built trees can be traversed in parallel
//!
//! Example:
//! ```
//! use xnode::fragment::{elem, text, attr};
//! use xnode::XdmNode;
//!
//! // <root id="r"><child>Hello</child><child world="yes"/></root>
//! let root = elem("root")
//!     .attr(attr("id", "r"))
//!     .child(elem("child").child(text("Hello")))
//!     .child(elem("child").attr(attr("world", "yes")))
//!     .build();
//!
//! assert_eq!(root.name().unwrap().local, "root");
//! assert_eq!(root.string_value(), "Hello");
//! ```
use core::cmp::Ordering;
use core::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, Weak};

use crate::error::{Error, ErrorCode};
use crate::model::{IdGen, Namespace, NodeId, NodeKind, QName, XdmNode, compare_in_tree};

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

pub(crate) struct Inner {
    id: NodeId,
    kind: NodeKind,
    name: Option<QName>,
    value: Option<String>,
    base_uri: Option<String>,
    namespaces: Vec<Namespace>,
    parent: OnceLock<Weak<Inner>>,
    attributes: RwLock<Vec<FNode>>,
    children: RwLock<Vec<FNode>>,
}

/// An `Arc`-backed fragment node. Clones are handles to the same node.
#[derive(Clone)]
pub struct FNode(Arc<Inner>);

impl PartialEq for FNode {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for FNode {}
impl std::hash::Hash for FNode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

impl fmt::Debug for FNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FNode")
            .field("id", &self.0.id)
            .field("kind", &self.0.kind)
            .field("name", &self.0.name)
            .field("value", &self.0.value)
            .finish()
    }
}

impl FNode {
    /// A parentless node with no attributes or children.
    pub fn new(ids: &IdGen, kind: NodeKind, name: Option<QName>, value: Option<String>) -> Self {
        FNode(Arc::new(Inner {
            id: ids.next_id(),
            kind,
            name,
            value,
            base_uri: None,
            namespaces: Vec::new(),
            parent: OnceLock::new(),
            attributes: RwLock::new(Vec::new()),
            children: RwLock::new(Vec::new()),
        }))
    }

    pub fn children(&self) -> Vec<FNode> {
        self.0
            .children
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn attributes(&self) -> Vec<FNode> {
        self.0
            .attributes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Appends `child` and links it to this node.
    ///
    /// Fails if this node cannot hold children, if `child` is an attribute or a
    /// document, if `child` already belongs to another parent, or if `child` is
    /// this node or one of its ancestors.
    pub fn append_child(&self, child: FNode) -> Result<(), Error> {
        if !matches!(self.0.kind, NodeKind::Element | NodeKind::Document) {
            return Err(Error::from_code(
                ErrorCode::XPTY0004,
                format!("{:?} nodes have no children", self.0.kind),
            ));
        }
        if matches!(child.0.kind, NodeKind::Attribute | NodeKind::Document) {
            return Err(Error::from_code(
                ErrorCode::XPTY0004,
                format!("{:?} node cannot be a child", child.0.kind),
            ));
        }
        child.set_parent(self)?;
        self.0
            .children
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(child);
        Ok(())
    }

    pub fn append_attribute(&self, attribute: FNode) -> Result<(), Error> {
        if self.0.kind != NodeKind::Element || attribute.0.kind != NodeKind::Attribute {
            return Err(Error::from_code(
                ErrorCode::XPTY0004,
                "attributes attach to elements only",
            ));
        }
        attribute.set_parent(self)?;
        self.0
            .attributes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(attribute);
        Ok(())
    }

    /// Resolve a namespace prefix by walking the ancestor chain (including self).
    pub fn lookup_namespace_uri(&self, prefix: Option<&str>) -> Option<String> {
        if prefix == Some("xml") {
            return Some(XML_NS.to_string());
        }
        let mut cur = Some(self.clone());
        while let Some(n) = cur {
            if let Some(ns) = n.0.namespaces.iter().find(|ns| ns.prefix.as_deref() == prefix) {
                return Some(ns.uri.clone());
            }
            cur = n.parent();
        }
        None
    }

    fn root_address(&self) -> usize {
        Arc::as_ptr(&self.root().0) as usize
    }
}

/// Child or attribute cursor over a fragment node. Reads the owner's list one
/// position at a time, so opening it is O(1).
#[derive(Debug, Clone)]
pub struct FragmentCursor {
    owner: FNode,
    pos: usize,
    attributes: bool,
}

impl Iterator for FragmentCursor {
    type Item = Result<FNode, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let list = if self.attributes {
            &self.owner.0.attributes
        } else {
            &self.owner.0.children
        };
        let next = list
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(self.pos)
            .cloned()?;
        self.pos += 1;
        Some(Ok(next))
    }
}

impl XdmNode for FNode {
    type Children = FragmentCursor;
    type Attributes = FragmentCursor;

    fn kind(&self) -> NodeKind {
        self.0.kind
    }
    fn id(&self) -> NodeId {
        self.0.id
    }
    fn name(&self) -> Option<QName> {
        self.0.name.clone()
    }
    fn namespaces(&self) -> Vec<Namespace> {
        self.0.namespaces.clone()
    }
    fn base_uri(&self) -> Option<String> {
        let mut cur = Some(self.clone());
        while let Some(n) = cur {
            if let Some(base) = &n.0.base_uri {
                return Some(base.clone());
            }
            cur = n.parent();
        }
        None
    }
    fn string_value(&self) -> String {
        match self.0.kind {
            NodeKind::Element | NodeKind::Document => {
                fn collect(n: &FNode, out: &mut String) {
                    for c in n.children() {
                        match c.0.kind {
                            NodeKind::Text => out.push_str(c.0.value.as_deref().unwrap_or_default()),
                            NodeKind::Element => collect(&c, out),
                            _ => {}
                        }
                    }
                }
                let mut out = String::new();
                collect(self, &mut out);
                out
            }
            _ => self.0.value.clone().unwrap_or_default(),
        }
    }
    fn parent(&self) -> Option<Self> {
        self.0.parent.get().and_then(Weak::upgrade).map(FNode)
    }
    fn child_cursor(&self) -> FragmentCursor {
        FragmentCursor {
            owner: self.clone(),
            pos: 0,
            attributes: false,
        }
    }
    fn attribute_cursor(&self) -> FragmentCursor {
        FragmentCursor {
            owner: self.clone(),
            pos: 0,
            attributes: true,
        }
    }
    fn is(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
    fn diff(&self, other: &Self) -> Result<Ordering, Error> {
        match compare_in_tree(self, other)? {
            Some(ord) => Ok(ord),
            None => Ok(self.root_address().cmp(&other.root_address())),
        }
    }
    fn set_parent(&self, parent: &Self) -> Result<(), Error> {
        // parent chains stay acyclic, so this walk ends
        let mut cur = Some(parent.clone());
        while let Some(n) = cur {
            if n.is(self) {
                tracing::debug!(node = ?self, parent = ?parent, "rejected parent cycle");
                return Err(Error::from_code(
                    ErrorCode::ParentCycle,
                    format!("node {} cannot be placed below itself", self.0.id.0),
                ));
            }
            cur = n.parent();
        }
        match self.0.parent.set(Arc::downgrade(&parent.0)) {
            Ok(()) => Ok(()),
            Err(weak) => {
                let same = self.0.parent.get().is_some_and(|cur| Weak::ptr_eq(cur, &weak));
                if same {
                    Ok(())
                } else {
                    tracing::debug!(node = ?self, "rejected second parent assignment");
                    Err(Error::from_code(
                        ErrorCode::ParentReassigned,
                        format!("node {} already has a different parent", self.0.id.0),
                    ))
                }
            }
        }
    }
}

/// Declarative description of a fragment; [`NodeBuilder::build`] turns it into
/// linked [`FNode`]s.
#[derive(Debug, Clone)]
pub struct NodeBuilder {
    kind: NodeKind,
    name: Option<QName>,
    value: Option<String>,
    base_uri: Option<String>,
    namespaces: Vec<Namespace>,
    attributes: Vec<NodeBuilder>,
    children: Vec<NodeBuilder>,
}

impl NodeBuilder {
    fn new(kind: NodeKind, name: Option<QName>, value: Option<String>) -> Self {
        Self {
            kind,
            name,
            value,
            base_uri: None,
            namespaces: Vec::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, attr: NodeBuilder) -> Self {
        debug_assert!(attr.kind == NodeKind::Attribute);
        self.attributes.push(attr);
        self
    }
    pub fn attrs<I: IntoIterator<Item = NodeBuilder>>(mut self, attrs: I) -> Self {
        for a in attrs {
            self = self.attr(a);
        }
        self
    }
    pub fn child(mut self, child: NodeBuilder) -> Self {
        debug_assert!(!matches!(child.kind, NodeKind::Attribute | NodeKind::Document));
        self.children.push(child);
        self
    }
    pub fn children<I: IntoIterator<Item = NodeBuilder>>(mut self, it: I) -> Self {
        for c in it {
            self = self.child(c);
        }
        self
    }
    pub fn namespace(mut self, ns: Namespace) -> Self {
        self.namespaces.push(ns);
        self
    }
    pub fn base_uri(mut self, uri: &str) -> Self {
        self.base_uri = Some(uri.to_string());
        self
    }

    /// Builds the fragment with a fresh id counter.
    pub fn build(self) -> FNode {
        self.build_with(&IdGen::new())
    }

    /// Builds the fragment drawing ids from `ids`, in document order.
    pub fn build_with(self, ids: &IdGen) -> FNode {
        self.build_node(ids, &[], None)
    }

    fn build_node(self, ids: &IdGen, scope: &[Namespace], parent: Option<Weak<Inner>>) -> FNode {
        let NodeBuilder {
            kind,
            name,
            value,
            base_uri,
            namespaces,
            attributes,
            children,
        } = self;
        let id = ids.next_id();
        let mut in_scope: Vec<Namespace> = scope.to_vec();
        in_scope.extend(namespaces.iter().cloned());
        let name = name.map(|q| resolve(q, kind, &in_scope));
        FNode(Arc::new_cyclic(|me: &Weak<Inner>| {
            let attributes = attributes
                .into_iter()
                .map(|a| a.build_node(ids, &in_scope, Some(me.clone())))
                .collect();
            let children = children
                .into_iter()
                .map(|c| c.build_node(ids, &in_scope, Some(me.clone())))
                .collect();
            let link = parent.map(OnceLock::from).unwrap_or_default();
            Inner {
                id,
                kind,
                name,
                value,
                base_uri,
                namespaces,
                parent: link,
                attributes: RwLock::new(attributes),
                children: RwLock::new(children),
            }
        }))
    }

    /// Describes an existing node (of any backend) and its subtree.
    pub fn from_node<N: XdmNode>(node: &N) -> Result<Self, Error> {
        let mut b = Self::describe(node)?;
        b.base_uri = node.base_uri();
        Ok(b)
    }

    fn describe<N: XdmNode>(node: &N) -> Result<Self, Error> {
        let kind = node.kind();
        let value = match kind {
            NodeKind::Element | NodeKind::Document => None,
            _ => Some(node.string_value()),
        };
        let mut b = NodeBuilder::new(kind, node.name(), value);
        b.namespaces = node.namespaces();
        for a in node.attribute_cursor() {
            b.attributes.push(Self::describe(&a?)?);
        }
        for c in node.child_cursor() {
            b.children.push(Self::describe(&c?)?);
        }
        Ok(b)
    }
}

fn resolve(mut q: QName, kind: NodeKind, scope: &[Namespace]) -> QName {
    if q.ns_uri.is_some() {
        return q;
    }
    match (&q.prefix, kind) {
        (Some(p), _) if p == "xml" => q.ns_uri = Some(XML_NS.to_string()),
        (Some(p), NodeKind::Element | NodeKind::Attribute) => {
            q.ns_uri = scope
                .iter()
                .rev()
                .find(|ns| ns.prefix.as_deref() == Some(p.as_str()))
                .map(|ns| ns.uri.clone());
        }
        // default namespace applies to unprefixed elements only
        (None, NodeKind::Element) => {
            q.ns_uri = scope
                .iter()
                .rev()
                .find(|ns| ns.prefix.is_none())
                .map(|ns| ns.uri.clone())
                .filter(|u| !u.is_empty());
        }
        _ => {}
    }
    q
}

pub(crate) fn deep_copy<N: XdmNode>(node: &N) -> Result<FNode, Error> {
    Ok(NodeBuilder::from_node(node)?.build())
}

pub fn doc() -> NodeBuilder {
    NodeBuilder::new(NodeKind::Document, None, None)
}
pub fn elem(name: &str) -> NodeBuilder {
    NodeBuilder::new(NodeKind::Element, Some(QName::parse(name)), None)
}
pub fn attr(name: &str, value: &str) -> NodeBuilder {
    NodeBuilder::new(NodeKind::Attribute, Some(QName::parse(name)), Some(value.to_string()))
}
pub fn text(value: &str) -> NodeBuilder {
    NodeBuilder::new(NodeKind::Text, None, Some(value.to_string()))
}
pub fn comment(value: &str) -> NodeBuilder {
    NodeBuilder::new(NodeKind::Comment, None, Some(value.to_string()))
}
pub fn pi(target: &str, data: &str) -> NodeBuilder {
    NodeBuilder::new(
        NodeKind::ProcessingInstruction,
        Some(QName::parse(target)),
        Some(data.to_string()),
    )
}
pub fn ns(prefix: &str, uri: &str) -> Namespace {
    Namespace::new(Some(prefix), uri)
}
