//! Table-backed nodes.
//!
//! A [`Table`] holds a document as a flat sequence of rows in document (pre)
//! order. Each row records its kind, the distance to its parent row, the size
//! of its subtree and the number of attribute rows that directly follow it.
//! Navigation is cursor based: the children of row `pre` start at
//! `pre + 1 + attrs` and each child is skipped by its subtree size, while the
//! parent is found in O(1) at `pre - dist`.
//!
//! Kind codes and parent distances are checked when rows are loaded: only row
//! 0 is a root, every other row points at an earlier one. Subtree sizes,
//! attribute counts and whether a distance names the right ancestor are only
//! checked when a cursor reads them, so such damage fails at the first
//! traversal that touches the damaged rows.
use core::cmp::Ordering;
use core::fmt;
use std::sync::Arc;

use string_cache::DefaultAtom;

use crate::error::{Error, ErrorCode};
use crate::model::{IdGen, Namespace, NodeId, NodeKind, QName, XdmNode};

#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    /// Table name; doubles as base URI when none is configured.
    pub name: String,
    pub base_uri: Option<String>,
    /// Drop whitespace-only text nodes while shredding.
    pub chop_whitespace: bool,
}

impl StoreOptions {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
    pub fn with_base_uri(mut self, uri: &str) -> Self {
        self.base_uri = Some(uri.to_string());
        self
    }
    pub fn with_chop_whitespace(mut self, chop: bool) -> Self {
        self.chop_whitespace = chop;
        self
    }
}

/// One row as loaded into a table.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Storage kind code, see [`NodeKind::code`].
    pub kind: u8,
    /// Distance to the parent row; 0 for the root.
    pub dist: u32,
    /// Rows in this subtree, including this row and its attributes.
    pub size: u32,
    /// Attribute rows directly following this row.
    pub attrs: u32,
    pub name: Option<QName>,
    pub value: Option<String>,
    pub namespaces: Vec<Namespace>,
}

#[derive(Debug, Clone)]
struct Name {
    prefix: Option<DefaultAtom>,
    local: DefaultAtom,
    uri: Option<DefaultAtom>,
}

impl Name {
    fn intern(q: &QName) -> Self {
        Name {
            prefix: q.prefix.as_deref().map(DefaultAtom::from),
            local: DefaultAtom::from(q.local.as_str()),
            uri: q.ns_uri.as_deref().map(DefaultAtom::from),
        }
    }

    fn qname(&self) -> QName {
        QName {
            prefix: self.prefix.as_ref().map(ToString::to_string),
            local: self.local.to_string(),
            ns_uri: self.uri.as_ref().map(ToString::to_string),
        }
    }
}

#[derive(Debug)]
struct Record {
    id: NodeId,
    kind: NodeKind,
    dist: u32,
    size: u32,
    attrs: u32,
    name: Option<Name>,
    value: Option<Box<str>>,
    namespaces: Vec<Namespace>,
}

pub struct Table {
    options: StoreOptions,
    records: Vec<Record>,
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.options.name)
            .field("rows", &self.records.len())
            .finish()
    }
}

impl Table {
    /// Loads pre-built rows. Ids are drawn from a fresh counter in row order.
    pub fn from_rows(options: StoreOptions, rows: Vec<Row>) -> Result<Arc<Table>, Error> {
        let ids = IdGen::new();
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(pre, row)| {
                check_dist(&options.name, pre, row.dist)?;
                Ok(Record {
                    id: ids.next_id(),
                    kind: NodeKind::from_code(row.kind)?,
                    dist: row.dist,
                    size: row.size,
                    attrs: row.attrs,
                    name: row.name.as_ref().map(Name::intern),
                    value: row.value.map(String::into_boxed_str),
                    namespaces: row.namespaces,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;
        tracing::debug!(name = %options.name, rows = records.len(), "table loaded");
        Ok(Arc::new(Table { options, records }))
    }

    /// Flattens `node` and its subtree into a new table.
    pub fn shred<N: XdmNode>(node: &N, options: StoreOptions) -> Result<Arc<Table>, Error> {
        let mut rows = Vec::new();
        shred_into(node, None, &mut rows, options.chop_whitespace)?;
        Self::from_rows(options, rows)
    }

    pub fn name(&self) -> &str {
        &self.options.name
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Node handle for row `pre`.
    pub fn node(self: &Arc<Self>, pre: usize) -> Result<DbNode, Error> {
        if pre >= self.records.len() {
            return Err(Error::from_code(
                ErrorCode::InvalidNode,
                format!("row {pre} outside table '{}' ({} rows)", self.options.name, self.records.len()),
            ));
        }
        Ok(DbNode {
            table: Arc::clone(self),
            pre,
        })
    }

    pub fn root(self: &Arc<Self>) -> Result<DbNode, Error> {
        self.node(0)
    }

    fn address(&self) -> usize {
        core::ptr::from_ref(self) as usize
    }
}

fn check_dist(table: &str, pre: usize, dist: u32) -> Result<(), Error> {
    let dist = dist as usize;
    let valid = if pre == 0 { dist == 0 } else { (1..=pre).contains(&dist) };
    if valid {
        return Ok(());
    }
    tracing::warn!(table, row = pre, dist, "parent distance outside the table");
    Err(Error::from_code(
        ErrorCode::CorruptStore,
        format!("table '{table}': row {pre} has parent distance {dist}"),
    ))
}

fn to_u32(n: usize) -> Result<u32, Error> {
    u32::try_from(n).map_err(|_| Error::from_code(ErrorCode::CorruptStore, "table exceeds u32 rows"))
}

fn shred_into<N: XdmNode>(
    node: &N,
    parent: Option<usize>,
    rows: &mut Vec<Row>,
    chop: bool,
) -> Result<(), Error> {
    let pre = rows.len();
    let kind = node.kind();
    let value = match kind {
        NodeKind::Element | NodeKind::Document => None,
        _ => Some(node.string_value()),
    };
    rows.push(Row {
        kind: kind.code(),
        dist: to_u32(parent.map_or(0, |p| pre - p))?,
        size: 1,
        attrs: 0,
        name: node.name(),
        value,
        namespaces: node.namespaces(),
    });
    let mut attrs = 0usize;
    for a in node.attribute_cursor() {
        let a = a?;
        let at = rows.len();
        rows.push(Row {
            kind: NodeKind::Attribute.code(),
            dist: to_u32(at - pre)?,
            size: 1,
            attrs: 0,
            name: a.name(),
            value: Some(a.string_value()),
            namespaces: Vec::new(),
        });
        attrs += 1;
    }
    for c in node.child_cursor() {
        let c = c?;
        if chop && c.kind() == NodeKind::Text && c.string_value().trim().is_empty() {
            continue;
        }
        shred_into(&c, Some(pre), rows, chop)?;
    }
    let size = to_u32(rows.len() - pre)?;
    let attrs = to_u32(attrs)?;
    let row = &mut rows[pre];
    row.size = size;
    row.attrs = attrs;
    Ok(())
}

/// A handle on one table row.
#[derive(Clone)]
pub struct DbNode {
    table: Arc<Table>,
    pre: usize,
}

impl fmt::Debug for DbNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbNode")
            .field("table", &self.table.options.name)
            .field("pre", &self.pre)
            .finish()
    }
}

impl PartialEq for DbNode {
    fn eq(&self, other: &Self) -> bool {
        self.is(other)
    }
}
impl Eq for DbNode {}

impl DbNode {
    pub fn pre(&self) -> usize {
        self.pre
    }

    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    fn record(&self) -> &Record {
        // `pre` is checked when the handle is created and tables are immutable
        &self.table.records[self.pre]
    }

    fn cursor(&self, attributes: bool) -> DbCursor {
        let rec = self.record();
        let first = self.pre + 1;
        let (next, end) = if attributes {
            (first, first + rec.attrs as usize)
        } else {
            (first + rec.attrs as usize, self.pre + rec.size as usize)
        };
        DbCursor {
            table: Arc::clone(&self.table),
            owner: self.pre,
            next,
            end,
            attributes,
            done: false,
        }
    }
}

/// Forward cursor over the child or attribute rows of one row. Holds the
/// table alive until dropped.
pub struct DbCursor {
    table: Arc<Table>,
    owner: usize,
    next: usize,
    end: usize,
    attributes: bool,
    done: bool,
}

impl DbCursor {
    fn corrupt(&mut self, what: &str) -> Error {
        self.done = true;
        tracing::warn!(table = %self.table.options.name, row = self.next, owner = self.owner, what, "corrupt table row");
        Error::from_code(
            ErrorCode::CorruptStore,
            format!(
                "table '{}': row {} below row {}: {what}",
                self.table.options.name, self.next, self.owner
            ),
        )
    }
}

impl Iterator for DbCursor {
    type Item = Result<DbNode, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.next >= self.end {
            self.done = true;
            return None;
        }
        let Some(rec) = self.table.records.get(self.next) else {
            return Some(Err(self.corrupt("row missing")));
        };
        let step = rec.size as usize;
        if rec.dist as usize != self.next - self.owner {
            return Some(Err(self.corrupt("parent distance mismatch")));
        }
        if step == 0 || self.next + step > self.end {
            return Some(Err(self.corrupt("subtree overruns its parent")));
        }
        if self.attributes != (rec.kind == NodeKind::Attribute) {
            return Some(Err(self.corrupt("attribute rows out of place")));
        }
        let node = DbNode {
            table: Arc::clone(&self.table),
            pre: self.next,
        };
        self.next += step;
        Some(Ok(node))
    }
}

impl XdmNode for DbNode {
    type Children = DbCursor;
    type Attributes = DbCursor;

    fn kind(&self) -> NodeKind {
        self.record().kind
    }
    fn id(&self) -> NodeId {
        self.record().id
    }
    fn name(&self) -> Option<QName> {
        self.record().name.as_ref().map(Name::qname)
    }
    fn namespaces(&self) -> Vec<Namespace> {
        self.record().namespaces.clone()
    }
    fn base_uri(&self) -> Option<String> {
        let opts = &self.table.options;
        opts.base_uri
            .clone()
            .or_else(|| (!opts.name.is_empty()).then(|| opts.name.clone()))
    }
    fn string_value(&self) -> String {
        let rec = self.record();
        match rec.kind {
            NodeKind::Element | NodeKind::Document => {
                let end = (self.pre + rec.size as usize).min(self.table.records.len());
                let start = (self.pre + 1).min(end);
                self.table.records[start..end]
                    .iter()
                    .filter(|r| r.kind == NodeKind::Text)
                    .filter_map(|r| r.value.as_deref())
                    .collect()
            }
            _ => rec.value.as_deref().unwrap_or_default().to_string(),
        }
    }
    fn parent(&self) -> Option<Self> {
        let dist = self.record().dist as usize;
        if dist == 0 {
            return None;
        }
        let pre = self.pre.checked_sub(dist)?;
        Some(DbNode {
            table: Arc::clone(&self.table),
            pre,
        })
    }
    fn child_cursor(&self) -> DbCursor {
        self.cursor(false)
    }
    fn attribute_cursor(&self) -> DbCursor {
        self.cursor(true)
    }
    fn is(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.table, &other.table) && self.pre == other.pre
    }
    fn diff(&self, other: &Self) -> Result<Ordering, Error> {
        if Arc::ptr_eq(&self.table, &other.table) {
            // attribute rows sit between their element and its children,
            // so row order is document order
            Ok(self.pre.cmp(&other.pre))
        } else {
            Ok(self.table.address().cmp(&other.table.address()))
        }
    }
    fn set_parent(&self, parent: &Self) -> Result<(), Error> {
        if self.parent().is_some_and(|p| p.is(parent)) {
            Ok(())
        } else {
            Err(Error::from_code(
                ErrorCode::ParentReassigned,
                format!("row {} has a fixed parent", self.pre),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::{attr, elem, text};

    fn sample() -> Arc<Table> {
        let root = elem("r")
            .attr(attr("id", "1"))
            .child(elem("a").child(text("x")))
            .child(text("  "))
            .child(elem("b").attr(attr("k", "v")))
            .build();
        Table::shred(&root, StoreOptions::new("sample")).unwrap()
    }

    #[test]
    fn shredded_layout_places_attributes_after_their_element() {
        let t = sample();
        // r @id a "x" "  " b @k
        assert_eq!(t.len(), 7);
        let r = t.root().unwrap();
        assert_eq!(r.record().size, 7);
        assert_eq!(r.record().attrs, 1);
        assert_eq!(t.node(1).unwrap().kind(), NodeKind::Attribute);
        assert_eq!(t.node(5).unwrap().name().unwrap().local, "b");
        assert_eq!(t.node(6).unwrap().parent().unwrap().pre(), 5);
    }

    #[test]
    fn chop_whitespace_drops_blank_text() {
        let root = elem("r").child(text(" \n ")).child(elem("a")).build();
        let t = Table::shred(&root, StoreOptions::new("c").with_chop_whitespace(true)).unwrap();
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn node_outside_table_is_invalid() {
        let t = sample();
        assert_eq!(t.node(99).unwrap_err().code, ErrorCode::InvalidNode);
    }

    #[test]
    fn from_rows_rejects_unknown_kind_codes() {
        let rows = vec![Row {
            kind: 42,
            dist: 0,
            size: 1,
            attrs: 0,
            name: None,
            value: None,
            namespaces: Vec::new(),
        }];
        let err = Table::from_rows(StoreOptions::new("bad"), rows).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownKind);
    }

    #[test]
    fn from_rows_rejects_parent_distances_outside_the_table() {
        let row = |dist| Row {
            kind: NodeKind::Element.code(),
            dist,
            size: 1,
            attrs: 0,
            name: Some(QName::parse("e")),
            value: None,
            namespaces: Vec::new(),
        };
        for rows in [vec![row(1)], vec![row(0), row(2)], vec![row(0), row(0)]] {
            let err = Table::from_rows(StoreOptions::new("bad"), rows).unwrap_err();
            assert_eq!(err.code, ErrorCode::CorruptStore);
        }
        assert!(Table::from_rows(StoreOptions::new("ok"), vec![row(0), row(1)]).is_ok());
    }

    #[test]
    fn base_uri_falls_back_to_table_name() {
        let t = sample();
        assert_eq!(t.root().unwrap().base_uri().as_deref(), Some("sample"));
        let root = elem("r").build();
        let t = Table::shred(&root, StoreOptions::new("n").with_base_uri("file:///n.xml")).unwrap();
        assert_eq!(t.root().unwrap().base_uri().as_deref(), Some("file:///n.xml"));
    }

    #[test]
    fn set_parent_accepts_only_the_stored_parent() {
        let t = sample();
        let a = t.node(2).unwrap();
        a.set_parent(&t.root().unwrap()).unwrap();
        let err = a.set_parent(&t.node(5).unwrap()).unwrap_err();
        assert_eq!(err.code, ErrorCode::ParentReassigned);
    }
}
