use core::cmp::Ordering;

use rstest::{fixture, rstest};
use xnode::{AnyNode, Axes, Axis, Error, FNode, NodeKind, StoreOptions, Table, XdmNode, attr, doc, elem, text};

#[derive(Debug, Clone, Copy)]
enum Backend {
    Fragment,
    Stored,
}

fn load(backend: Backend, tree: FNode) -> AnyNode {
    match backend {
        Backend::Fragment => AnyNode::from(tree),
        Backend::Stored => {
            let table = Table::shred(&tree, StoreOptions::new("axes")).unwrap();
            AnyNode::from(table.root().unwrap())
        }
    }
}

fn label<N: XdmNode>(n: &N) -> String {
    match n.kind() {
        NodeKind::Attribute => format!("@{}", n.name().unwrap().local),
        NodeKind::Text => format!("'{}'", n.string_value()),
        NodeKind::Document => "/".to_string(),
        _ => n.name().map(|q| q.local).unwrap_or_default(),
    }
}

fn labels<N: XdmNode>(it: impl Iterator<Item = Result<N, Error>>) -> Vec<String> {
    it.map(|r| label(&r.unwrap())).collect()
}

fn collect<N: XdmNode>(it: impl Iterator<Item = Result<N, Error>>) -> Vec<N> {
    it.collect::<Result<Vec<_>, _>>().unwrap()
}

fn find<N: XdmNode>(root: &N, local: &str) -> N {
    root.descendant_or_self()
        .map(Result::unwrap)
        .find(|n| n.kind() == NodeKind::Element && n.name().is_some_and(|q| q.local == local))
        .unwrap_or_else(|| panic!("no element {local}"))
}

/// Every node of the tree including attributes, in document order.
fn all_nodes<N: XdmNode>(root: &N) -> Vec<N> {
    let mut out = Vec::new();
    for n in root.descendant_or_self() {
        let n = n.unwrap();
        let attrs = collect(n.attribute());
        out.push(n);
        out.extend(attrs);
    }
    out
}

fn contains<N: XdmNode>(nodes: &[N], n: &N) -> bool {
    nodes.iter().any(|m| m.is(n))
}

// a[ b, c[ d ] ]
#[fixture]
fn scenario() -> FNode {
    doc()
        .child(elem("a").child(elem("b")).child(elem("c").child(elem("d"))))
        .build()
}

#[fixture]
fn library() -> FNode {
    doc()
        .child(
            elem("library")
                .attr(attr("id", "main"))
                .attr(attr("open", "yes"))
                .child(text("intro"))
                .child(
                    elem("book")
                        .attr(attr("isbn", "1"))
                        .child(elem("title").child(text("Dune")))
                        .child(elem("year").child(text("1965"))),
                )
                .child(
                    elem("book")
                        .attr(attr("isbn", "2"))
                        .child(elem("title").child(text("Emma")))
                        .child(xnode::comment("no year")),
                )
                .child(elem("shelf").child(elem("slot")).child(elem("slot"))),
        )
        .build()
}

#[rstest]
fn scenario_axes(scenario: FNode, #[values(Backend::Fragment, Backend::Stored)] backend: Backend) {
    let root = load(backend, scenario);
    let b = find(&root, "b");
    let c = find(&root, "c");
    let d = find(&root, "d");

    assert!(labels(c.following_sibling()).is_empty());
    assert_eq!(labels(c.preceding_sibling()), ["b"]);
    assert_eq!(labels(b.following()), ["c", "d"]);
    assert_eq!(labels(d.preceding()), ["b"]);
    assert_eq!(labels(d.ancestor()), ["c", "a", "/"]);
    assert_eq!(labels(d.ancestor_or_self()), ["d", "c", "a", "/"]);
    assert_eq!(labels(root.descendant()), ["a", "b", "c", "d"]);
    assert_eq!(labels(c.parent_axis()), ["a"]);
    assert!(labels(root.parent_axis()).is_empty());
    assert_eq!(labels(c.self_axis()), ["c"]);
}

#[rstest]
fn attribute_context_nodes(library: FNode, #[values(Backend::Fragment, Backend::Stored)] backend: Backend) {
    let root = load(backend, library);
    let lib = find(&root, "library");
    let open = collect(lib.attribute()).pop().unwrap();
    assert_eq!(label(&open), "@open");

    assert_eq!(labels(open.parent_axis()), ["library"]);
    assert!(labels(open.following_sibling()).is_empty());
    assert!(labels(open.preceding_sibling()).is_empty());
    assert!(labels(open.child()).is_empty());
    assert!(labels(open.descendant()).is_empty());
    assert!(labels(open.attribute()).is_empty());
    // the owner's content follows its attributes; nothing precedes the owner
    let following = labels(open.following());
    assert_eq!(following.first().map(String::as_str), Some("'intro'"));
    assert_eq!(following.last().map(String::as_str), Some("slot"));
    assert!(!following.iter().any(|l| l.starts_with('@')));
    assert!(labels(open.preceding()).is_empty());
}

#[rstest]
fn attributes_come_in_declaration_order(library: FNode, #[values(Backend::Fragment, Backend::Stored)] backend: Backend) {
    let root = load(backend, library);
    let lib = find(&root, "library");
    assert_eq!(labels(lib.attribute()), ["@id", "@open"]);
    let id = collect(lib.attribute()).remove(0);
    assert_eq!(id.string_value(), "main");
}

#[rstest]
fn identity_and_order_are_reflexive(library: FNode, #[values(Backend::Fragment, Backend::Stored)] backend: Backend) {
    let root = load(backend, library);
    for n in all_nodes(&root) {
        assert!(n.is(&n));
        assert!(n.is(&n.finish()));
        assert_eq!(n.diff(&n).unwrap(), Ordering::Equal);
    }
}

#[rstest]
fn diff_matches_document_order(library: FNode, #[values(Backend::Fragment, Backend::Stored)] backend: Backend) {
    let root = load(backend, library);
    let nodes = all_nodes(&root);
    for (i, a) in nodes.iter().enumerate() {
        for (j, b) in nodes.iter().enumerate() {
            assert_eq!(a.diff(b).unwrap(), i.cmp(&j), "{} vs {}", label(a), label(b));
            assert_eq!(a.is(b), i == j);
        }
    }
}

#[rstest]
fn descendant_or_self_is_self_then_descendants(library: FNode, #[values(Backend::Fragment, Backend::Stored)] backend: Backend) {
    let root = load(backend, library);
    for n in all_nodes(&root) {
        let with_self = collect(n.descendant_or_self());
        let without = collect(n.descendant());
        assert_eq!(with_self.len(), without.len() + 1);
        assert!(with_self[0].is(&n));
        assert!(with_self[1..].iter().zip(&without).all(|(a, b)| a.is(b)));
    }
}

#[rstest]
fn siblings_rebuild_the_child_list(library: FNode, #[values(Backend::Fragment, Backend::Stored)] backend: Backend) {
    let root = load(backend, library);
    for n in all_nodes(&root) {
        if n.kind() == NodeKind::Attribute {
            continue;
        }
        let Some(parent) = n.parent() else { continue };
        let mut rebuilt = collect(n.preceding_sibling());
        rebuilt.reverse();
        rebuilt.push(n.clone());
        rebuilt.extend(collect(n.following_sibling()));
        let children = collect(parent.child());
        assert_eq!(rebuilt.len(), children.len());
        assert!(rebuilt.iter().zip(&children).all(|(a, b)| a.is(b)));
    }
}

#[rstest]
fn following_and_preceding_partition_the_rest(library: FNode, #[values(Backend::Fragment, Backend::Stored)] backend: Backend) {
    let root = load(backend, library);
    let nodes = all_nodes(&root);
    for n in &nodes {
        let ancestors = collect(n.ancestor());
        let descendants = collect(n.descendant());
        let following = collect(n.following());
        let preceding = collect(n.preceding());

        assert!(following.windows(2).all(|w| w[0].diff(&w[1]).unwrap() == Ordering::Less));
        assert!(preceding.windows(2).all(|w| w[0].diff(&w[1]).unwrap() == Ordering::Greater));

        for m in &nodes {
            if m.kind() == NodeKind::Attribute
                || m.is(n)
                || contains(&ancestors, m)
                || contains(&descendants, m)
            {
                assert!(!contains(&following, m) && !contains(&preceding, m));
                continue;
            }
            match m.diff(n).unwrap() {
                Ordering::Greater => assert!(contains(&following, m), "{} after {}", label(m), label(n)),
                Ordering::Less => assert!(contains(&preceding, m), "{} before {}", label(m), label(n)),
                Ordering::Equal => unreachable!(),
            }
        }
    }
}

#[rstest]
#[case::child(Axis::Child)]
#[case::descendant(Axis::Descendant)]
#[case::preceding_sibling(Axis::PrecedingSibling)]
#[case::following(Axis::Following)]
#[case::preceding(Axis::Preceding)]
#[case::ancestor_or_self(Axis::AncestorOrSelf)]
fn iterators_stay_exhausted(library: FNode, #[case] axis: Axis, #[values(Backend::Fragment, Backend::Stored)] backend: Backend) {
    let root = load(backend, library);
    let slot = find(&root, "slot");
    let mut it = slot.axis(axis);
    while it.next().is_some() {}
    assert!(it.next().is_none());
    assert!(it.next().is_none());
}

#[rstest]
fn axis_dispatch_matches_named_factories(library: FNode, #[values(Backend::Fragment, Backend::Stored)] backend: Backend) {
    let root = load(backend, library);
    let book = find(&root, "book");
    for axis in Axis::ALL {
        let direct = match axis {
            Axis::SelfAxis => labels(book.self_axis()),
            Axis::Parent => labels(book.parent_axis()),
            Axis::Ancestor => labels(book.ancestor()),
            Axis::AncestorOrSelf => labels(book.ancestor_or_self()),
            Axis::Child => labels(book.child()),
            Axis::Descendant => labels(book.descendant()),
            Axis::DescendantOrSelf => labels(book.descendant_or_self()),
            Axis::Attribute => labels(book.attribute()),
            Axis::FollowingSibling => labels(book.following_sibling()),
            Axis::PrecedingSibling => labels(book.preceding_sibling()),
            Axis::Following => labels(book.following()),
            Axis::Preceding => labels(book.preceding()),
        };
        assert_eq!(labels(book.axis(axis)), direct, "{axis}");
        assert_eq!(Axis::from_name(axis.name()), Some(axis));
    }
}

#[rstest]
fn child_axis_peeks_without_consuming(scenario: FNode, #[values(Backend::Fragment, Backend::Stored)] backend: Backend) {
    let root = load(backend, scenario);
    let a = find(&root, "a");
    let mut kids = a.child();
    assert!(kids.has_more());
    assert!(kids.has_more());
    assert_eq!(label(&kids.next().unwrap().unwrap()), "b");
    assert!(kids.has_more());
    assert_eq!(label(&kids.next().unwrap().unwrap()), "c");
    assert!(!kids.has_more());
    assert!(kids.next().is_none());

    let d = find(&root, "d");
    assert!(!d.child().has_more());
}

#[rstest]
fn copies_are_detached_and_independent(library: FNode, #[values(Backend::Fragment, Backend::Stored)] backend: Backend) {
    let root = load(backend, library);
    let book = find(&root, "book");
    let copy = book.copy().unwrap();

    assert!(copy.parent().is_none());
    assert_eq!(copy.kind(), book.kind());
    assert_eq!(copy.name(), book.name());
    assert_eq!(copy.string_value(), book.string_value());
    assert_eq!(labels(copy.descendant()), labels(book.descendant()));
    assert_eq!(labels(copy.attribute()), labels(book.attribute()));

    let extra = elem("extra").child(text("!")).build();
    copy.append_child(extra).unwrap();
    assert_eq!(copy.string_value(), "Dune1965!");
    assert_eq!(book.string_value(), "Dune1965");
    assert_eq!(collect(book.child()).len(), 2);
}

#[rstest]
fn base_uri_survives_copy(#[values(Backend::Fragment, Backend::Stored)] backend: Backend) {
    let tree = elem("r").base_uri("file:///r.xml").child(elem("x")).build();
    let root = match backend {
        Backend::Fragment => AnyNode::from(tree),
        Backend::Stored => {
            let table = Table::shred(&tree, StoreOptions::new("r").with_base_uri("file:///r.xml")).unwrap();
            AnyNode::from(table.root().unwrap())
        }
    };
    let x = find(&root, "x");
    assert_eq!(x.base_uri().as_deref(), Some("file:///r.xml"));
    assert_eq!(x.copy().unwrap().base_uri().as_deref(), Some("file:///r.xml"));
}

#[rstest]
#[case::following(Axis::Following)]
#[case::child(Axis::Child)]
#[case::descendant(Axis::Descendant)]
#[case::preceding_sibling(Axis::PrecedingSibling)]
fn iterators_over_one_node_are_independent(
    library: FNode,
    #[case] axis: Axis,
    #[values(Backend::Fragment, Backend::Stored)] backend: Backend,
) {
    let root = load(backend, library);
    let second_book = find(&root, "library")
        .child()
        .map(Result::unwrap)
        .filter(|n| label(n) == "book")
        .nth(1)
        .unwrap();
    let expected = labels(second_book.axis(axis));
    assert!(!expected.is_empty());

    // one iterator advances a step at a time, the other two steps at a time
    let mut slow = second_book.axis(axis);
    let mut fast = second_book.axis(axis);
    let (mut got_slow, mut got_fast) = (Vec::new(), Vec::new());
    loop {
        let a = slow.next().map(|r| label(&r.unwrap()));
        let b: Vec<_> = fast.by_ref().take(2).map(|r| label(&r.unwrap())).collect();
        if a.is_none() && b.is_empty() {
            break;
        }
        got_slow.extend(a);
        got_fast.extend(b);
    }
    assert_eq!(got_slow, expected);
    assert_eq!(got_fast, expected);
}

#[rstest]
fn shared_tree_traverses_in_parallel(library: FNode, #[values(Backend::Fragment, Backend::Stored)] backend: Backend) {
    let root = load(backend, library);
    let nodes = all_nodes(&root);
    let walk = |nodes: &[AnyNode]| -> Vec<(Vec<String>, Vec<String>, Vec<String>)> {
        nodes
            .iter()
            .map(|n| (labels(n.following()), labels(n.preceding()), labels(n.ancestor())))
            .collect()
    };
    let expected = walk(&nodes);
    std::thread::scope(|s| {
        let workers: Vec<_> = (0..4).map(|_| s.spawn(|| walk(&nodes))).collect();
        for worker in workers {
            assert_eq!(worker.join().unwrap(), expected);
        }
    });
}
