//! Document-order helpers for evaluators: sorting and duplicate elimination
//! of node sequences produced by several axis steps.

use core::cmp::Ordering;

use crate::error::Error;
use crate::model::XdmNode;

pub use crate::model::compare_in_tree;

/// Sorts `nodes` into document order. The first comparison error aborts the
/// sort and is returned; the slice is left in an unspecified order.
pub fn sort_document_order<N: XdmNode>(nodes: &mut [N]) -> Result<(), Error> {
    let mut failure: Option<Error> = None;
    nodes.sort_by(|a, b| {
        if failure.is_some() {
            return Ordering::Equal;
        }
        a.diff(b).unwrap_or_else(|e| {
            failure = Some(e);
            Ordering::Equal
        })
    });
    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Document order with identical nodes (by `is`) collapsed.
pub fn distinct_document_order<N: XdmNode>(mut nodes: Vec<N>) -> Result<Vec<N>, Error> {
    if is_document_ordered(&nodes)? {
        nodes.dedup_by(|a, b| a.is(b));
        return Ok(nodes);
    }
    sort_document_order(&mut nodes)?;
    nodes.dedup_by(|a, b| a.is(b));
    Ok(nodes)
}

/// Whether `nodes` is already in non-decreasing document order.
pub fn is_document_ordered<N: XdmNode>(nodes: &[N]) -> Result<bool, Error> {
    for pair in nodes.windows(2) {
        if pair[0].diff(&pair[1])? == Ordering::Greater {
            return Ok(false);
        }
    }
    Ok(true)
}
