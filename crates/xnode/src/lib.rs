pub mod any;
pub mod axes;
pub mod error;
pub mod fragment;
pub mod item;
pub mod model;
pub mod order;
pub mod store;
pub mod view;

pub use any::AnyNode;
pub use axes::{Axes, Axis, AxisIter};
pub use error::{Error, ErrorCode};
pub use fragment::{FNode, NodeBuilder, attr, comment, doc, elem, ns, pi, text};
pub use item::Item;
pub use model::{IdGen, Namespace, NodeId, NodeKind, QName, XdmNode};
pub use store::{DbNode, StoreOptions, Table};
pub use view::NodeView;
