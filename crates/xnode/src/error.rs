use core::fmt;
use std::sync::Arc;

/// Error codes raised by the node model and the axis iterators.
///
/// The `FO*`/`XP*` codes follow the W3C xqt-errors naming; the remaining
/// variants are specific to node navigation and the storage backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    FOER0000, // generic error
    FORG0001, // invalid lexical form during value coercion
    XPTY0004, // type error in value comparison
    /// A node handle that does not denote a node (e.g. stale table position).
    InvalidNode,
    /// `set_parent` called again with a different parent.
    ParentReassigned,
    /// Linking a node below itself or one of its descendants.
    ParentCycle,
    /// A node is not reachable through its parent's child cursor.
    TreeInconsistent,
    /// Inconsistent table rows, found at load time or by a cursor.
    CorruptStore,
    /// A storage kind code without a node kind.
    UnknownKind,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::FOER0000 => "err:FOER0000",
            ErrorCode::FORG0001 => "err:FORG0001",
            ErrorCode::XPTY0004 => "err:XPTY0004",
            ErrorCode::InvalidNode => "xnode:INVALID_NODE",
            ErrorCode::ParentReassigned => "xnode:PARENT_REASSIGNED",
            ErrorCode::ParentCycle => "xnode:PARENT_CYCLE",
            ErrorCode::TreeInconsistent => "xnode:TREE_INCONSISTENT",
            ErrorCode::CorruptStore => "xnode:CORRUPT_STORE",
            ErrorCode::UnknownKind => "xnode:UNKNOWN_KIND",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    #[source]
    pub source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub fn from_code(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
            source: None,
        }
    }

    /// Compose an error with a source cause.
    pub fn with_source(
        mut self,
        source: impl Into<Option<Arc<dyn std::error::Error + Send + Sync>>>,
    ) -> Self {
        self.source = source.into();
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }
}
