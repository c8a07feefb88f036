use std::fmt;

use crate::command::Phase;
use crate::id::{CellId, ColumnId, RowId, TagId};

/// Errors surfaced by the table state engine.
///
/// `CommandSequence` and `Consistency` indicate programming errors and are
/// not user-recoverable; the NotFound variants indicate a stale command
/// referencing an id the model no longer holds. Errors always propagate —
/// the engine never coerces a failure into a default state.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// execute/undo/redo called outside the Fresh -> Executed -> Undone
    /// -> Executed ordering.
    CommandSequence {
        attempted: &'static str,
        phase: Phase,
    },
    ColumnNotFound(ColumnId),
    RowNotFound(RowId),
    CellNotFound(CellId),
    TagNotFound(TagId),
    /// A post-mutation invariant check failed.
    Consistency(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CommandSequence { attempted, phase } => {
                write!(f, "cannot {attempted} a command in the {phase:?} state")
            }
            Self::ColumnNotFound(id) => write!(f, "column not found: {id}"),
            Self::RowNotFound(id) => write!(f, "row not found: {id}"),
            Self::CellNotFound(id) => write!(f, "cell not found: {id}"),
            Self::TagNotFound(id) => write!(f, "tag not found: {id}"),
            Self::Consistency(msg) => write!(f, "model consistency violated: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
