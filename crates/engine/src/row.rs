//! Row entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::RowId;

/// A body row. Position in the model's row sequence is the visual
/// top-to-bottom order, distinct from the header row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,
    pub created_at: DateTime<Utc>,
    pub edited_at: DateTime<Utc>,
}

impl Row {
    pub(crate) fn new(now: DateTime<Utc>) -> Self {
        Self {
            id: RowId::generate(),
            created_at: now,
            edited_at: now,
        }
    }
}
