//! Newtype identifiers for table entities.
//!
//! Each entity (column, row, cell, tag) is keyed by a uuid-v4 string wrapped
//! in a distinct newtype so the compiler keeps the id spaces separate. Ids are
//! generated fresh and never reused within a table's lifetime. They serialize
//! transparently as plain strings.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh, unique id backed by a uuid-v4 string.
            pub fn generate() -> Self {
                $name(Uuid::new_v4().to_string())
            }

            /// The underlying string value.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Identity of a column.
    ColumnId
);
define_id!(
    /// Identity of a row.
    RowId
);
define_id!(
    /// Identity of a cell.
    CellId
);
define_id!(
    /// Identity of a tag.
    TagId
);
