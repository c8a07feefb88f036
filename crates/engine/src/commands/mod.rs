//! Concrete command types, one per mutation kind.

pub mod cell;
pub mod column;
pub mod row;
pub mod tag;

pub use cell::CellContentChangeCommand;
pub use column::{
    AddColumnCommand, ColumnSetting, ColumnSettingChangeCommand, DeleteColumnCommand,
    HeaderContentChangeCommand, HeaderTypeChangeCommand, InsertColumnCommand, MoveColumnCommand,
};
pub use row::{AddRowCommand, DeleteRowCommand};
pub use tag::{
    TagAddCommand, TagAddToCellCommand, TagColorChangeCommand, TagDeleteCommand,
    TagRemoveFromCellCommand,
};
