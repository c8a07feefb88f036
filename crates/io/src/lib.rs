// Table I/O operations

pub mod json;
pub mod table_text;

/// Native JSON format version
/// Increment when schema changes in a way that old versions can't read
pub const NATIVE_FORMAT_VERSION: u32 = 1;
