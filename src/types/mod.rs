//! All data types for the splitmigrate library.

pub mod address;
pub mod error;
pub mod fields;

pub use address::{BlockLocator, Branch, LegacyAddress, Revision, UsageId, VersionId};
pub use error::{MigrateError, MigrateResult};
pub use fields::{apply_diff, FieldDiff, FieldMap};

/// Field name under which a node's ordered child list is stored.
///
/// Children are an ordinary explicitly-set field, exactly as in the legacy
/// store; the engine reads and rewrites this key rather than carrying a
/// separate child list.
pub const CHILDREN_FIELD: &str = "children";

/// Field name of a node's human-readable title.
pub const DISPLAY_NAME_FIELD: &str = "display_name";

/// Returns the current time as Unix epoch microseconds.
pub fn now_micros() -> u64 {
    chrono::Utc::now().timestamp_micros() as u64
}
