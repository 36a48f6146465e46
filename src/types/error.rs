//! Error types for the splitmigrate library.

use thiserror::Error;

use super::address::{BlockLocator, LegacyAddress, VersionId};

/// All errors that can occur in the splitmigrate library.
///
/// Every variant is fatal: the engine performs no internal retries and no
/// rollback. A failed migration leaves the target course partially populated
/// and must be cleaned up out-of-band.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// The source course is already mapped to a target course.
    #[error("Course {0} has already been migrated (target id {1})")]
    DuplicateCourse(LegacyAddress, String),

    /// An explicit target course id conflicts with an existing mapping.
    #[error("Course {course} is already mapped to {existing}, refusing to rebind to {requested}")]
    DuplicateMapping {
        /// The legacy course whose mapping was requested.
        course: LegacyAddress,
        /// The previously recorded target course id.
        existing: String,
        /// The conflicting id the caller asked for.
        requested: String,
    },

    /// The source enumeration could not reach the course root.
    #[error("Source course {0} not found in the legacy store")]
    SourceCourseNotFound(LegacyAddress),

    /// The target course root was never created (ordering error, not retried).
    #[error("Target course {0} not found in the versioned store")]
    TargetCourseNotFound(String),

    /// A legacy address has no map entry and creation was not requested.
    #[error("No address mapping for {address} in course {course_id}")]
    AddressNotFound {
        course_id: String,
        address: LegacyAddress,
    },

    /// A node lookup failed.
    #[error("Item {0} not found")]
    ItemNotFound(BlockLocator),

    /// A legacy node lookup failed.
    #[error("Source item {0} not found")]
    SourceItemNotFound(LegacyAddress),

    /// A course index lookup failed.
    #[error("Course {0} not found")]
    CourseNotFound(String),

    /// Attempted to create a course that already exists in the target store.
    #[error("Course {0} already exists in the target store")]
    CourseExists(String),

    /// Attempted to create a block over an existing one.
    #[error("Item {0} already exists")]
    ItemExists(BlockLocator),

    /// A branch pointer named a structure version the store does not hold.
    #[error("Structure version {0} not found")]
    VersionNotFound(VersionId),

    /// A branch name resolved to no structure version.
    #[error("Branch '{branch}' of course {course_id} points to no structure")]
    BranchNotFound { course_id: String, branch: String },

    /// A legacy address string could not be parsed.
    #[error("Malformed legacy address: {0}")]
    BadAddress(String),

    /// A legacy dump held no published course root.
    #[error("Dump contains no published course node")]
    DumpMissingCourse,

    /// IO error (reading a dump file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON in a dump file.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result type for splitmigrate operations.
pub type MigrateResult<T> = Result<T, MigrateError>;
