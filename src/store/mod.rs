//! Store collaborators — the seam between the engine and persistence.
//!
//! The migration engine never touches storage directly. It reads from a
//! [`SourceStore`] (the legacy, location-addressed tree) and writes through a
//! [`TargetStore`] (the versioned, branch-aware store). Both are traits so the
//! engine stays a pure tree-transformation algorithm; this module also ships
//! in-memory reference implementations of each.

pub mod source;
pub mod split;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{
    fields, BlockLocator, Branch, FieldMap, LegacyAddress, MigrateResult, UsageId, VersionId,
    CHILDREN_FIELD,
};

pub use source::{DraftView, LegacyDump, LegacyStore, PublishedView};
pub use split::SplitStore;

/// A node read from the legacy store.
///
/// `fields` holds exactly the explicitly-set fields of the node. This is the
/// `listExplicitFields` capability: the store answers "which fields were
/// authored here", so the engine never needs reflection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceNode {
    /// Full legacy address, revision included.
    pub address: LegacyAddress,
    /// Node category ("course", "chapter", ...).
    pub category: String,
    /// Explicitly-set fields only. Children live under `"children"` as an
    /// array of rendered legacy addresses.
    pub fields: FieldMap,
}

impl SourceNode {
    /// Create a node. The category is taken from the address.
    pub fn new(address: LegacyAddress, fields: FieldMap) -> Self {
        let category = address.category.clone();
        Self {
            address,
            category,
            fields,
        }
    }

    /// The explicitly-set fields of this node.
    pub fn explicit_fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Parse the node's ordered child list from its `children` field.
    pub fn children(&self) -> MigrateResult<Vec<LegacyAddress>> {
        fields::string_list(&self.fields, CHILDREN_FIELD)
            .iter()
            .map(|s| s.parse())
            .collect()
    }
}

/// Read-only view over one side of the legacy content tree.
pub trait SourceStore {
    /// Enumerate every node under a course, in stable order, including
    /// orphans not reachable from the course root.
    fn get_items(&self, course_address: &LegacyAddress) -> Vec<SourceNode>;

    /// Fetch a single node by address.
    fn get_item(&self, address: &LegacyAddress) -> MigrateResult<SourceNode>;

    /// All addresses whose child list references `address` (revision
    /// ignored on the child side).
    fn get_parent_addresses(&self, address: &LegacyAddress) -> Vec<LegacyAddress>;
}

/// A block inside one structure version of the target store.
#[derive(Debug, Clone, Serialize)]
pub struct Block {
    /// Where this block was read from (course + branch + usage id).
    pub locator: BlockLocator,
    /// Block category.
    pub category: String,
    /// Explicitly-set fields, children included under `"children"`.
    pub fields: FieldMap,
    /// User who last edited this block.
    pub edited_by: String,
    /// When this block was last edited (epoch micros).
    pub edited_on: u64,
}

impl Block {
    /// The ordered child usage ids of this block.
    pub fn children(&self) -> Vec<UsageId> {
        fields::string_list(&self.fields, CHILDREN_FIELD)
            .into_iter()
            .map(UsageId::new)
            .collect()
    }

    /// Replace the ordered child list.
    pub fn set_children(&mut self, children: Vec<UsageId>) {
        fields::set_string_list(
            &mut self.fields,
            CHILDREN_FIELD,
            children.into_iter().map(|c| c.as_str().to_string()).collect(),
        );
    }
}

/// Per-course branch index: branch name -> structure version.
#[derive(Debug, Clone, Serialize)]
pub struct CourseIndex {
    /// Target course id.
    pub course_id: String,
    /// Owning organization.
    pub org: String,
    /// Branch pointers. Every entry must name an existing structure.
    pub branches: BTreeMap<Branch, VersionId>,
}

/// Append-only versioned target store.
///
/// Every mutation yields a new structure version (or extends the in-flight
/// one when `continue_version` is set); existing versions are never edited
/// once another branch can see them.
pub trait TargetStore {
    /// Create a course: its index, its first structure version, and the root
    /// block inside it. The index starts with only `master_branch` set.
    #[allow(clippy::too_many_arguments)]
    fn create_course(
        &mut self,
        org: &str,
        title: &str,
        user_id: &str,
        new_course_id: &str,
        root_usage_id: UsageId,
        master_branch: Branch,
        fields: FieldMap,
    ) -> MigrateResult<()>;

    /// Create a block on a branch. With `continue_version`, the write lands
    /// in the branch's in-flight version instead of cutting a new one.
    #[allow(clippy::too_many_arguments)]
    fn create_item(
        &mut self,
        course_id: &str,
        branch: Branch,
        category: &str,
        user_id: &str,
        usage_id: UsageId,
        fields: FieldMap,
        continue_version: bool,
    ) -> MigrateResult<()>;

    /// Persist an updated block, producing a new structure version on the
    /// block's branch.
    fn update_item(&mut self, block: &Block, user_id: &str) -> MigrateResult<()>;

    /// Read a course's branch index.
    fn get_course_index(&self, course_id: &str) -> MigrateResult<CourseIndex>;

    /// Replace a course's branch index.
    fn update_course_index(&mut self, index: CourseIndex) -> MigrateResult<()>;

    /// Whether a block exists at the locator's branch head.
    fn has_item(&self, locator: &BlockLocator) -> bool;

    /// Read a block from the locator's branch head.
    fn get_item(&self, locator: &BlockLocator) -> MigrateResult<Block>;

    /// Remove, from every child list in the published branch head, any child
    /// that names no block in that structure. Returns the number of pruned
    /// references.
    fn clean_children(&mut self, course_id: &str) -> MigrateResult<usize>;
}
