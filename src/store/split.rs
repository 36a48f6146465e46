//! In-memory versioned, branch-aware target store.
//!
//! Structures are immutable snapshots identified by version id. A branch is a
//! named pointer into the version set. Writes fork the branch head via
//! copy-on-write; a continued-version write amends the in-flight version
//! instead, as long as no other branch can see it. Superseded versions are
//! kept, never deleted.

use std::collections::{BTreeMap, HashMap};

use log::{debug, info};
use serde::Serialize;

use crate::types::fields::{set_string_list, string_list};
use crate::types::{
    now_micros, BlockLocator, Branch, FieldMap, MigrateError, MigrateResult, UsageId, VersionId,
    CHILDREN_FIELD,
};

use super::{Block, CourseIndex, TargetStore};

/// A block as stored inside a structure (no locator; the structure provides
/// the context).
#[derive(Debug, Clone, Serialize)]
pub struct StoredBlock {
    /// Block category.
    pub category: String,
    /// Explicitly-set fields.
    pub fields: FieldMap,
    /// User who last edited this block.
    pub edited_by: String,
    /// When this block was last edited (epoch micros).
    pub edited_on: u64,
}

/// One immutable snapshot of a course's full block mapping.
#[derive(Debug, Clone, Serialize)]
pub struct Structure {
    /// This snapshot's id.
    pub version: VersionId,
    /// The version this snapshot was forked from (self for the first one).
    pub original_version: VersionId,
    /// Usage id of the course root block.
    pub root: UsageId,
    /// All blocks, by usage id.
    pub blocks: BTreeMap<UsageId, StoredBlock>,
    /// User who cut this version.
    pub edited_by: String,
    /// When this version was cut (epoch micros).
    pub edited_on: u64,
}

/// The in-memory versioned store.
#[derive(Debug, Default)]
pub struct SplitStore {
    /// Every structure version ever cut, by id.
    structures: HashMap<VersionId, Structure>,
    /// Course indexes, by course id.
    courses: BTreeMap<String, CourseIndex>,
}

impl SplitStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a structure version, if the store holds it.
    pub fn structure(&self, version: &VersionId) -> Option<&Structure> {
        self.structures.get(version)
    }

    /// All course ids present, in sorted order.
    pub fn course_ids(&self) -> Vec<String> {
        self.courses.keys().cloned().collect()
    }

    fn index(&self, course_id: &str) -> MigrateResult<&CourseIndex> {
        self.courses
            .get(course_id)
            .ok_or_else(|| MigrateError::CourseNotFound(course_id.to_string()))
    }

    fn head_version(&self, course_id: &str, branch: Branch) -> MigrateResult<VersionId> {
        let index = self.index(course_id)?;
        index
            .branches
            .get(&branch)
            .copied()
            .ok_or_else(|| MigrateError::BranchNotFound {
                course_id: course_id.to_string(),
                branch: branch.as_str().to_string(),
            })
    }

    fn head(&self, course_id: &str, branch: Branch) -> MigrateResult<&Structure> {
        let version = self.head_version(course_id, branch)?;
        self.structures
            .get(&version)
            .ok_or(MigrateError::VersionNotFound(version))
    }

    /// How many branch pointers (across all courses) reference a version.
    fn reference_count(&self, version: VersionId) -> usize {
        self.courses
            .values()
            .flat_map(|index| index.branches.values())
            .filter(|&&v| v == version)
            .count()
    }

    /// Resolve the version a write on `branch` may mutate.
    ///
    /// With `continue_version`, the branch head is amended in place if this
    /// branch is its only referent; a head shared with another branch (a
    /// freshly aliased draft, say) is forked first so the write cannot leak
    /// into the other branch. Without `continue_version`, the head is always
    /// forked and the branch repointed.
    fn writable_head(
        &mut self,
        course_id: &str,
        branch: Branch,
        user_id: &str,
        continue_version: bool,
    ) -> MigrateResult<VersionId> {
        let head = self.head_version(course_id, branch)?;
        if continue_version && self.reference_count(head) == 1 {
            return Ok(head);
        }

        let parent = self
            .structures
            .get(&head)
            .ok_or(MigrateError::VersionNotFound(head))?;
        let version = VersionId::new();
        let forked = Structure {
            version,
            original_version: head,
            root: parent.root.clone(),
            blocks: parent.blocks.clone(),
            edited_by: user_id.to_string(),
            edited_on: now_micros(),
        };
        debug!(
            "forking {}/{}: {} -> {}",
            course_id, branch, head, version
        );
        self.structures.insert(version, forked);
        let index = self
            .courses
            .get_mut(course_id)
            .ok_or_else(|| MigrateError::CourseNotFound(course_id.to_string()))?;
        index.branches.insert(branch, version);
        Ok(version)
    }
}

impl TargetStore for SplitStore {
    fn create_course(
        &mut self,
        org: &str,
        title: &str,
        user_id: &str,
        new_course_id: &str,
        root_usage_id: UsageId,
        master_branch: Branch,
        fields: FieldMap,
    ) -> MigrateResult<()> {
        if self.courses.contains_key(new_course_id) {
            return Err(MigrateError::CourseExists(new_course_id.to_string()));
        }

        let now = now_micros();
        let version = VersionId::new();
        let mut blocks = BTreeMap::new();
        blocks.insert(
            root_usage_id.clone(),
            StoredBlock {
                category: "course".to_string(),
                fields,
                edited_by: user_id.to_string(),
                edited_on: now,
            },
        );
        self.structures.insert(
            version,
            Structure {
                version,
                original_version: version,
                root: root_usage_id,
                blocks,
                edited_by: user_id.to_string(),
                edited_on: now,
            },
        );

        let mut branches = BTreeMap::new();
        branches.insert(master_branch, version);
        self.courses.insert(
            new_course_id.to_string(),
            CourseIndex {
                course_id: new_course_id.to_string(),
                org: org.to_string(),
                branches,
            },
        );
        info!(
            "created course {} ('{}') with {} head {}",
            new_course_id, title, master_branch, version
        );
        Ok(())
    }

    fn create_item(
        &mut self,
        course_id: &str,
        branch: Branch,
        category: &str,
        user_id: &str,
        usage_id: UsageId,
        fields: FieldMap,
        continue_version: bool,
    ) -> MigrateResult<()> {
        let version = self.writable_head(course_id, branch, user_id, continue_version)?;
        let structure = self
            .structures
            .get_mut(&version)
            .ok_or(MigrateError::VersionNotFound(version))?;
        if structure.blocks.contains_key(&usage_id) {
            return Err(MigrateError::ItemExists(BlockLocator::new(
                course_id, branch, usage_id,
            )));
        }
        structure.blocks.insert(
            usage_id,
            StoredBlock {
                category: category.to_string(),
                fields,
                edited_by: user_id.to_string(),
                edited_on: now_micros(),
            },
        );
        Ok(())
    }

    fn update_item(&mut self, block: &Block, user_id: &str) -> MigrateResult<()> {
        let locator = &block.locator;
        // Verify the block exists at the current head before forking.
        if !self.has_item(locator) {
            return Err(MigrateError::ItemNotFound(locator.clone()));
        }
        let version =
            self.writable_head(&locator.course_id, locator.branch, user_id, false)?;
        let structure = self
            .structures
            .get_mut(&version)
            .ok_or(MigrateError::VersionNotFound(version))?;
        structure.blocks.insert(
            locator.usage_id.clone(),
            StoredBlock {
                category: block.category.clone(),
                fields: block.fields.clone(),
                edited_by: user_id.to_string(),
                edited_on: now_micros(),
            },
        );
        Ok(())
    }

    fn get_course_index(&self, course_id: &str) -> MigrateResult<CourseIndex> {
        self.index(course_id).cloned()
    }

    fn update_course_index(&mut self, index: CourseIndex) -> MigrateResult<()> {
        // Every branch pointer must name a structure the store holds.
        for (&branch, version) in &index.branches {
            if !self.structures.contains_key(version) {
                debug!("rejecting index update: {} -> missing {}", branch, version);
                return Err(MigrateError::VersionNotFound(*version));
            }
        }
        if !self.courses.contains_key(&index.course_id) {
            return Err(MigrateError::CourseNotFound(index.course_id));
        }
        self.courses.insert(index.course_id.clone(), index);
        Ok(())
    }

    fn has_item(&self, locator: &BlockLocator) -> bool {
        self.head(&locator.course_id, locator.branch)
            .map(|s| s.blocks.contains_key(&locator.usage_id))
            .unwrap_or(false)
    }

    fn get_item(&self, locator: &BlockLocator) -> MigrateResult<Block> {
        let structure = self.head(&locator.course_id, locator.branch)?;
        let stored = structure
            .blocks
            .get(&locator.usage_id)
            .ok_or_else(|| MigrateError::ItemNotFound(locator.clone()))?;
        Ok(Block {
            locator: locator.clone(),
            category: stored.category.clone(),
            fields: stored.fields.clone(),
            edited_by: stored.edited_by.clone(),
            edited_on: stored.edited_on,
        })
    }

    fn clean_children(&mut self, course_id: &str) -> MigrateResult<usize> {
        let version = self.head_version(course_id, Branch::Published)?;
        let structure = self
            .structures
            .get_mut(&version)
            .ok_or(MigrateError::VersionNotFound(version))?;

        let existing: Vec<UsageId> = structure.blocks.keys().cloned().collect();
        let mut pruned = 0;
        for stored in structure.blocks.values_mut() {
            let children = string_list(&stored.fields, CHILDREN_FIELD);
            if children.is_empty() {
                continue;
            }
            let total = children.len();
            let kept: Vec<String> = children
                .into_iter()
                .filter(|c| existing.iter().any(|u| u.as_str() == c))
                .collect();
            if kept.len() < total {
                pruned += total - kept.len();
                set_string_list(&mut stored.fields, CHILDREN_FIELD, kept);
            }
        }
        if pruned > 0 {
            info!("pruned {} dangling child references in {}", pruned, course_id);
        }
        Ok(pruned)
    }
}
