//! The migration engine: projection, publish copy, draft merge, driver.

pub mod draft;
pub mod project;
pub mod publish;

use log::info;
use serde::Serialize;

use crate::mapper::LocationMapper;
use crate::store::{SourceStore, TargetStore};
use crate::types::{
    Branch, LegacyAddress, MigrateError, MigrateResult, DISPLAY_NAME_FIELD,
};

pub use draft::{merge_drafts, DraftSummary};
pub use project::project_fields;
pub use publish::{copy_published, PublishSummary};

/// What one course migration did.
#[derive(Debug, Serialize)]
pub struct MigrationReport {
    /// The target course id (also retrievable from the mapper).
    pub new_course_id: String,
    /// Published blocks copied (root excluded).
    pub nodes_copied: usize,
    /// Dangling child references pruned after the publish copy.
    pub orphans_pruned: usize,
    /// Draft variants applied to existing blocks.
    pub drafts_updated: usize,
    /// Draft-only blocks created.
    pub drafts_created: usize,
    /// Parent child-lists spliced.
    pub parents_spliced: usize,
}

/// Orchestrates one course migration end to end.
///
/// Holds explicit handles to the two source collaborators (published and
/// draft views of the legacy tree), the versioned target store, and the
/// injected address mapper. Nothing here is ambient or global.
pub struct MigrationDriver<'a, P, D, T> {
    published_source: &'a P,
    draft_source: &'a D,
    target: &'a mut T,
    mapper: &'a mut LocationMapper,
}

impl<'a, P, D, T> MigrationDriver<'a, P, D, T>
where
    P: SourceStore,
    D: SourceStore,
    T: TargetStore,
{
    /// Wire up a driver.
    pub fn new(
        published_source: &'a P,
        draft_source: &'a D,
        target: &'a mut T,
        mapper: &'a mut LocationMapper,
    ) -> Self {
        Self {
            published_source,
            draft_source,
            target,
            mapper,
        }
    }

    /// Migrate one course and return what happened.
    ///
    /// Sequence: course mapping, target course root with the projected
    /// course-level fields, publish copy, draft merge. A course that is
    /// already mapped is rejected with `DuplicateCourse` — there is no
    /// overwrite option, and a partially migrated course must be discarded
    /// and remapped by the operator before a retry.
    pub fn migrate_course(
        &mut self,
        course_address: &LegacyAddress,
        user_id: &str,
        explicit_new_course_id: Option<&str>,
    ) -> MigrateResult<MigrationReport> {
        if let Some(existing) = self.mapper.course_id_for(course_address) {
            return Err(MigrateError::DuplicateCourse(
                course_address.clone(),
                existing,
            ));
        }
        let new_course_id = self
            .mapper
            .create_course_mapping(course_address, explicit_new_course_id)?;
        let old_course_id = course_address.course_id();
        info!("migrating {} -> {}", old_course_id, new_course_id);

        let original_course = self
            .published_source
            .get_item(course_address)
            .map_err(|_| MigrateError::SourceCourseNotFound(course_address.clone()))?;
        let root_locator =
            self.mapper
                .translate(&old_course_id, course_address, true, true)?;
        let course_fields =
            project_fields(&original_course, &old_course_id, true, self.mapper)?;
        let title = course_fields
            .get(DISPLAY_NAME_FIELD)
            .and_then(|v| v.as_str())
            .unwrap_or(&course_address.course)
            .to_string();

        self.target.create_course(
            &course_address.org,
            &title,
            user_id,
            &new_course_id,
            root_locator.usage_id,
            Branch::Published,
            course_fields,
        )?;

        let published = copy_published(
            self.published_source,
            self.target,
            self.mapper,
            &new_course_id,
            course_address,
            &old_course_id,
            user_id,
        )?;
        let drafts = merge_drafts(
            self.draft_source,
            self.target,
            self.mapper,
            &new_course_id,
            course_address,
            &old_course_id,
            user_id,
        )?;

        Ok(MigrationReport {
            new_course_id,
            nodes_copied: published.nodes_copied,
            orphans_pruned: published.orphans_pruned,
            drafts_updated: drafts.drafts_updated,
            drafts_created: drafts.drafts_created,
            parents_spliced: drafts.parents_spliced,
        })
    }
}
